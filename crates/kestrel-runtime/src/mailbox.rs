//! Actor mailbox implementation
//!
//! TigerStyle: Bounded queues with explicit limits, no silent growth.
//!
//! A fixed ring of `capacity` slots addressed by two monotonically
//! increasing counters. `send_index` and `recv_index` only move forward
//! (wrapping on u64 overflow) and always satisfy
//! `recv_index <= send_index <= recv_index + capacity`; the physical slot
//! of an index is `index % capacity`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use kestrel_core::constants::MAILBOX_CAPACITY_COUNT_MAX;
use kestrel_core::Message;

/// Error when mailbox is full
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxFullError {
    pub mailbox_depth: usize,
    pub limit: usize,
}

impl std::fmt::Display for MailboxFullError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mailbox full: {} messages (limit: {})",
            self.mailbox_depth, self.limit
        )
    }
}

impl std::error::Error for MailboxFullError {}

/// Bounded mailbox for actor messages
///
/// Safe under concurrent senders. `push`/`pop` each hold the mailbox lock
/// for their whole critical section. With several concurrent receivers,
/// FIFO holds relative to the lock's acquisition order, not call order.
///
/// # TigerStyle
/// - Explicit capacity limit, fixed at construction
/// - FIFO ordering
/// - Full queue rejects; never blocks, never overwrites
#[derive(Debug)]
pub struct Mailbox {
    /// Message slots, guarded by the mailbox lock
    slots: Mutex<Box<[Option<Message>]>>,
    /// Index of the next slot to write (mutated only under the lock)
    send_index: AtomicU64,
    /// Index of the next slot to read (mutated only under the lock)
    recv_index: AtomicU64,
    /// Fixed number of slots
    capacity: usize,
}

impl Mailbox {
    /// Create a new mailbox with specified capacity
    ///
    /// # Panics
    /// Panics if `capacity` is zero or exceeds `MAILBOX_CAPACITY_COUNT_MAX`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        assert!(
            capacity <= MAILBOX_CAPACITY_COUNT_MAX,
            "capacity exceeds MAILBOX_CAPACITY_COUNT_MAX"
        );

        Self {
            slots: Mutex::new(vec![None; capacity].into_boxed_slice()),
            send_index: AtomicU64::new(0),
            recv_index: AtomicU64::new(0),
            capacity,
        }
    }

    /// Try to enqueue a message
    ///
    /// Returns error if mailbox is full; the mailbox is left unchanged.
    pub fn push(&self, message: Message) -> Result<(), MailboxFullError> {
        let mut slots = self.lock();

        let send_index = self.send_index.load(Ordering::Relaxed);
        let recv_index = self.recv_index.load(Ordering::Relaxed);
        let depth = send_index.wrapping_sub(recv_index);
        debug_assert!(depth <= self.capacity as u64);

        if depth >= self.capacity as u64 {
            return Err(MailboxFullError {
                mailbox_depth: depth as usize,
                limit: self.capacity,
            });
        }

        let slot = self.slot(send_index);
        debug_assert!(slots[slot].is_none(), "overwriting an unread slot");
        slots[slot] = Some(message);
        self.send_index
            .store(send_index.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// Enqueue a message, reporting only whether it was accepted
    pub fn send(&self, message: Message) -> bool {
        self.push(message).is_ok()
    }

    /// Pop the next message from the mailbox
    ///
    /// Returns `None` immediately when empty; never waits.
    pub fn pop(&self) -> Option<Message> {
        let mut slots = self.lock();

        let send_index = self.send_index.load(Ordering::Relaxed);
        let recv_index = self.recv_index.load(Ordering::Relaxed);
        if send_index == recv_index {
            return None;
        }

        let slot = self.slot(recv_index);
        let message = slots[slot].take();
        debug_assert!(message.is_some(), "reading an empty slot");
        self.recv_index
            .store(recv_index.wrapping_add(1), Ordering::Release);

        message
    }

    /// Alias of [`Mailbox::pop`]
    pub fn recv(&self) -> Option<Message> {
        self.pop()
    }

    /// Check if the mailbox is empty
    ///
    /// Advisory: reads the counters without taking the lock, so the answer
    /// may be stale by the time the caller acts on it unless the caller
    /// otherwise excludes concurrent senders and receivers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the mailbox is full (advisory, see [`Mailbox::is_empty`])
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Get the number of pending messages (advisory, see [`Mailbox::is_empty`])
    pub fn len(&self) -> usize {
        // Load recv first so a concurrent pop cannot make send appear behind it
        let recv_index = self.recv_index.load(Ordering::Acquire);
        let send_index = self.send_index.load(Ordering::Acquire);
        (send_index.wrapping_sub(recv_index) as usize).min(self.capacity)
    }

    /// Get the mailbox capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get total messages accepted over the mailbox lifetime
    pub fn enqueued_count(&self) -> u64 {
        self.send_index.load(Ordering::Acquire)
    }

    /// Get total messages received over the mailbox lifetime
    pub fn received_count(&self) -> u64 {
        self.recv_index.load(Ordering::Acquire)
    }

    fn slot(&self, index: u64) -> usize {
        (index % self.capacity as u64) as usize
    }

    fn lock(&self) -> MutexGuard<'_, Box<[Option<Message>]>> {
        // Slot and index writes cannot be torn by a panic; poison is benign
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
