//! Actors: one mailbox plus one state machine
//!
//! TigerStyle: Explicit ownership, bounded mailbox, single consumer.
//!
//! An [`Actor`] is owned by the embedding application. Runtimes only borrow
//! it, so dropping a runtime never tears an actor down. Dropping the actor
//! releases its mailbox storage exactly once.

use crate::fsm::{ActorState, Event, StateMachine};
use crate::mailbox::{Mailbox, MailboxFullError};
use kestrel_core::{ActorId, MailboxConfig, Message};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

// ============================================================================
// Message Handling
// ============================================================================

/// Maps a received message to a lifecycle event
///
/// Supplied by the embedding application. Returning `None` leaves the
/// actor's state machine untouched.
pub trait MessageHandler: Send + Sync + 'static {
    /// Choose the event (if any) raised by `message`
    fn on_message(&self, message: &Message) -> Option<Event>;
}

impl<F> MessageHandler for F
where
    F: Fn(&Message) -> Option<Event> + Send + Sync + 'static,
{
    fn on_message(&self, message: &Message) -> Option<Event> {
        self(message)
    }
}

/// Default handler: any positive payload raises `Start`
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOnPositivePayload;

impl MessageHandler for StartOnPositivePayload {
    fn on_message(&self, message: &Message) -> Option<Event> {
        (message.payload() > 0).then_some(Event::Start)
    }
}

/// Handler that never raises an event
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreMessages;

impl MessageHandler for IgnoreMessages {
    fn on_message(&self, _message: &Message) -> Option<Event> {
        None
    }
}

// ============================================================================
// Actor
// ============================================================================

/// An addressable unit of computation
///
/// `enqueue` may be called from any thread; `process_one` is intended for
/// the single thread driving the runtime.
pub struct Actor {
    /// Immutable identity
    id: ActorId,
    /// Bounded inbox
    mailbox: Mailbox,
    /// Lifecycle state
    state: Mutex<StateMachine>,
    /// Messages taken out of the mailbox and handled
    processed_count: AtomicU64,
    /// Message to event mapping
    handler: Arc<dyn MessageHandler>,
}

impl Actor {
    /// Create an actor with the default [`StartOnPositivePayload`] handler
    ///
    /// # Panics
    /// Panics if `mailbox_capacity` is zero.
    pub fn new(id: ActorId, mailbox_capacity: usize) -> Self {
        Self::with_handler(id, mailbox_capacity, Arc::new(StartOnPositivePayload))
    }

    /// Create an actor with a custom message handler
    ///
    /// # Panics
    /// Panics if `mailbox_capacity` is zero.
    pub fn with_handler(
        id: ActorId,
        mailbox_capacity: usize,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        assert!(mailbox_capacity > 0, "mailbox capacity must be positive");

        let actor = Self {
            id,
            mailbox: Mailbox::with_capacity(mailbox_capacity),
            state: Mutex::new(StateMachine::new()),
            processed_count: AtomicU64::new(0),
            handler,
        };

        debug_assert!(actor.mailbox.is_empty());
        debug_assert_eq!(actor.state(), ActorState::Idle);
        actor
    }

    /// Create an actor whose mailbox is sized by `config`
    ///
    /// # Errors
    /// Returns `Error::InvalidConfiguration` if the capacity is out of range.
    pub fn from_config(id: ActorId, config: &MailboxConfig) -> kestrel_core::Result<Self> {
        config.validate()?;
        Ok(Self::new(id, config.capacity))
    }

    /// The actor's identity
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> ActorState {
        self.state_machine().state()
    }

    /// Messages processed so far
    pub fn processed_count(&self) -> u64 {
        self.processed_count.load(Ordering::Acquire)
    }

    /// Messages waiting in the mailbox (advisory)
    pub fn pending_count(&self) -> usize {
        self.mailbox.len()
    }

    /// The actor's mailbox
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Try to place a message in the mailbox
    ///
    /// Does not touch the state machine.
    pub fn try_enqueue(&self, message: Message) -> Result<(), MailboxFullError> {
        self.mailbox.push(message)
    }

    /// Place a message in the mailbox, reporting only acceptance
    pub fn enqueue(&self, message: Message) -> bool {
        self.try_enqueue(message).is_ok()
    }

    /// Process at most one pending message
    ///
    /// Returns `false` without side effects when the mailbox is empty.
    /// Otherwise counts the message, applies the event chosen by the
    /// handler, and returns `true`.
    pub fn process_one(&self) -> bool {
        let Some(message) = self.mailbox.pop() else {
            return false;
        };

        let processed = self.processed_count.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(
            actor_id = %self.id,
            sender_id = %message.sender_id(),
            payload = message.payload(),
            processed,
            "Processing message"
        );

        if let Some(event) = self.handler.on_message(&message) {
            let state = self.state_machine().on_event(event);
            debug!(actor_id = %self.id, event = %event, state = %state, "Applied event");
        }

        true
    }

    /// Apply a lifecycle event directly, bypassing the mailbox
    pub fn apply_event(&self, event: Event) -> ActorState {
        self.state_machine().on_event(event)
    }

    fn state_machine(&self) -> std::sync::MutexGuard<'_, StateMachine> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("pending", &self.mailbox.len())
            .field("capacity", &self.mailbox.capacity())
            .field("processed_count", &self.processed_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(payload: u64) -> Message {
        Message::new(ActorId::new(99), payload)
    }

    #[test]
    fn test_actor_new() {
        let actor = Actor::new(ActorId::new(1), 4);
        assert_eq!(actor.id(), ActorId::new(1));
        assert_eq!(actor.state(), ActorState::Idle);
        assert_eq!(actor.processed_count(), 0);
        assert_eq!(actor.pending_count(), 0);
        assert_eq!(actor.mailbox().capacity(), 4);
    }

    #[test]
    fn test_actor_from_config() {
        let actor = Actor::from_config(ActorId::new(1), &MailboxConfig::default()).unwrap();
        assert_eq!(actor.mailbox().capacity(), 64);

        let small = MailboxConfig { capacity: 2 };
        let actor = Actor::from_config(ActorId::new(2), &small).unwrap();
        assert!(actor.enqueue(message(1)));
        assert!(actor.enqueue(message(2)));
        assert!(!actor.enqueue(message(3)));

        let empty = MailboxConfig { capacity: 0 };
        assert!(matches!(
            Actor::from_config(ActorId::new(3), &empty),
            Err(kestrel_core::Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "mailbox capacity must be positive")]
    fn test_actor_zero_capacity_panics() {
        let _ = Actor::new(ActorId::new(1), 0);
    }

    #[test]
    fn test_actor_process_three_messages() {
        let actor = Actor::new(ActorId::new(1), 10);

        for payload in 1..=3 {
            assert!(actor.enqueue(message(payload)));
        }

        let results: Vec<bool> = (0..4).map(|_| actor.process_one()).collect();
        assert_eq!(results, vec![true, true, true, false]);
        assert_eq!(actor.processed_count(), 3);
        assert_eq!(actor.state(), ActorState::Running);
    }

    #[test]
    fn test_enqueue_does_not_touch_state() {
        let actor = Actor::new(ActorId::new(1), 2);
        assert!(actor.enqueue(message(5)));
        assert!(actor.enqueue(message(6)));
        assert!(!actor.enqueue(message(7)));

        let err = actor.try_enqueue(message(8)).unwrap_err();
        assert_eq!(err.limit, 2);
        assert_eq!(actor.state(), ActorState::Idle);
        assert_eq!(actor.processed_count(), 0);
    }

    #[test]
    fn test_zero_payload_is_counted_without_event() {
        let actor = Actor::new(ActorId::new(1), 4);
        assert!(actor.enqueue(message(0)));

        assert!(actor.process_one());
        assert_eq!(actor.processed_count(), 1);
        assert_eq!(actor.state(), ActorState::Idle);
    }

    #[test]
    fn test_empty_process_has_no_side_effects() {
        let actor = Actor::new(ActorId::new(1), 4);
        assert!(!actor.process_one());
        assert_eq!(actor.processed_count(), 0);
        assert_eq!(actor.state(), ActorState::Idle);
    }

    #[test]
    fn test_custom_handler_drives_lifecycle() {
        // 1 = start, 2 = complete, 3 = fail, anything else = stop
        let handler = |msg: &Message| match msg.payload() {
            1 => Some(Event::Start),
            2 => Some(Event::Complete),
            3 => Some(Event::Fail),
            _ => Some(Event::Stop),
        };
        let actor = Actor::with_handler(ActorId::new(7), 8, Arc::new(handler));

        for payload in [1, 2, 1, 3, 1, 9] {
            assert!(actor.enqueue(message(payload)));
        }

        let mut states = Vec::new();
        while actor.process_one() {
            states.push(actor.state());
        }

        assert_eq!(
            states,
            vec![
                ActorState::Running,
                ActorState::Finished,
                ActorState::Running,
                ActorState::Error,
                ActorState::Running,
                ActorState::Idle,
            ]
        );
        assert_eq!(actor.processed_count(), 6);
    }

    #[test]
    fn test_ignore_messages_handler() {
        let actor = Actor::with_handler(ActorId::new(1), 4, Arc::new(IgnoreMessages));
        assert!(actor.enqueue(message(10)));
        assert!(actor.process_one());
        assert_eq!(actor.state(), ActorState::Idle);
        assert_eq!(actor.processed_count(), 1);
    }

    #[test]
    fn test_apply_event() {
        let actor = Actor::new(ActorId::new(1), 1);
        assert_eq!(actor.apply_event(Event::Start), ActorState::Running);
        assert_eq!(actor.apply_event(Event::Complete), ActorState::Finished);
        assert_eq!(actor.state(), ActorState::Finished);
    }

    #[test]
    fn test_actor_shared_across_sender_threads() {
        let actor = Actor::new(ActorId::new(1), 64);

        std::thread::scope(|scope| {
            for sender in 2..=5u128 {
                let actor = &actor;
                scope.spawn(move || {
                    for payload in 1..=16 {
                        assert!(actor.enqueue(Message::new(ActorId::new(sender), payload)));
                    }
                });
            }
        });

        let mut processed = 0;
        while actor.process_one() {
            processed += 1;
        }
        assert_eq!(processed, 64);
        assert_eq!(actor.processed_count(), 64);
    }
}
