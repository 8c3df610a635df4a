//! Main runtime coordinator
//!
//! TigerStyle: Bounded registry, explicit tick budget, cooperative stop.
//!
//! The runtime borrows actors; it never owns them. The `'a` lifetime ties
//! every registered actor to the caller's scope, so an actor cannot be
//! dropped while a runtime still references it, and dropping the runtime
//! leaves every actor intact.

use crate::actor::Actor;
use kestrel_core::constants::RUNTIME_TICKS_COUNT_MAX;
use kestrel_core::error::{Error, Result};
use kestrel_core::{ActorId, Message, RuntimeConfig, ScheduleStrategy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Stop Handle
// ============================================================================

/// Run flag shared between one runtime and its stop handles
#[derive(Debug, Default)]
struct RunState {
    running: AtomicBool,
    /// Set once a runtime takes ownership of this flag
    attached: AtomicBool,
}

/// Cloneable handle that requests a cooperative stop
///
/// Safe to use from other threads or from inside a message handler. A stop
/// takes effect at the next tick boundary; the tick in flight completes.
/// A handle belongs to at most one runtime.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    state: Arc<RunState>,
}

impl StopHandle {
    /// Create a handle not yet attached to a runtime
    ///
    /// Pass it to [`RuntimeBuilder::with_stop_handle`] to attach it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the runtime to stop after the current tick
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::Release);
    }

    /// Whether the attached runtime is inside `run_ticks`
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Whether a runtime owns this handle's flag
    pub fn is_attached(&self) -> bool {
        self.state.attached.load(Ordering::Acquire)
    }

    /// Claim the flag for a new runtime; fails if another runtime holds it
    fn attach(&self) -> Result<()> {
        if self.state.attached.swap(true, Ordering::AcqRel) {
            return Err(Error::invalid_configuration(
                "stop_handle",
                "already attached to another runtime",
            ));
        }
        debug_assert!(!self.is_running());
        Ok(())
    }

    fn attached() -> Self {
        let handle = Self::new();
        handle.state.attached.store(true, Ordering::Release);
        handle
    }
}

/// Clears the running flag when dropped, including during unwinding
struct RunningGuard<'h> {
    handle: &'h StopHandle,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.handle.stop();
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Point-in-time runtime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Actors currently registered
    pub registered_count: usize,
    /// Messages accepted into a mailbox through `send_msg`
    pub total_messages_sent: u64,
    /// Ticks executed by `run_ticks`
    pub total_ticks: u64,
    /// Whether `run_ticks` is in progress
    pub running: bool,
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for creating a runtime
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    stop_handle: Option<StopHandle>,
}

impl RuntimeBuilder {
    /// Create a new runtime builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a fresh stop handle
    ///
    /// Lets message handlers hold the handle before the runtime exists.
    /// `build` rejects a handle that already belongs to a runtime.
    pub fn with_stop_handle(mut self, stop_handle: StopHandle) -> Self {
        self.stop_handle = Some(stop_handle);
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    /// Returns `Error::InvalidConfiguration` if the configuration is invalid
    /// or the stop handle is already attached to a runtime.
    pub fn build<'a>(self) -> Result<Runtime<'a>> {
        self.config.validate()?;
        debug_assert!(self.config.ticks_count_max <= RUNTIME_TICKS_COUNT_MAX);

        let stop = match self.stop_handle {
            Some(handle) => {
                handle.attach()?;
                handle
            }
            None => StopHandle::attached(),
        };

        Ok(Runtime {
            registry: HashMap::with_capacity(self.config.actors_count_max),
            stop,
            config: self.config,
            total_messages_sent: 0,
            total_ticks: 0,
        })
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// The Kestrel runtime
///
/// Routes messages by actor id and schedules processing round-robin: each
/// tick gives every registered actor one chance to process one message.
/// Iteration order across actors within a tick is unspecified.
#[derive(Debug)]
pub struct Runtime<'a> {
    /// Registered actors, borrowed from the caller
    registry: HashMap<ActorId, &'a Actor>,
    /// Owned run flag; running for the duration of `run_ticks`
    stop: StopHandle,
    /// Configuration
    config: RuntimeConfig,
    /// Messages accepted through `send_msg`
    total_messages_sent: u64,
    /// Ticks executed by `run_ticks`
    total_ticks: u64,
}

impl<'a> Runtime<'a> {
    /// Create a runtime with the default configuration
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
            stop: StopHandle::attached(),
            config: RuntimeConfig::default(),
            total_messages_sent: 0,
            total_ticks: 0,
        }
    }

    /// Create a runtime with a validated configuration
    pub fn with_config(config: RuntimeConfig) -> Result<Self> {
        RuntimeBuilder::new().with_config(config).build()
    }

    /// Register an actor
    ///
    /// # Errors
    /// Returns `Error::ActorAlreadyRegistered` if the id is already present.
    ///
    /// # Panics
    /// Panics if the runtime is running or the registry is full.
    pub fn register(&mut self, actor: &'a Actor) -> Result<()> {
        assert!(!self.is_running(), "cannot register while running");

        let id = actor.id();
        if self.registry.contains_key(&id) {
            warn!(actor_id = %id, "Actor already registered");
            return Err(Error::actor_already_registered(id));
        }

        assert!(
            self.registry.len() < self.config.actors_count_max,
            "registry is full ({} actors)",
            self.config.actors_count_max
        );

        self.registry.insert(id, actor);
        debug!(actor_id = %id, registered = self.registry.len(), "Registered actor");

        debug_assert!(self.registry.len() <= self.config.actors_count_max);
        Ok(())
    }

    /// Remove an actor from the registry
    ///
    /// The actor itself is untouched; the caller still owns it.
    ///
    /// # Errors
    /// Returns `Error::ActorNotFound` if the id is not registered.
    ///
    /// # Panics
    /// Panics if the runtime is running.
    pub fn unregister(&mut self, id: ActorId) -> Result<()> {
        assert!(!self.is_running(), "cannot unregister while running");

        match self.registry.remove(&id) {
            Some(_) => {
                debug!(actor_id = %id, registered = self.registry.len(), "Unregistered actor");
                Ok(())
            }
            None => Err(Error::actor_not_found(id)),
        }
    }

    /// Send a message to a registered actor
    ///
    /// # Errors
    /// - `Error::ActorNotFound` if `target_id` is not registered
    /// - `Error::ActorMailboxFull` if the target's mailbox is full
    ///
    /// Counters change only when the message is accepted.
    pub fn try_send_msg(
        &mut self,
        target_id: ActorId,
        sender_id: ActorId,
        payload: u64,
    ) -> Result<()> {
        let Some(target) = self.registry.get(&target_id).copied() else {
            warn!(target_id = %target_id, sender_id = %sender_id, "Send to unknown actor");
            return Err(Error::actor_not_found(target_id));
        };

        if let Err(full) = target.try_enqueue(Message::new(sender_id, payload)) {
            warn!(
                target_id = %target_id,
                sender_id = %sender_id,
                depth = full.mailbox_depth,
                "Mailbox full, message rejected"
            );
            return Err(Error::ActorMailboxFull {
                id: target_id.to_string(),
                depth: full.mailbox_depth,
                capacity: full.limit,
            });
        }

        self.total_messages_sent = self.total_messages_sent.wrapping_add(1);
        debug!(target_id = %target_id, sender_id = %sender_id, payload, "Sent message");
        Ok(())
    }

    /// Send a message, reporting only whether it was accepted
    pub fn send_msg(&mut self, target_id: ActorId, sender_id: ActorId, payload: u64) -> bool {
        self.try_send_msg(target_id, sender_id, payload).is_ok()
    }

    /// Give every registered actor one chance to process one message
    ///
    /// Returns how many actors processed a message; never more than the
    /// number of registered actors.
    pub fn tick(&self) -> usize {
        debug_assert_eq!(self.config.schedule, ScheduleStrategy::RoundRobin);

        let processed = self
            .registry
            .values()
            .filter(|actor| actor.process_one())
            .count();

        debug_assert!(processed <= self.registry.len());
        processed
    }

    /// Run up to `ticks` ticks, or until stopped
    ///
    /// Returns the total number of messages processed. `running` is false
    /// again when this returns, even if a tick panics.
    ///
    /// # Panics
    /// Panics if `ticks` is zero or above the configured tick limit, or if
    /// the runtime is already running.
    #[instrument(skip(self), fields(registered = self.registry.len()))]
    pub fn run_ticks(&mut self, ticks: u64) -> u64 {
        assert!(ticks > 0, "tick count must be positive");
        assert!(
            ticks <= self.config.ticks_count_max,
            "tick count {} exceeds limit {}",
            ticks,
            self.config.ticks_count_max
        );
        assert!(!self.is_running(), "runtime is already running");

        self.stop.state.running.store(true, Ordering::Release);
        let stop = self.stop.clone();
        let _guard = RunningGuard { handle: &stop };
        info!(ticks, "Starting run");

        let mut processed_total: u64 = 0;
        let mut ticks_done: u64 = 0;
        while ticks_done < ticks && stop.is_running() {
            processed_total += self.tick() as u64;
            ticks_done += 1;
            self.total_ticks = self.total_ticks.wrapping_add(1);
        }

        debug_assert!(ticks_done <= ticks);
        info!(ticks_done, processed_total, "Run finished");
        processed_total
    }

    /// Request a cooperative stop; see [`StopHandle::stop`]
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Get a handle that can stop this runtime from elsewhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether `run_ticks` is in progress
    pub fn is_running(&self) -> bool {
        self.stop.is_running()
    }

    /// Look up a registered actor
    pub fn actor(&self, id: ActorId) -> Option<&'a Actor> {
        self.registry.get(&id).copied()
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: ActorId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Number of registered actors
    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Messages accepted through `send_msg`
    pub fn total_messages_sent(&self) -> u64 {
        self.total_messages_sent
    }

    /// Ticks executed by `run_ticks`
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Snapshot of the runtime counters
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            registered_count: self.registry.len(),
            total_messages_sent: self.total_messages_sent,
            total_ticks: self.total_ticks,
            running: self.is_running(),
        }
    }

    /// Get the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl Default for Runtime<'_> {
    fn default() -> Self {
        Self::new()
    }
}
