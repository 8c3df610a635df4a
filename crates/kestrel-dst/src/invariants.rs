//! Safety properties of a running Kestrel runtime
//!
//! After every simulated step the driver captures a [`SystemState`] and runs
//! each registered [`Invariant`] over it. A failure names the property and,
//! where it helps, the actor and counters that broke it.
//!
//! ```rust,ignore
//! let checker = InvariantChecker::new()
//!     .with_invariant(MailboxBounded)
//!     .with_invariant(MessageConservation);
//! checker.verify_all(&SystemState::capture(&runtime, &actors, accounting))?;
//! ```

use kestrel_core::constants::ACTORS_REGISTERED_COUNT_MAX;
use kestrel_core::ActorId;
use kestrel_runtime::{Actor, ActorState, Runtime};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Checker
// =============================================================================

/// A property that did not hold
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name} broken: {message}")]
pub struct InvariantViolation {
    pub name: String,
    pub message: String,
    /// Actor ids and counter values behind the failure
    pub evidence: Option<String>,
}

impl InvariantViolation {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            evidence: None,
        }
    }

    pub fn with_evidence(
        name: impl Into<String>,
        message: impl Into<String>,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            evidence: Some(evidence.into()),
            ..Self::new(name, message)
        }
    }
}

/// One safety property over a [`SystemState`]
pub trait Invariant: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation>;
}

/// Ordered set of invariants run against each snapshot
#[derive(Default)]
pub struct InvariantChecker {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invariant(mut self, invariant: impl Invariant + 'static) -> Self {
        self.checks.push(Box::new(invariant));
        self
    }

    /// Every runtime property defined in this module
    pub fn with_standard_invariants(self) -> Self {
        self.with_invariant(MailboxBounded)
            .with_invariant(RegistryBounded)
            .with_invariant(TickBounded)
            .with_invariant(MessageConservation)
            .with_invariant(SendAccounting)
            .with_invariant(NotRunningBetweenRuns)
    }

    /// Stop at the first broken property
    pub fn verify_all(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        self.checks.iter().try_for_each(|check| check.check(state))
    }

    /// Run every property and return all that broke
    pub fn verify_all_collect(&self, state: &SystemState) -> Vec<InvariantViolation> {
        let mut broken = Vec::new();
        for check in &self.checks {
            if let Err(violation) = check.check(state) {
                broken.push(violation);
            }
        }
        broken
    }

    pub fn invariant_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl fmt::Debug for InvariantChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.invariant_names()).finish()
    }
}

// =============================================================================
// System State
// =============================================================================

/// Observed state of one actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub state: ActorState,
    pub pending_count: usize,
    pub capacity: usize,
    pub processed_count: u64,
}

impl ActorSnapshot {
    /// Capture an actor
    pub fn capture(actor: &Actor) -> Self {
        Self {
            id: actor.id(),
            state: actor.state(),
            pending_count: actor.pending_count(),
            capacity: actor.mailbox().capacity(),
            processed_count: actor.processed_count(),
        }
    }
}

/// What the simulation driver itself observed, independent of the runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accounting {
    /// Sends the runtime accepted
    pub accepted_sends: u64,
    /// Ticks requested through `run_ticks` that ran to completion
    pub ticks_executed: u64,
    /// Ticks in the most recent `run_ticks` call
    pub last_run_ticks: u64,
    /// Messages processed in the most recent `run_ticks` call
    pub last_run_processed: u64,
}

/// Snapshot of a runtime and the actors the simulation owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    pub actors: Vec<ActorSnapshot>,
    pub registered_count: usize,
    pub total_messages_sent: u64,
    pub total_ticks: u64,
    pub running: bool,
    pub accounting: Accounting,
}

impl SystemState {
    /// Capture the runtime and the actors registered with it
    pub fn capture(runtime: &Runtime<'_>, actors: &[Actor], accounting: Accounting) -> Self {
        let stats = runtime.stats();
        Self {
            actors: actors.iter().map(ActorSnapshot::capture).collect(),
            registered_count: stats.registered_count,
            total_messages_sent: stats.total_messages_sent,
            total_ticks: stats.total_ticks,
            running: stats.running,
            accounting,
        }
    }
}

// =============================================================================
// Invariants
// =============================================================================

/// Every mailbox holds at most its capacity
pub struct MailboxBounded;

impl Invariant for MailboxBounded {
    fn name(&self) -> &'static str {
        "MailboxBounded"
    }

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        for actor in &state.actors {
            if actor.pending_count > actor.capacity {
                return Err(InvariantViolation::with_evidence(
                    self.name(),
                    "mailbox occupancy exceeds capacity",
                    format!(
                        "{}: pending {} > capacity {}",
                        actor.id, actor.pending_count, actor.capacity
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// The registry never exceeds its hard ceiling
pub struct RegistryBounded;

impl Invariant for RegistryBounded {
    fn name(&self) -> &'static str {
        "RegistryBounded"
    }

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        if state.registered_count > ACTORS_REGISTERED_COUNT_MAX {
            return Err(InvariantViolation::new(
                self.name(),
                format!(
                    "{} actors registered, limit {}",
                    state.registered_count, ACTORS_REGISTERED_COUNT_MAX
                ),
            ));
        }
        Ok(())
    }
}

/// Ticks are counted exactly and process at most one message per actor
pub struct TickBounded;

impl Invariant for TickBounded {
    fn name(&self) -> &'static str {
        "TickBounded"
    }

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        let accounting = &state.accounting;
        if state.total_ticks != accounting.ticks_executed {
            return Err(InvariantViolation::new(
                self.name(),
                format!(
                    "runtime counted {} ticks, driver executed {}",
                    state.total_ticks, accounting.ticks_executed
                ),
            ));
        }

        let limit = accounting.last_run_ticks * state.registered_count as u64;
        if accounting.last_run_processed > limit {
            return Err(InvariantViolation::with_evidence(
                self.name(),
                "run processed more messages than actors x ticks",
                format!(
                    "processed {} over {} ticks with {} actors",
                    accounting.last_run_processed,
                    accounting.last_run_ticks,
                    state.registered_count
                ),
            ));
        }
        Ok(())
    }
}

/// Every accepted message is either processed or still pending
pub struct MessageConservation;

impl Invariant for MessageConservation {
    fn name(&self) -> &'static str {
        "MessageConservation"
    }

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        let processed: u64 = state.actors.iter().map(|a| a.processed_count).sum();
        let pending: u64 = state.actors.iter().map(|a| a.pending_count as u64).sum();

        if processed + pending != state.accounting.accepted_sends {
            return Err(InvariantViolation::with_evidence(
                self.name(),
                "messages lost or duplicated",
                format!(
                    "accepted {}, processed {}, pending {}",
                    state.accounting.accepted_sends, processed, pending
                ),
            ));
        }
        Ok(())
    }
}

/// The runtime's send counter matches accepted sends
pub struct SendAccounting;

impl Invariant for SendAccounting {
    fn name(&self) -> &'static str {
        "SendAccounting"
    }

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        if state.total_messages_sent != state.accounting.accepted_sends {
            return Err(InvariantViolation::new(
                self.name(),
                format!(
                    "runtime counted {} sends, driver saw {} accepted",
                    state.total_messages_sent, state.accounting.accepted_sends
                ),
            ));
        }
        Ok(())
    }
}

/// `running` is false whenever control is outside `run_ticks`
pub struct NotRunningBetweenRuns;

impl Invariant for NotRunningBetweenRuns {
    fn name(&self) -> &'static str {
        "NotRunningBetweenRuns"
    }

    fn check(&self, state: &SystemState) -> Result<(), InvariantViolation> {
        if state.running {
            return Err(InvariantViolation::new(
                self.name(),
                "runtime still marked running after run_ticks returned",
            ));
        }
        Ok(())
    }
}
