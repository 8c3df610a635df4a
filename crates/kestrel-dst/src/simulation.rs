//! Simulation harness for deterministic testing
//!
//! TigerStyle: Reproducible test execution with explicit configuration.
//!
//! A [`Simulation`] owns a set of actors and a runtime borrowing them. Every
//! step it flips a seeded coin: either send one message (sometimes to an
//! unknown id) or run a short burst of ticks. After each step the runtime is
//! snapshotted and checked against the configured invariants. `DST_SEED=N`
//! replays a run exactly.

use crate::invariants::{Accounting, InvariantChecker, InvariantViolation, SystemState};
use crate::rng::{seed_from_env_or_random, DeterministicRng};
use kestrel_core::constants::{
    DST_SEND_PROBABILITY_DEFAULT, DST_STEPS_COUNT_MAX, DST_UNKNOWN_TARGET_PROBABILITY_DEFAULT,
};
use kestrel_core::{ActorId, Error, KestrelConfig};
use kestrel_runtime::{Actor, ActorState, Runtime};
use thiserror::Error as ThisError;
use tracing::{debug, info};

/// Ticks per `run_ticks` burst are drawn from `[1, SIM_TICKS_PER_STEP_MAX]`
const SIM_TICKS_PER_STEP_MAX: u64 = 4;

/// Payloads are drawn from `[0, SIM_PAYLOAD_MAX)` so zero payloads occur
const SIM_PAYLOAD_MAX: u64 = 4;

/// Configuration for a simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of send/tick steps
    pub steps_count: u64,
    /// Actors registered with the runtime
    pub actors_count: usize,
    /// Runtime limits and the mailbox size of every actor
    pub kestrel: KestrelConfig,
    /// Probability that a step sends rather than ticks
    pub send_probability: f64,
    /// Probability that a send targets an unregistered id
    pub unknown_target_probability: f64,
}

impl SimConfig {
    /// Create a new simulation config with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            steps_count: 1_000,
            actors_count: 4,
            kestrel: KestrelConfig::default(),
            send_probability: DST_SEND_PROBABILITY_DEFAULT,
            unknown_target_probability: DST_UNKNOWN_TARGET_PROBABILITY_DEFAULT,
        }
    }

    /// Create config from DST_SEED environment variable or random
    pub fn from_env_or_random() -> Self {
        Self::new(seed_from_env_or_random())
    }

    /// Set the number of steps
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps_count = steps;
        self
    }

    /// Set the number of actors
    pub fn with_actors(mut self, count: usize) -> Self {
        self.actors_count = count;
        self
    }

    /// Set the mailbox capacity
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.kestrel.mailbox.capacity = capacity;
        self
    }

    /// Replace the runtime and mailbox configuration
    pub fn with_kestrel_config(mut self, kestrel: KestrelConfig) -> Self {
        self.kestrel = kestrel;
        self
    }

    /// Set the send probability
    pub fn with_send_probability(mut self, probability: f64) -> Self {
        self.send_probability = probability;
        self
    }

    /// Set the unknown-target probability
    pub fn with_unknown_target_probability(mut self, probability: f64) -> Self {
        self.unknown_target_probability = probability;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> kestrel_core::Result<()> {
        if self.steps_count == 0 || self.steps_count > DST_STEPS_COUNT_MAX {
            return Err(Error::invalid_configuration(
                "steps_count",
                format!("must be in 1..={}", DST_STEPS_COUNT_MAX),
            ));
        }
        self.kestrel.validate()?;
        let actors_count_max = self.kestrel.runtime.actors_count_max;
        if self.actors_count == 0 || self.actors_count > actors_count_max {
            return Err(Error::invalid_configuration(
                "actors_count",
                format!("must be in 1..={}", actors_count_max),
            ));
        }
        for (field, p) in [
            ("send_probability", self.send_probability),
            ("unknown_target_probability", self.unknown_target_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::invalid_configuration(field, "must be in [0, 1]"));
            }
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Outcome of a completed simulation
///
/// Two runs with the same [`SimConfig`] produce equal reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    pub seed: u64,
    pub steps: u64,
    /// Sends the runtime accepted
    pub accepted: u64,
    /// Sends rejected because the target mailbox was full
    pub rejected_full: u64,
    /// Sends rejected because the target was not registered
    pub unknown_target: u64,
    /// Ticks executed across all runs
    pub ticks: u64,
    /// Messages processed across all runs
    pub processed: u64,
    /// Final lifecycle state of each actor, in id order
    pub final_states: Vec<ActorState>,
}

/// Errors that can occur during simulation
#[derive(ThisError, Debug)]
pub enum SimulationError {
    /// Configuration or runtime setup failed
    #[error("Simulation setup failed: {0}")]
    Setup(#[from] Error),

    /// An invariant was violated after a step
    #[error("Invariant violated at step {step} (seed {seed}): {violation}")]
    InvariantViolation {
        seed: u64,
        step: u64,
        violation: InvariantViolation,
    },
}

impl SimulationError {
    /// The violation, if this error is one
    pub fn violation(&self) -> Option<&InvariantViolation> {
        match self {
            SimulationError::InvariantViolation { violation, .. } => Some(violation),
            SimulationError::Setup(_) => None,
        }
    }
}

/// Deterministic simulation of one runtime
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    checker: InvariantChecker,
}

impl Simulation {
    /// Create a simulation checking the standard invariants
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            checker: InvariantChecker::new().with_standard_invariants(),
        }
    }

    /// Replace the invariant checker
    pub fn with_checker(mut self, checker: InvariantChecker) -> Self {
        self.checker = checker;
        self
    }

    /// The simulation's configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run every step, verifying invariants after each
    pub fn run(&self) -> Result<SimReport, SimulationError> {
        self.config.validate()?;

        let config = &self.config;
        let rng = DeterministicRng::new(config.seed);
        // Independent stream per decision
        let schedule = rng.fork();
        let routing = rng.fork();
        let payloads = rng.fork();
        info!(
            seed = config.seed,
            steps = config.steps_count,
            actors = config.actors_count,
            "Starting simulation"
        );

        let actors = (1..=config.actors_count as u128)
            .map(|n| Actor::from_config(ActorId::new(n), &config.kestrel.mailbox))
            .collect::<kestrel_core::Result<Vec<Actor>>>()?;
        let ids: Vec<ActorId> = actors.iter().map(Actor::id).collect();
        let unknown_id = ActorId::new(config.actors_count as u128 + 1);
        let ticks_per_step_max = config
            .kestrel
            .runtime
            .ticks_count_max
            .min(SIM_TICKS_PER_STEP_MAX);

        let mut runtime = Runtime::with_config(config.kestrel.runtime.clone())?;
        for actor in &actors {
            runtime.register(actor)?;
        }

        let mut report = SimReport {
            seed: config.seed,
            steps: 0,
            accepted: 0,
            rejected_full: 0,
            unknown_target: 0,
            ticks: 0,
            processed: 0,
            final_states: Vec::new(),
        };
        let mut accounting = Accounting::default();

        for step in 0..config.steps_count {
            if schedule.next_bool(config.send_probability) {
                let (Some(&sender), Some(&known)) = (routing.pick(&ids), routing.pick(&ids))
                else {
                    return Err(Error::internal("no actors to route").into());
                };
                let target = if routing.next_bool(config.unknown_target_probability) {
                    unknown_id
                } else {
                    known
                };
                let payload = payloads.next_range(0, SIM_PAYLOAD_MAX);

                match runtime.try_send_msg(target, sender, payload) {
                    Ok(()) => {
                        report.accepted += 1;
                        accounting.accepted_sends += 1;
                    }
                    Err(Error::ActorMailboxFull { .. }) => report.rejected_full += 1,
                    Err(Error::ActorNotFound { .. }) => report.unknown_target += 1,
                    Err(e) => return Err(SimulationError::Setup(e)),
                }
            } else {
                let ticks = schedule.next_range(1, ticks_per_step_max + 1);
                let processed = runtime.run_ticks(ticks);

                report.ticks += ticks;
                report.processed += processed;
                accounting.ticks_executed += ticks;
                accounting.last_run_ticks = ticks;
                accounting.last_run_processed = processed;
            }
            report.steps = step + 1;

            let state = SystemState::capture(&runtime, &actors, accounting);
            if let Err(violation) = self.checker.verify_all(&state) {
                tracing::error!(seed = config.seed, step, %violation, "Invariant violated");
                return Err(SimulationError::InvariantViolation {
                    seed: config.seed,
                    step,
                    violation,
                });
            }
            debug!(step, accepted = report.accepted, ticks = report.ticks, "Step verified");
        }

        report.final_states = actors.iter().map(Actor::state).collect();
        info!(
            seed = report.seed,
            accepted = report.accepted,
            processed = report.processed,
            ticks = report.ticks,
            "Simulation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::Invariant;

    #[test]
    fn test_sim_config_defaults() {
        let config = SimConfig::new(42);
        assert_eq!(config.seed, 42);
        assert_eq!(config.actors_count, 4);
        assert_eq!(config.kestrel, KestrelConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sim_config_validation() {
        assert!(SimConfig::new(1).with_actors(0).validate().is_err());
        assert!(SimConfig::new(1).with_actors(257).validate().is_err());
        assert!(SimConfig::new(1).with_steps(0).validate().is_err());
        assert!(SimConfig::new(1).with_mailbox_capacity(0).validate().is_err());
        assert!(SimConfig::new(1).with_send_probability(1.5).validate().is_err());
    }

    #[test]
    fn test_simulation_basic() {
        let report = Simulation::new(SimConfig::new(42).with_steps(200))
            .run()
            .unwrap();

        assert_eq!(report.seed, 42);
        assert_eq!(report.steps, 200);
        assert_eq!(report.final_states.len(), 4);
        assert!(report.processed <= report.accepted);
    }

    #[test]
    fn test_simulation_deterministic() {
        let config = SimConfig::new(7).with_steps(500).with_mailbox_capacity(3);
        let first = Simulation::new(config.clone()).run().unwrap();
        let second = Simulation::new(config).run().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_kestrel_config_drives_runtime_and_mailboxes() {
        let mut kestrel = KestrelConfig::default();
        kestrel.runtime.actors_count_max = 2;
        kestrel.runtime.ticks_count_max = 1;
        kestrel.mailbox.capacity = 1;

        let too_many = SimConfig::new(8)
            .with_kestrel_config(kestrel.clone())
            .with_actors(3);
        assert!(matches!(
            Simulation::new(too_many).run(),
            Err(SimulationError::Setup(Error::InvalidConfiguration { .. }))
        ));

        let config = SimConfig::new(8)
            .with_kestrel_config(kestrel)
            .with_actors(2)
            .with_steps(400)
            .with_send_probability(0.9);
        let report = Simulation::new(config).run().unwrap();
        // Every burst is a single tick and single-slot mailboxes overflow
        let sends = report.accepted + report.rejected_full + report.unknown_target;
        assert_eq!(report.ticks, report.steps - sends);
        assert!(report.rejected_full > 0);
    }

    #[test]
    fn test_invalid_config_is_setup_error() {
        let err = Simulation::new(SimConfig::new(1).with_actors(0))
            .run()
            .unwrap_err();
        assert!(matches!(err, SimulationError::Setup(_)));
        assert!(err.violation().is_none());
    }

    #[test]
    fn test_violation_reports_step() {
        struct NeverHolds;

        impl Invariant for NeverHolds {
            fn name(&self) -> &'static str {
                "NeverHolds"
            }

            fn check(&self, _state: &SystemState) -> Result<(), InvariantViolation> {
                Err(InvariantViolation::new(self.name(), "always fails"))
            }
        }

        let err = Simulation::new(SimConfig::new(3))
            .with_checker(InvariantChecker::new().with_invariant(NeverHolds))
            .run()
            .unwrap_err();

        match err {
            SimulationError::InvariantViolation { seed, step, violation } => {
                assert_eq!(seed, 3);
                assert_eq!(step, 0);
                assert_eq!(violation.name, "NeverHolds");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
