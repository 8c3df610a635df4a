//! Kestrel DST - Deterministic Simulation Testing
//!
//! Seeded simulations of the Kestrel runtime with invariant checking after
//! every step.
//!
//! # Overview
//!
//! - Reproducible random numbers (DeterministicRng)
//! - Runtime snapshots and safety invariants (InvariantChecker)
//! - A random send/tick driver (Simulation)
//!
//! # Example
//!
//! ```rust
//! use kestrel_dst::{SimConfig, Simulation};
//!
//! let report = Simulation::new(SimConfig::new(42).with_steps(100))
//!     .run()
//!     .unwrap();
//! assert_eq!(report.steps, 100);
//! ```
//!
//! # TigerStyle
//!
//! - All operations are deterministic given the same seed
//! - Always log the seed for reproducibility
//! - Violations carry the seed and step that produced them

pub mod invariants;
pub mod rng;
pub mod simulation;

pub use invariants::{
    Accounting, ActorSnapshot, Invariant, InvariantChecker, InvariantViolation, MailboxBounded,
    MessageConservation, NotRunningBetweenRuns, RegistryBounded, SendAccounting, SystemState,
    TickBounded,
};
pub use rng::{seed_from_env_or_random, DeterministicRng, DST_SEED_ENV};
pub use simulation::{SimConfig, SimReport, SimulationError, Simulation};
