//! Kestrel Core
//!
//! Core types, errors, and constants for the Kestrel actor runtime.
//!
//! # Overview
//!
//! Kestrel is a minimal actor-model core: actors with 128-bit identities
//! exchange fixed-shape messages through bounded mailboxes and are driven
//! by a tick-based scheduler. This crate holds the pieces shared by the
//! runtime and its test harness.
//!
//! # TigerStyle
//!
//! This crate follows [TigerStyle](https://github.com/tigerbeetle/tigerbeetle/blob/main/docs/TIGER_STYLE.md)
//! engineering principles:
//! - Safety > Performance > Developer Experience
//! - Explicit limits with big-endian naming (e.g., `ACTORS_REGISTERED_COUNT_MAX`)
//! - Assertions on every contract boundary
//! - No recursion (bounded iteration only)

pub mod actor;
pub mod config;
pub mod constants;
pub mod error;
pub mod message;
pub mod telemetry;

pub use actor::ActorId;
pub use config::{KestrelConfig, MailboxConfig, RuntimeConfig, ScheduleStrategy};
pub use constants::*;
pub use error::{Error, Result};
pub use message::Message;
pub use telemetry::{init_telemetry, LogFormat, TelemetryConfig, TelemetryGuard};
