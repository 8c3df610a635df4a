//! Configuration for Kestrel
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for Kestrel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KestrelConfig {
    /// Runtime (registry and scheduler) configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Mailbox configuration
    #[serde(default)]
    pub mailbox: MailboxConfig,
}

impl KestrelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.runtime.validate()?;
        self.mailbox.validate()?;
        Ok(())
    }
}

/// Scheduling strategy for a runtime
///
/// Only `RoundRobin` has behavior. The others are named extension points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// One message per actor per tick
    #[default]
    RoundRobin,
    /// Process messages at send time (not implemented)
    Immediate,
    /// Replicated ordering (not implemented)
    Raft,
}

impl ScheduleStrategy {
    /// Whether the runtime can execute this strategy
    pub fn is_implemented(&self) -> bool {
        match self {
            ScheduleStrategy::RoundRobin => true,
            ScheduleStrategy::Immediate => false,
            ScheduleStrategy::Raft => false,
        }
    }
}

impl std::fmt::Display for ScheduleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStrategy::RoundRobin => write!(f, "round_robin"),
            ScheduleStrategy::Immediate => write!(f, "immediate"),
            ScheduleStrategy::Raft => write!(f, "raft"),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum registered actors (at most `ACTORS_REGISTERED_COUNT_MAX`)
    #[serde(default = "default_actors_count_max")]
    pub actors_count_max: usize,

    /// Maximum ticks per `run_ticks` call (at most `RUNTIME_TICKS_COUNT_MAX`)
    #[serde(default = "default_ticks_count_max")]
    pub ticks_count_max: u64,

    /// Scheduling strategy
    #[serde(default)]
    pub schedule: ScheduleStrategy,
}

fn default_actors_count_max() -> usize {
    ACTORS_REGISTERED_COUNT_MAX
}

fn default_ticks_count_max() -> u64 {
    RUNTIME_TICKS_COUNT_MAX
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            actors_count_max: default_actors_count_max(),
            ticks_count_max: default_ticks_count_max(),
            schedule: ScheduleStrategy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Validate the runtime configuration
    pub fn validate(&self) -> Result<()> {
        if self.actors_count_max == 0 || self.actors_count_max > ACTORS_REGISTERED_COUNT_MAX {
            return Err(Error::InvalidConfiguration {
                field: "runtime.actors_count_max".into(),
                reason: format!(
                    "{} not in 1..={}",
                    self.actors_count_max, ACTORS_REGISTERED_COUNT_MAX
                ),
            });
        }

        if self.ticks_count_max == 0 || self.ticks_count_max > RUNTIME_TICKS_COUNT_MAX {
            return Err(Error::InvalidConfiguration {
                field: "runtime.ticks_count_max".into(),
                reason: format!(
                    "{} not in 1..={}",
                    self.ticks_count_max, RUNTIME_TICKS_COUNT_MAX
                ),
            });
        }

        if !self.schedule.is_implemented() {
            return Err(Error::InvalidConfiguration {
                field: "runtime.schedule".into(),
                reason: format!("strategy {} is not implemented", self.schedule),
            });
        }

        Ok(())
    }
}

/// Mailbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Fixed capacity of each actor mailbox
    #[serde(default = "default_mailbox_capacity")]
    pub capacity: usize,
}

fn default_mailbox_capacity() -> usize {
    MAILBOX_CAPACITY_COUNT_DEFAULT
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            capacity: default_mailbox_capacity(),
        }
    }
}

impl MailboxConfig {
    /// Validate the mailbox configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAILBOX_CAPACITY_COUNT_MAX {
            return Err(Error::InvalidConfiguration {
                field: "mailbox.capacity".into(),
                reason: format!(
                    "{} not in 1..={}",
                    self.capacity, MAILBOX_CAPACITY_COUNT_MAX
                ),
            });
        }
        Ok(())
    }
}
