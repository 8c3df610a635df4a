//! Structured logging setup
//!
//! The runtime emits `tracing` events on registration, send, full mailboxes,
//! and state transitions. Nothing in the runtime needs a subscriber; this
//! module installs one for binaries and tests that want the output.

use crate::error::{Error, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Service name used when `KESTREL_SERVICE_NAME` is unset
const SERVICE_NAME_DEFAULT: &str = "kestrel";

/// Filter directive used when `RUST_LOG` is unset
const LOG_FILTER_DEFAULT: &str = "info";

/// How events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-field lines with targets
    #[default]
    Full,
    /// One short line per event
    Compact,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Recorded on the first event after installation
    pub service_name: String,
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub log_level: String,
    /// Render events to stdout; when false events are filtered but dropped
    pub stdout_enabled: bool,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new(SERVICE_NAME_DEFAULT)
    }
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: LOG_FILTER_DEFAULT.to_string(),
            stdout_enabled: true,
            format: LogFormat::Full,
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn without_stdout(mut self) -> Self {
        self.stdout_enabled = false;
        self
    }

    /// Build from `KESTREL_SERVICE_NAME` and `RUST_LOG`
    pub fn from_env() -> Self {
        let mut config = std::env::var("KESTREL_SERVICE_NAME")
            .map(Self::new)
            .unwrap_or_default();
        if let Ok(filter) = std::env::var("RUST_LOG") {
            config.log_level = filter;
        }
        config
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns `Error::Internal` if the filter directive is malformed or a global
/// subscriber is already installed.
///
/// ```rust,ignore
/// let _guard = kestrel_core::init_telemetry(TelemetryConfig::new("ping-pong"))?;
/// ```
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::internal(format!("invalid log filter '{}': {}", config.log_level, e))
        })?,
    };

    let (full, compact) = match (config.stdout_enabled, config.format) {
        (false, _) => (None, None),
        (true, LogFormat::Full) => (Some(tracing_subscriber::fmt::layer()), None),
        (true, LogFormat::Compact) => (None, Some(tracing_subscriber::fmt::layer().compact())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(full)
        .with(compact)
        .try_init()
        .map_err(|e| Error::internal(format!("tracing subscriber already installed: {}", e)))?;

    tracing::info!(service = %config.service_name, format = ?config.format, "Logging installed");
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Held for the life of the process; logs once on drop
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Logging guard released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "kestrel");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.stdout_enabled);
    }

    #[test]
    fn test_builder_chain() {
        let config = TelemetryConfig::new("ping-pong")
            .with_log_level("kestrel_runtime=trace")
            .with_format(LogFormat::Compact)
            .without_stdout();

        assert_eq!(config.service_name, "ping-pong");
        assert_eq!(config.log_level, "kestrel_runtime=trace");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.stdout_enabled);
    }

    #[test]
    fn test_second_install_is_rejected() {
        let config = TelemetryConfig::new("twice").without_stdout();
        let first = init_telemetry(config.clone());
        // A subscriber exists after the first call whether or not it won
        let second = init_telemetry(config);
        assert!(matches!(second, Err(Error::Internal { .. })));
        drop(first);
    }
}
