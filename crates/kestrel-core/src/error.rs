//! Error types for Kestrel
//!
//! TigerStyle: Explicit error types with context, using thiserror.
//!
//! Only outcomes that can happen in a correct program are errors. Contract
//! violations (zero ids, zero capacities, out-of-range tick budgets,
//! mutating the registry while running) are assertions.

use thiserror::Error;

/// Result type alias for Kestrel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kestrel error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Actor Errors
    // =========================================================================
    #[error("Actor not found: {id}")]
    ActorNotFound { id: String },

    #[error("Actor already registered: {id}")]
    ActorAlreadyRegistered { id: String },

    #[error("Actor mailbox full: {id}, depth: {depth}, capacity: {capacity}")]
    ActorMailboxFull {
        id: String,
        depth: usize,
        capacity: usize,
    },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid actor ID: {reason}")]
    InvalidActorId { reason: String },

    #[error("Invalid message size: {size} bytes, expected {expected} bytes")]
    MessageSizeInvalid { size: usize, expected: usize },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an actor not found error
    pub fn actor_not_found(id: impl ToString) -> Self {
        Self::ActorNotFound { id: id.to_string() }
    }

    /// Create an actor already registered error
    pub fn actor_already_registered(id: impl ToString) -> Self {
        Self::ActorAlreadyRegistered { id: id.to_string() }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Check if this error is retriable
    ///
    /// A full mailbox drains as the target processes messages, so the caller
    /// may retry. Nothing in the runtime retries on its own.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ActorMailboxFull { .. })
    }
}
