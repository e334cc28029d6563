//! Error types for push rule evaluation.
//!
//! Condition-level ambiguity (missing fields, unknown rooms, malformed
//! parameters) is never an error: it evaluates to "not satisfied". The types
//! here cover the failures that do escape a batch: collaborator outages,
//! invalid configuration, cancellation and worker plumbing.

use thiserror::Error;

/// Failures reported by the external collaborators (room data, identity).
///
/// "Room unknown" is NOT one of these; providers report it as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider '{provider}' is unavailable: {message}")]
    Unavailable {
        provider: String,
        message: String,
    },

    #[error("Poisoned lock: {0}")]
    PoisonedLock(&'static str),
}

impl ProviderError {
    /// Creates an unavailability error for the named provider.
    #[must_use]
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Validation errors for rules, events and configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Push rule id cannot be empty")]
    EmptyRuleId,

    #[error("Event id cannot be empty")]
    EmptyEventId,

    #[error("Invalid member count expression '{expr}'")]
    InvalidMemberCount {
        expr: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Top-level error type for the push rule engine.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Batch was cancelled")]
    Cancelled,

    #[error("Channel '{path}' disconnected")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl PushError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub(crate) fn disconnected(path: &str) -> Self {
        Self::Disconnected {
            path: path.to_string(),
        }
    }

    /// Returns true if a collaborator failed.
    #[must_use]
    pub const fn is_provider(&self) -> bool {
        matches!(self, Self::Provider(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the batch was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if re-running the same batch may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => matches!(e, ProviderError::Unavailable { .. }),
            Self::Timeout { .. } => true,
            Self::Validation(_)
            | Self::Cancelled
            | Self::Disconnected { .. }
            | Self::Serialization(_)
            | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for push rule operations.
pub type PushResult<T> = Result<T, PushError>;
