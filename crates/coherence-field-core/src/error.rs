//! Error types for the coherence field engine.
//!
//! The engine distinguishes four situations:
//!
//! - Out-of-range raw samples are clamped locally and logged; they are never
//!   surfaced as errors.
//! - Invalid configuration (smoothing constants, combine weights, breath
//!   period, empty sweep candidate lists) is fatal and surfaced synchronously
//!   at construction or call time as [`FieldError::ConfigError`].
//! - A perturbation that does not return within its tick budget is a result
//!   (`return_time_cycles: None`), never an error.
//! - A panicking subscriber is isolated and logged by the broadcaster; it
//!   never propagates to the publisher or to other subscribers.

use thiserror::Error;

/// Result type for coherence field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur inside the coherence field engine.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Configuration validation failed. Fatal at construction or call time.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A caller-supplied parameter was rejected.
    #[error("Invalid parameter '{name}': {value} - {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// A computation produced a non-finite or otherwise unusable value.
    #[error("Invalid computation: {reason} (value: {value})")]
    InvalidComputation { reason: String, value: f64 },

    /// A sweep or perturbation observed its cancel flag between ticks.
    #[error("Operation cancelled between simulated ticks")]
    Cancelled,

    /// JSON serialization failure when encoding states or ledger details.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl FieldError {
    /// Create an `InvalidParameter` error with formatted context.
    pub fn invalid_param(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an `InvalidComputation` error for a NaN result.
    pub fn nan_result(context: &str) -> Self {
        Self::InvalidComputation {
            reason: format!("NaN produced during {}", context),
            value: f64::NAN,
        }
    }

    /// Create a `ConfigError` from any displayable source.
    pub fn config(reason: impl std::fmt::Display) -> Self {
        Self::ConfigError(reason.to_string())
    }

    /// Whether the caller can retry or adjust input without restarting.
    ///
    /// Cancellation and bad parameters are recoverable; configuration and
    /// computation failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FieldError::Cancelled | FieldError::InvalidParameter { .. }
        )
    }

    /// Whether this is a configuration problem that must block startup.
    pub fn is_config_error(&self) -> bool {
        matches!(self, FieldError::ConfigError(_))
    }
}
