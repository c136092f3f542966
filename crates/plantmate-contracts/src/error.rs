//! Error types for the PlantMate orchestrator.
//!
//! Oracle and provider errors are recoverable: the engine absorbs them at the
//! call site with a safe default. Everything else is fatal to the run and
//! surfaces as `success = false` in the result.

use thiserror::Error;

/// The unified error type for the PlantMate crates.
#[derive(Debug, Error)]
pub enum PlantMateError {
    /// The decision oracle call itself failed.
    #[error("decision oracle failed: {reason}")]
    OracleFailed { reason: String },

    /// The decision oracle did not answer within the configured timeout.
    #[error("decision oracle timed out after {timeout_ms} ms")]
    OracleTimeout { timeout_ms: u64 },

    /// The oracle answered, but the answer could not be read as a decision.
    #[error("malformed {kind} decision: {reason}")]
    MalformedDecision { kind: String, reason: String },

    /// A capability provider reported an error.
    #[error("capability '{capability}' failed: {reason}")]
    ProviderFailed { capability: String, reason: String },

    /// A capability provider did not answer within the configured timeout.
    #[error("capability '{capability}' timed out after {timeout_ms} ms")]
    ProviderTimeout { capability: String, timeout_ms: u64 },

    /// The trace writer could not persist a step record.
    ///
    /// Fatal: a step that cannot be traced cannot proceed.
    #[error("trace write failed: {reason}")]
    TraceWriteFailed { reason: String },

    /// The driver attempted an illegal transition or ran past its step budget.
    #[error("state machine error: {reason}")]
    StateMachineError { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A JSON Schema document could not be compiled or applied.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },

    /// A collaborator panicked while the run was in flight.
    #[error("run panicked: {reason}")]
    RunPanicked { reason: String },
}

impl PlantMateError {
    /// True for the per-step failures the engine absorbs with a default.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlantMateError::OracleFailed { .. }
                | PlantMateError::OracleTimeout { .. }
                | PlantMateError::MalformedDecision { .. }
                | PlantMateError::ProviderFailed { .. }
                | PlantMateError::ProviderTimeout { .. }
        )
    }
}

/// Convenience alias used throughout the PlantMate crates.
pub type PlantMateResult<T> = Result<T, PlantMateError>;
