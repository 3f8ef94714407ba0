//! Error types for the planner and job orchestrator.

use thiserror::Error;

/// Result type for planner/job operations.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Errors from running a planning job, distinct from the validation-time
/// [`farmplan_core::FarmError`] and the per-stage solve-time
/// [`farmplan_model::ModelError`] both of which this type wraps.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The plan failed structural validation before any stage ran.
    #[error(transparent)]
    Plan(#[from] farmplan_core::FarmError),

    /// A stage's solve failed for a reason other than infeasibility
    /// (e.g. a `good_lp`/solver-backend error).
    #[error(transparent)]
    Model(#[from] farmplan_model::ModelError),

    /// No feasible solution exists for the requested stage sequence.
    /// This is returned as `Ok(StageRunOutcome::Infeasible { .. })` by
    /// [`crate::stage::run_stages`], never as this error variant directly -
    /// it exists so callers that need an `Err` path (e.g. the durable
    /// worker's `JobTable` update) have one to map onto.
    #[error("infeasible at stage {stage}: {reason}")]
    Infeasible { stage: String, reason: String },

    /// The requested wall-clock budget elapsed before a result was ready.
    #[error("timed out after {budget_ms}ms")]
    Timeout { budget_ms: u64 },

    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(crate::JobId),

    /// Job was cancelled.
    #[error("job cancelled")]
    JobCancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Channel closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// Unexpected failure, sanitized before it reaches a client - never
    /// built from another error's `Debug` output.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for PlannerError {
    fn from(e: toml::ser::Error) -> Self {
        PlannerError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::Serialization(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for PlannerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        PlannerError::ChannelClosed
    }
}
