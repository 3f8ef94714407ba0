//! Errors arising while building or solving a single optimization stage.
//! Structural problems with the plan itself are [`farmplan_core::FarmError`];
//! this enum only covers the model/solve boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("stage is infeasible given the constraints accumulated so far")]
    Infeasible,

    #[error("stage objective is unbounded")]
    Unbounded,

    #[error("model is invalid: {0}")]
    ModelInvalid(String),

    /// The solver stopped (most often a per-stage time limit) without
    /// proving optimality, infeasibility, or unboundedness; no conclusive
    /// status could be extracted.
    #[error("stage solve did not reach a conclusive state: {0}")]
    Unknown(String),

    #[error("tolerance {name} must lie in [0, 1], got {value}")]
    InvalidTolerance { name: String, value: f64 },

    #[error("plan error: {0}")]
    Plan(#[from] farmplan_core::FarmError),
}

pub type ModelResult<T> = Result<T, ModelError>;
