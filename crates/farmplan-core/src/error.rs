//! Unified error type for the farm planning engine.
//!
//! [`FarmError`] represents the validation-time failures described by the
//! engine's error taxonomy. Model/solver failures live in `farmplan-model`
//! and planner/job failures in `farmplan-planner`; both wrap this type.

use thiserror::Error;

/// Errors raised while validating or constructing a [`crate::model::Plan`].
#[derive(Error, Debug, Clone)]
pub enum FarmError {
    /// A reference to a crop, land, event, worker, or resource id that does
    /// not exist in the plan.
    #[error("unknown {kind} reference: {id}")]
    UnknownReference { kind: &'static str, id: String },

    /// A blocked day, window day, or fixed-area span falls outside the
    /// horizon `[1, num_days]`.
    #[error("{field} out of range for horizon (1..={num_days}): {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        num_days: u32,
    },

    /// Two entities disagree about the same (land, crop) fixed-area pair.
    #[error("conflicting fixed area for land {land_id} / crop {crop_id}")]
    ConflictingFixedArea { land_id: String, crop_id: String },

    /// An event's lag bounds are inconsistent (`lag_min_days > lag_max_days`).
    #[error("event {event_id}: lag_min_days ({lag_min}) exceeds lag_max_days ({lag_max})")]
    InconsistentLag {
        event_id: String,
        lag_min: u32,
        lag_max: u32,
    },

    /// A crop with no event referencing it can never be planted or harvested.
    #[error("crop {crop_id} has no events referencing it")]
    CropWithoutEvent { crop_id: String },

    /// Generic structural validation failure with a free-form message.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Convenience alias for results over [`FarmError`].
pub type FarmResult<T> = Result<T, FarmError>;

impl From<String> for FarmError {
    fn from(s: String) -> Self {
        FarmError::Validation(s)
    }
}

impl From<&str> for FarmError {
    fn from(s: &str) -> Self {
        FarmError::Validation(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FarmError::UnknownReference {
            kind: "crop",
            id: "wheat".into(),
        };
        assert!(err.to_string().contains("crop"));
        assert!(err.to_string().contains("wheat"));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> FarmResult<()> {
            Err(FarmError::Validation("test".into()))
        }
        fn outer() -> FarmResult<()> {
            inner()?;
            Ok(())
        }
        assert!(outer().is_err());
    }
}
