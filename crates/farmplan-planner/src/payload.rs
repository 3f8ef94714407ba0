//! External contract shapes (§6): the result/job-info payloads a transport
//! layer would serialize, plus the durable backend's persisted row and
//! message bus envelope. HTTP itself is out of scope; these are the
//! `serde`-first types [`crate::service::OptimizeService`] and
//! [`crate::durable::DurableWorker`] produce and consume, following the
//! teacher's serde-first domain-struct convention.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::JobId;

/// Convert a 0-based external day index to the engine's internal 1-based
/// day. Performed only at the payload boundary, never inside the engine.
pub fn from_external_day(day: u32) -> u32 {
    day + 1
}

/// Convert an internal 1-based day back to the 0-based external index.
pub fn to_external_day(day: u32) -> u32 {
    day.saturating_sub(1)
}

/// Accepts either a base-unit quantity or ten times that unit, enforcing
/// "exactly one of each pair" and normalizing to the base unit. Used for
/// both area and price at the HTTP boundary.
pub fn normalize_scaled_pair(base: Option<f64>, times_ten: Option<f64>) -> Result<f64, String> {
    match (base, times_ten) {
        (Some(v), None) => Ok(v),
        (None, Some(v)) => Ok(v / 10.0),
        (Some(_), Some(_)) => Err("exactly one of the unit-pair fields must be set".to_string()),
        (None, None) => Err("one of the unit-pair fields must be set".to_string()),
    }
}

/// Worker-hours attributed to one event firing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerUsage {
    pub worker_id: String,
    pub hours: f64,
}

/// Resource quantity attributed to one event firing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub resource_id: String,
    pub quantity: f64,
    pub unit: String,
}

/// One event firing, extracted from `r[e,t]=1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub day: u32,
    pub event_id: String,
    pub crop_id: String,
    pub land_ids: Vec<String>,
    pub worker_usages: Vec<WorkerUsage>,
    pub resource_usages: Vec<ResourceUsage>,
    pub event_name: String,
}

/// A run of constant per-crop area on one land, compressed from consecutive
/// days for timeline reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandSpan {
    pub land_id: String,
    pub crop_id: String,
    pub start_day: u32,
    pub end_day: u32,
    pub area: f64,
}

/// Human-readable names for the ids appearing in a [`Timeline`], so a
/// client doesn't need the original `Plan` to render one.
pub type EntityNames = HashMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Timeline {
    pub land_spans: Vec<LandSpan>,
    pub events: Vec<EventRecord>,
    pub entity_names: EntityNames,
}

/// Result of one `/optimize` call or completed async job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// One of `ok | infeasible | timeout | unknown | error`.
    pub status: String,
    pub objective_value: Option<f64>,
    pub solution: Option<HashMap<String, f64>>,
    pub stats: HashMap<String, f64>,
    pub warnings: Vec<String>,
    pub timeline: Option<Timeline>,
}

impl OptimizationResult {
    pub fn infeasible(reason: impl Into<String>, hints: Vec<String>) -> Self {
        let mut warnings = vec![reason.into()];
        warnings.extend(hints);
        Self {
            status: "infeasible".to_string(),
            objective_value: None,
            solution: None,
            stats: HashMap::new(),
            warnings,
            timeline: None,
        }
    }

    /// A stage stopped without a conclusive `{OPTIMAL, FEASIBLE, INFEASIBLE}`
    /// status - most often a per-stage time limit reached before HiGHS could
    /// prove either. Distinct from `infeasible`: the model was never shown
    /// to have no solution.
    pub fn unknown(reason: impl Into<String>, hints: Vec<String>) -> Self {
        let mut warnings = vec![reason.into()];
        warnings.extend(hints);
        Self {
            status: "unknown".to_string(),
            objective_value: None,
            solution: None,
            stats: HashMap::new(),
            warnings,
            timeline: None,
        }
    }

    pub fn timeout(budget_ms: u64) -> Self {
        Self {
            status: "timeout".to_string(),
            objective_value: None,
            solution: None,
            stats: HashMap::from([("budget_ms".to_string(), budget_ms as f64)]),
            warnings: vec![],
            timeline: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            objective_value: None,
            solution: None,
            stats: HashMap::new(),
            warnings: vec![message.into()],
            timeline: None,
        }
    }
}

/// Status payload returned by `GET /jobs/{id}` and the initial `202` from
/// `POST /optimize/async`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: JobId,
    pub status: String,
    pub progress: f32,
    pub result: Option<OptimizationResult>,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The durable backend's persisted row, keyed by `job_id` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRow {
    pub job_id: JobId,
    pub status: String,
    pub progress: f64,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub cancel_flag: bool,
    pub expires_at: i64,
    pub idem_key: Option<String>,
    pub request_ref: String,
    pub result_ref: Option<String>,
    pub error_message: Option<String>,
}

/// The at-least-once message bus envelope: just the job id, per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: JobId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_conversion_round_trips() {
        for external in 0..10u32 {
            assert_eq!(to_external_day(from_external_day(external)), external);
        }
    }

    #[test]
    fn normalize_scaled_pair_requires_exactly_one() {
        assert_eq!(normalize_scaled_pair(Some(5.0), None), Ok(5.0));
        assert_eq!(normalize_scaled_pair(None, Some(50.0)), Ok(5.0));
        assert!(normalize_scaled_pair(Some(5.0), Some(50.0)).is_err());
        assert!(normalize_scaled_pair(None, None).is_err());
    }

    #[test]
    fn job_id_serializes_as_string() {
        let id = JobId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
