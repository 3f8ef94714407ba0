//! The farm planning domain model: the entities a [`Plan`] is built from.
//!
//! Every type here mirrors a section of the external `PlanRequest` payload.
//! All fields are public and `serde`-derived so a `Plan` can be read directly
//! from the JSON request body described by the optimization result contract.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FarmError, FarmResult};

/// The day-indexed scheduling horizon. Days are 1-based: `1..=num_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub num_days: u32,
}

impl Horizon {
    pub fn days(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.num_days
    }

    pub fn contains_day(&self, day: u32) -> bool {
        day >= 1 && day <= self.num_days
    }
}

/// A crop that can be planted on land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Revenue per scaled area unit at harvest; `None` treated as zero.
    #[serde(default)]
    pub price_per_area: Option<f64>,
}

/// How an event's activation is windowed over the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Fires at most once within its window.
    OneShot,
    /// May recur, subject to `frequency_days`.
    Repeat,
    /// Active continuously for `duration_days` once started.
    Sustain,
}

/// A schedulable unit of farm work tied to one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub crop_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub kind: Option<EventKind>,

    /// Whether this event occupies land while active (drives occupancy
    /// derivation and the hold-area constraint).
    #[serde(default)]
    pub uses_land: bool,

    /// Earliest days the event may start; `None` means unrestricted.
    #[serde(default)]
    pub start_cond: Option<HashSet<u32>>,
    /// Latest days the event may still be active; `None` means unrestricted.
    #[serde(default)]
    pub end_cond: Option<HashSet<u32>>,
    /// Minimum day gap between consecutive activations.
    #[serde(default)]
    pub frequency_days: Option<u32>,

    /// An event that must precede this one within `[lag_min_days, lag_max_days]`.
    #[serde(default)]
    pub preceding_event_id: Option<String>,
    #[serde(default)]
    pub lag_min_days: Option<u32>,
    #[serde(default)]
    pub lag_max_days: Option<u32>,

    /// Minimum headcount required on any day the event is active.
    #[serde(default)]
    pub people_required: Option<u32>,
    /// Total labor hours per scaled area unit of the event's crop, spread
    /// exactly over every day the event is active (see `scale::Rational`).
    #[serde(default)]
    pub labor_total_per_area: Option<f64>,
    /// Hard cap on combined worker-hours on any single active day.
    #[serde(default)]
    pub labor_daily_cap: Option<f64>,
    #[serde(default)]
    pub required_roles: Option<HashSet<String>>,
    #[serde(default)]
    pub required_resources: Option<HashSet<String>>,
}

/// A parcel of land with a fixed area and calendar of blocked days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Land {
    pub id: String,
    pub name: String,
    /// Area in "a" (are), pre-scaling.
    pub area: f64,
    #[serde(default)]
    pub tags: Option<HashSet<String>>,
    #[serde(default)]
    pub blocked_days: Option<HashSet<u32>>,
}

/// A worker able to be assigned to events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub roles: HashSet<String>,
    /// Hours available per day.
    pub capacity_per_day: f64,
    #[serde(default)]
    pub blocked_days: Option<HashSet<u32>>,
}

/// A shared resource (equipment, vehicle, ...) events may require.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub capacity_per_day: Option<f64>,
    #[serde(default)]
    pub blocked_days: Option<HashSet<u32>>,
}

/// A lower bound on total planted area for a (land, crop) pair, held
/// constant for the whole horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedArea {
    pub land_id: String,
    pub crop_id: String,
    pub area: f64,
}

/// Horizon-wide min/max bounds on a crop's total planted area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropAreaBound {
    pub crop_id: String,
    #[serde(default)]
    pub min_area: Option<f64>,
    #[serde(default)]
    pub max_area: Option<f64>,
}

/// The full declarative description of a planning problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub horizon: Horizon,
    pub crops: Vec<Crop>,
    pub events: Vec<Event>,
    pub lands: Vec<Land>,
    pub workers: Vec<Worker>,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub crop_area_bounds: Vec<CropAreaBound>,
    #[serde(default)]
    pub fixed_areas: Vec<FixedArea>,
}

impl Plan {
    /// Validate cross-references and calendar bounds, returning accumulated
    /// warnings as [`crate::diagnostics::Diagnostics`] on success. The first
    /// structural error (unknown reference, out-of-range day, conflicting
    /// fixed area, inconsistent lag) short-circuits with [`FarmError`] -
    /// validation runs once before any stage solve, never mid-stage.
    pub fn validate(&self) -> FarmResult<crate::diagnostics::Diagnostics> {
        let mut diagnostics = crate::diagnostics::Diagnostics::new();

        let crop_ids: HashSet<&str> = self.crops.iter().map(|c| c.id.as_str()).collect();
        let land_ids: HashSet<&str> = self.lands.iter().map(|l| l.id.as_str()).collect();
        let event_ids: HashSet<&str> = self.events.iter().map(|e| e.id.as_str()).collect();
        let resource_ids: HashSet<&str> = self.resources.iter().map(|r| r.id.as_str()).collect();
        let crops_with_events: HashSet<&str> =
            self.events.iter().map(|e| e.crop_id.as_str()).collect();

        for crop in &self.crops {
            if !crops_with_events.contains(crop.id.as_str()) {
                return Err(FarmError::CropWithoutEvent {
                    crop_id: crop.id.clone(),
                });
            }
        }

        let check_day = |field: &'static str, day: u32| -> FarmResult<()> {
            if !self.horizon.contains_day(day) {
                return Err(FarmError::OutOfRange {
                    field,
                    value: day as i64,
                    num_days: self.horizon.num_days,
                });
            }
            Ok(())
        };

        for land in &self.lands {
            for &day in land.blocked_days.iter().flatten() {
                check_day("land.blocked_days", day)?;
            }
        }
        for worker in &self.workers {
            for &day in worker.blocked_days.iter().flatten() {
                check_day("worker.blocked_days", day)?;
            }
        }
        for resource in &self.resources {
            for &day in resource.blocked_days.iter().flatten() {
                check_day("resource.blocked_days", day)?;
            }
        }

        for event in &self.events {
            if !crop_ids.contains(event.crop_id.as_str()) {
                return Err(FarmError::UnknownReference {
                    kind: "crop",
                    id: event.crop_id.clone(),
                });
            }
            for &day in event
                .start_cond
                .iter()
                .flatten()
                .chain(event.end_cond.iter().flatten())
            {
                check_day("event.start_cond/end_cond", day)?;
            }
            if let Some(pred) = &event.preceding_event_id {
                if !event_ids.contains(pred.as_str()) {
                    return Err(FarmError::UnknownReference {
                        kind: "event",
                        id: pred.clone(),
                    });
                }
                if let (Some(lo), Some(hi)) = (event.lag_min_days, event.lag_max_days) {
                    if lo > hi {
                        return Err(FarmError::InconsistentLag {
                            event_id: event.id.clone(),
                            lag_min: lo,
                            lag_max: hi,
                        });
                    }
                }
            }
            if event.frequency_days == Some(0) {
                diagnostics.add_warning_with_entity(
                    "window",
                    "frequency_days of 0 has no effect",
                    &event.id,
                );
            }
            for rid in event.required_resources.iter().flatten() {
                if !resource_ids.contains(rid.as_str()) {
                    return Err(FarmError::UnknownReference {
                        kind: "resource",
                        id: rid.clone(),
                    });
                }
            }
        }

        let mut seen_fixed: std::collections::HashMap<(&str, &str), f64> =
            std::collections::HashMap::new();
        for fa in &self.fixed_areas {
            if !land_ids.contains(fa.land_id.as_str()) {
                return Err(FarmError::UnknownReference {
                    kind: "land",
                    id: fa.land_id.clone(),
                });
            }
            if !crop_ids.contains(fa.crop_id.as_str()) {
                return Err(FarmError::UnknownReference {
                    kind: "crop",
                    id: fa.crop_id.clone(),
                });
            }
            let key = (fa.land_id.as_str(), fa.crop_id.as_str());
            if let Some(existing) = seen_fixed.get(&key) {
                if (*existing - fa.area).abs() > 1e-9 {
                    return Err(FarmError::ConflictingFixedArea {
                        land_id: fa.land_id.clone(),
                        crop_id: fa.crop_id.clone(),
                    });
                }
            } else {
                seen_fixed.insert(key, fa.area);
            }
        }

        for bound in &self.crop_area_bounds {
            if !crop_ids.contains(bound.crop_id.as_str()) {
                return Err(FarmError::UnknownReference {
                    kind: "crop",
                    id: bound.crop_id.clone(),
                });
            }
            if let (Some(min), Some(max)) = (bound.min_area, bound.max_area) {
                if min > max {
                    diagnostics.add_warning_with_entity(
                        "capacity",
                        "min_area exceeds max_area",
                        &bound.crop_id,
                    );
                }
            }
        }

        Ok(diagnostics)
    }
}
