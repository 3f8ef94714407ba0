//! Turns the final stage's solved variable values into the external
//! [`crate::payload::Timeline`]: per-(land, crop) area compressed into
//! [`crate::payload::LandSpan`] runs, and per-event firings into
//! [`crate::payload::EventRecord`]s gathering the workers, hours, and
//! resources an active `r[e,t]=1` pulled in.

use std::collections::HashMap;

use farmplan_core::model::Plan;
use farmplan_model::VariableMaps;
use good_lp::Variable;

use crate::payload::{EventRecord, LandSpan, ResourceUsage, Timeline, WorkerUsage};

/// Values below this are treated as zero/off when reading back a solved
/// binary or area variable; HiGHS can return values like `1e-9` for a
/// variable pinned to its lower bound.
const ACTIVE_EPSILON: f64 = 1e-6;

fn value_of(values: &HashMap<Variable, f64>, var: Variable) -> f64 {
    values.get(&var).copied().unwrap_or(0.0)
}

fn is_active(values: &HashMap<Variable, f64>, var: Variable) -> bool {
    value_of(values, var) > 0.5
}

/// Compress per-day planted area into runs of (near-)constant area.
fn land_spans(plan: &Plan, maps: &VariableMaps, values: &HashMap<Variable, f64>) -> Vec<LandSpan> {
    let mut spans = Vec::new();

    for land in &plan.lands {
        for crop in &plan.crops {
            let mut current: Option<(u32, u32, f64)> = None;

            for day in plan.horizon.days() {
                let key = farmplan_model::keys::XKey::new(land.id.clone(), crop.id.clone(), day);
                let area = maps
                    .x
                    .get(&key)
                    .map(|&v| value_of(values, v))
                    .unwrap_or(0.0);

                if area <= ACTIVE_EPSILON {
                    if let Some((start, end, a)) = current.take() {
                        spans.push(LandSpan {
                            land_id: land.id.clone(),
                            crop_id: crop.id.clone(),
                            start_day: start,
                            end_day: end,
                            area: a,
                        });
                    }
                    continue;
                }

                match &mut current {
                    Some((_, end, a)) if (*a - area).abs() <= ACTIVE_EPSILON => {
                        *end = day;
                    }
                    Some((start, end, a)) => {
                        spans.push(LandSpan {
                            land_id: land.id.clone(),
                            crop_id: crop.id.clone(),
                            start_day: *start,
                            end_day: *end,
                            area: *a,
                        });
                        current = Some((day, day, area));
                    }
                    None => current = Some((day, day, area)),
                }
            }

            if let Some((start, end, a)) = current {
                spans.push(LandSpan {
                    land_id: land.id.clone(),
                    crop_id: crop.id.clone(),
                    start_day: start,
                    end_day: end,
                    area: a,
                });
            }
        }
    }

    spans
}

/// Every `r[e,t]=1` firing, with the workers, hours, resources, and lands it
/// pulled in.
fn event_records(plan: &Plan, maps: &VariableMaps, values: &HashMap<Variable, f64>) -> Vec<EventRecord> {
    let mut records = Vec::new();

    for event in &plan.events {
        for day in plan.horizon.days() {
            let r_key = farmplan_model::keys::RKey::new(event.id.clone(), day);
            let Some(&r) = maps.r.get(&r_key) else {
                continue;
            };
            if !is_active(values, r) {
                continue;
            }

            let land_ids: Vec<String> = plan
                .lands
                .iter()
                .filter(|land| {
                    let key = farmplan_model::keys::OccLKey::new(
                        land.id.clone(),
                        event.crop_id.clone(),
                        day,
                    );
                    maps.occ_l
                        .get(&key)
                        .map(|&v| is_active(values, v))
                        .unwrap_or(false)
                })
                .map(|land| land.id.clone())
                .collect();

            let worker_usages: Vec<WorkerUsage> = plan
                .workers
                .iter()
                .filter_map(|worker| {
                    let key = farmplan_model::keys::HKey::new(
                        worker.id.clone(),
                        event.id.clone(),
                        day,
                    );
                    maps.h.get(&key).map(|&v| (worker, value_of(values, v)))
                })
                .filter(|(_, hours)| *hours > ACTIVE_EPSILON)
                .map(|(worker, hours)| WorkerUsage {
                    worker_id: worker.id.clone(),
                    hours,
                })
                .collect();

            let resource_usages: Vec<ResourceUsage> = plan
                .resources
                .iter()
                .filter_map(|resource| {
                    let key = farmplan_model::keys::UKey::new(
                        resource.id.clone(),
                        event.id.clone(),
                        day,
                    );
                    maps.u.get(&key).map(|&v| (resource, value_of(values, v)))
                })
                .filter(|(_, hours)| *hours > ACTIVE_EPSILON)
                .map(|(resource, hours)| ResourceUsage {
                    resource_id: resource.id.clone(),
                    quantity: hours,
                    unit: "hours".to_string(),
                })
                .collect();

            records.push(EventRecord {
                day: crate::payload::to_external_day(day),
                event_id: event.id.clone(),
                crop_id: event.crop_id.clone(),
                land_ids,
                worker_usages,
                resource_usages,
                event_name: event.name.clone(),
            });
        }
    }

    records
}

fn entity_names(plan: &Plan) -> HashMap<String, String> {
    let mut names = HashMap::new();
    for land in &plan.lands {
        names.insert(land.id.clone(), land.name.clone());
    }
    for crop in &plan.crops {
        names.insert(crop.id.clone(), crop.name.clone());
    }
    for event in &plan.events {
        names.insert(event.id.clone(), event.name.clone());
    }
    for worker in &plan.workers {
        names.insert(worker.id.clone(), worker.name.clone());
    }
    for resource in &plan.resources {
        names.insert(resource.id.clone(), resource.name.clone());
    }
    names
}

/// Build the final [`Timeline`] from the last stage's solved variables.
pub fn extract_timeline(plan: &Plan, maps: &VariableMaps, values: &HashMap<Variable, f64>) -> Timeline {
    Timeline {
        land_spans: land_spans(plan, maps, values),
        events: event_records(plan, maps, values),
        entity_names: entity_names(plan),
    }
}

/// Flat `{variable-key display → value}` map for the `solution` field of
/// [`crate::payload::OptimizationResult`], useful for debugging a run
/// without re-deriving the timeline.
pub fn flatten_solution(maps: &VariableMaps, values: &HashMap<Variable, f64>) -> HashMap<String, f64> {
    let mut flat = HashMap::new();
    for (key, &var) in &maps.x {
        flat.insert(key.to_string(), value_of(values, var));
    }
    for (key, &var) in &maps.r {
        flat.insert(key.to_string(), value_of(values, var));
    }
    flat
}
