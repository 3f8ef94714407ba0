//! Sparse-variable-creation windows: coarse feasible days per event, and
//! the occupancy span per crop those events imply.
//!
//! Computed once per [`crate::builder::ModelContext::build`] call, before any
//! constraint runs, so constraints only ever create variables for days that
//! could plausibly matter.

use std::collections::{BTreeSet, HashMap};

use farmplan_core::model::Plan;

/// For every event, the coarse day window `[min(start_cond), max(end_cond)]`
/// intersected with the horizon. Frequency and lag narrow activity further,
/// but those are per-pair constraints applied later by the event-window
/// constraint, not reflected here.
pub fn compute_event_windows(plan: &Plan) -> HashMap<String, BTreeSet<u32>> {
    let all_days: BTreeSet<u32> = plan.horizon.days().collect();
    let mut windows = HashMap::new();

    for event in &plan.events {
        let start_set = event.start_cond.clone().unwrap_or_else(|| all_days.iter().copied().collect());
        let end_set = event.end_cond.clone().unwrap_or_else(|| all_days.iter().copied().collect());

        let window = if !start_set.is_empty() && !end_set.is_empty() {
            let lo = *start_set.iter().min().unwrap();
            let hi = *end_set.iter().max().unwrap();
            let lo = lo.max(1);
            let hi = hi.min(plan.horizon.num_days);
            if lo <= hi {
                (lo..=hi).collect()
            } else {
                BTreeSet::new()
            }
        } else {
            all_days.clone()
        };

        windows.insert(event.id.clone(), window);
    }

    windows
}

/// For every crop, the continuous span between the earliest and latest day
/// any land-using event for that crop could activate. Crops with no
/// land-using event get an empty window: their `occ`/`x` variables are only
/// created if another constraint explicitly needs them.
pub fn compute_crop_occupancy(
    plan: &Plan,
    event_windows: &HashMap<String, BTreeSet<u32>>,
) -> HashMap<String, BTreeSet<u32>> {
    let mut bounds_by_crop: HashMap<String, (u32, u32)> = HashMap::new();

    for event in &plan.events {
        if !event.uses_land {
            continue;
        }
        let Some(window) = event_windows.get(&event.id) else {
            continue;
        };
        if window.is_empty() {
            continue;
        }
        let lo = *window.iter().min().unwrap();
        let hi = *window.iter().max().unwrap();
        bounds_by_crop
            .entry(event.crop_id.clone())
            .and_modify(|(existing_lo, existing_hi)| {
                *existing_lo = (*existing_lo).min(lo);
                *existing_hi = (*existing_hi).max(hi);
            })
            .or_insert((lo, hi));
    }

    let mut occ_windows = HashMap::new();
    for crop in &plan.crops {
        let days = match bounds_by_crop.get(&crop.id) {
            Some(&(lo, hi)) => {
                let lo = lo.max(1);
                let hi = hi.min(plan.horizon.num_days);
                if lo <= hi {
                    (lo..=hi).collect()
                } else {
                    BTreeSet::new()
                }
            }
            None => BTreeSet::new(),
        };
        occ_windows.insert(crop.id.clone(), days);
    }
    occ_windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::{Crop, Event, Horizon};

    fn plan_with_event(start: Option<Vec<u32>>, end: Option<Vec<u32>>) -> Plan {
        Plan {
            horizon: Horizon { num_days: 20 },
            crops: vec![Crop {
                id: "wheat".into(),
                name: "Wheat".into(),
                category: None,
                price_per_area: None,
            }],
            events: vec![Event {
                id: "sow".into(),
                crop_id: "wheat".into(),
                name: "Sow".into(),
                category: None,
                kind: None,
                uses_land: true,
                start_cond: start.map(|v| v.into_iter().collect()),
                end_cond: end.map(|v| v.into_iter().collect()),
                frequency_days: None,
                preceding_event_id: None,
                lag_min_days: None,
                lag_max_days: None,
                people_required: None,
                labor_total_per_area: None,
                labor_daily_cap: None,
                required_roles: None,
                required_resources: None,
            }],
            lands: vec![],
            workers: vec![],
            resources: vec![],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[test]
    fn unrestricted_event_gets_full_horizon() {
        let plan = plan_with_event(None, None);
        let windows = compute_event_windows(&plan);
        assert_eq!(windows["sow"].len(), 20);
    }

    #[test]
    fn restricted_event_gets_intersection_window() {
        let plan = plan_with_event(Some(vec![3, 5]), Some(vec![8, 10]));
        let windows = compute_event_windows(&plan);
        assert_eq!(*windows["sow"].iter().next().unwrap(), 3);
        assert_eq!(*windows["sow"].iter().last().unwrap(), 10);
    }

    #[test]
    fn occupancy_window_follows_uses_land_event() {
        let plan = plan_with_event(Some(vec![3]), Some(vec![8]));
        let event_windows = compute_event_windows(&plan);
        let occ = compute_crop_occupancy(&plan, &event_windows);
        assert_eq!(occ["wheat"], (3..=8).collect());
    }

    #[test]
    fn crop_with_no_uses_land_event_has_empty_window() {
        let mut plan = plan_with_event(None, None);
        plan.events[0].uses_land = false;
        let event_windows = compute_event_windows(&plan);
        let occ = compute_crop_occupancy(&plan, &event_windows);
        assert!(occ["wheat"].is_empty());
    }
}
