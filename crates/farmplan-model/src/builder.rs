//! Shared state threaded through every constraint and objective builder: the
//! plan being modeled, the lazily-populated variable registry, the
//! precomputed windows, and the accumulating list of `good_lp` constraints.

use std::collections::{BTreeSet, HashMap};

use farmplan_core::model::{Crop, Event, Land, Plan, Resource, Worker};
use good_lp::Constraint;

use crate::registry::VariableRegistry;
use crate::windows::{compute_crop_occupancy, compute_event_windows};

/// Per-stage model-building context. One `ModelContext` is built per
/// lexicographic stage by [`crate::registry::VariableRegistry::new`] plus the
/// windows below; constraint modules push into `constraints` and read/create
/// variables through `registry`. The id-indexed maps exist so constraints
/// don't re-scan `plan.events`/`plan.lands`/... on every call.
pub struct ModelContext<'a> {
    pub plan: &'a Plan,
    pub registry: VariableRegistry,
    pub event_windows: HashMap<String, BTreeSet<u32>>,
    pub occ_windows: HashMap<String, BTreeSet<u32>>,
    pub constraints: Vec<Constraint>,

    crops_by_id: HashMap<&'a str, &'a Crop>,
    events_by_id: HashMap<&'a str, &'a Event>,
    lands_by_id: HashMap<&'a str, &'a Land>,
    workers_by_id: HashMap<&'a str, &'a Worker>,
    resources_by_id: HashMap<&'a str, &'a Resource>,
}

impl<'a> ModelContext<'a> {
    pub fn new(plan: &'a Plan) -> Self {
        let event_windows = compute_event_windows(plan);
        let occ_windows = compute_crop_occupancy(plan, &event_windows);

        Self {
            plan,
            registry: VariableRegistry::new(),
            event_windows,
            occ_windows,
            constraints: Vec::new(),
            crops_by_id: plan.crops.iter().map(|c| (c.id.as_str(), c)).collect(),
            events_by_id: plan.events.iter().map(|e| (e.id.as_str(), e)).collect(),
            lands_by_id: plan.lands.iter().map(|l| (l.id.as_str(), l)).collect(),
            workers_by_id: plan.workers.iter().map(|w| (w.id.as_str(), w)).collect(),
            resources_by_id: plan
                .resources
                .iter()
                .map(|r| (r.id.as_str(), r))
                .collect(),
        }
    }

    pub fn crop(&self, id: &str) -> Option<&'a Crop> {
        self.crops_by_id.get(id).copied()
    }

    pub fn event(&self, id: &str) -> Option<&'a Event> {
        self.events_by_id.get(id).copied()
    }

    pub fn land(&self, id: &str) -> Option<&'a Land> {
        self.lands_by_id.get(id).copied()
    }

    pub fn worker(&self, id: &str) -> Option<&'a Worker> {
        self.workers_by_id.get(id).copied()
    }

    pub fn resource(&self, id: &str) -> Option<&'a Resource> {
        self.resources_by_id.get(id).copied()
    }

    /// Days an event could plausibly be active on, per [`crate::windows`].
    /// Empty if the event has no intersection with its own start/end window.
    pub fn event_days(&self, event_id: &str) -> &BTreeSet<u32> {
        static EMPTY: std::sync::OnceLock<BTreeSet<u32>> = std::sync::OnceLock::new();
        self.event_windows
            .get(event_id)
            .unwrap_or_else(|| EMPTY.get_or_init(BTreeSet::new))
    }

    /// Days a crop could plausibly occupy land on.
    pub fn crop_occupancy_days(&self, crop_id: &str) -> &BTreeSet<u32> {
        static EMPTY: std::sync::OnceLock<BTreeSet<u32>> = std::sync::OnceLock::new();
        self.occ_windows
            .get(crop_id)
            .unwrap_or_else(|| EMPTY.get_or_init(BTreeSet::new))
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Consumes the context once a stage's constraints and objective are
    /// fully built, handing the registry and accumulated constraints to
    /// [`crate::solve_stage`]. The lifetime-bound lookup maps and borrowed
    /// `plan` are dropped with it; callers needing post-solve lookups call
    /// [`crate::registry::VariableRegistry::into_parts`] on the registry
    /// this returns before solving.
    pub fn into_problem(self) -> (VariableRegistry, Vec<Constraint>) {
        (self.registry, self.constraints)
    }

    /// Days `x[l,c,t]`/`occL[l,c,t]` may be created for, per the variable
    /// registry's sparsification rule: restricted to the crop's occupancy
    /// window, but falling back to the full horizon for a crop with no
    /// land-using event to derive a window from (an empty `OCC(c)` there
    /// doesn't mean "never planted", it means "no window to sparsify by").
    pub fn x_days(&self, crop_id: &str) -> Vec<u32> {
        let has_uses_land_event = self
            .plan
            .events
            .iter()
            .any(|e| e.crop_id == crop_id && e.uses_land);
        if has_uses_land_event {
            self.crop_occupancy_days(crop_id).iter().copied().collect()
        } else {
            self.plan.horizon.days().collect()
        }
    }

    /// The `x[land, crop, *]` variable at a day standing in for the crop's
    /// horizon-constant planted area, since there is no separate
    /// horizon-constant area variable (see `hold_area`/`labor`): any day
    /// inside the crop's occupancy window works, because that window is
    /// exactly where `hold_area` pins the area constant.
    pub fn representative_x(&mut self, land_id: &str, crop_id: &str) -> good_lp::Variable {
        let day = self
            .crop_occupancy_days(crop_id)
            .iter()
            .next()
            .copied()
            .unwrap_or(1);
        let area = self.land(land_id).map(|l| l.area).unwrap_or(0.0);
        self.registry.get_or_create_x(
            crate::keys::XKey::new(land_id.to_string(), crop_id.to_string(), day),
            area,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::Horizon;

    fn empty_plan() -> Plan {
        Plan {
            horizon: Horizon { num_days: 5 },
            crops: vec![Crop {
                id: "wheat".into(),
                name: "Wheat".into(),
                category: None,
                price_per_area: None,
            }],
            events: vec![],
            lands: vec![],
            workers: vec![],
            resources: vec![],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[test]
    fn lookups_resolve_known_ids() {
        let plan = empty_plan();
        let ctx = ModelContext::new(&plan);
        assert!(ctx.crop("wheat").is_some());
        assert!(ctx.crop("missing").is_none());
    }

    #[test]
    fn missing_event_has_empty_days() {
        let plan = empty_plan();
        let ctx = ModelContext::new(&plan);
        assert!(ctx.event_days("nope").is_empty());
    }
}
