//! Shared-resource capacity per day, and the link tying an event's required
//! resources to the labor hours it actually uses that day.

use farmplan_core::FarmResult;
use farmplan_model::keys::{HKey, UKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct ResourcesConstraint;

impl Constraint for ResourcesConstraint {
    fn name(&self) -> &'static str {
        "resources"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let resources: Vec<(String, f64, std::collections::HashSet<u32>)> = ctx
            .plan
            .resources
            .iter()
            .map(|r| {
                (
                    r.id.clone(),
                    r.capacity_per_day.unwrap_or(0.0),
                    r.blocked_days.clone().unwrap_or_default(),
                )
            })
            .collect();
        let events = ctx.plan.events.clone();

        for (resource_id, capacity, blocked_days) in &resources {
            for day in 1..=num_days {
                let mut day_terms = Vec::with_capacity(events.len());
                for event in &events {
                    let u = ctx.registry.get_or_create_u(
                        UKey::new(resource_id.clone(), event.id.clone(), day),
                        *capacity,
                    );
                    if blocked_days.contains(&day) {
                        ctx.push(constraint!(u <= 0));
                    }
                    day_terms.push(u);
                }
                if !day_terms.is_empty() && *capacity > 0.0 {
                    let sum: Expression = day_terms.into_iter().sum();
                    ctx.push(constraint!(sum <= *capacity));
                }
            }
        }

        for event in &events {
            let Some(required_resources) = event.required_resources.clone() else {
                continue;
            };
            if required_resources.is_empty() {
                continue;
            }
            for day in 1..=num_days {
                let lhs_terms: Vec<_> = resources
                    .iter()
                    .filter(|(id, _, _)| required_resources.contains(id))
                    .map(|(id, capacity, _)| {
                        ctx.registry.get_or_create_u(
                            UKey::new(id.clone(), event.id.clone(), day),
                            *capacity,
                        )
                    })
                    .collect();
                let rhs_terms: Vec<_> = ctx
                    .plan
                    .workers
                    .iter()
                    .map(|w| w.id.clone())
                    .collect::<Vec<_>>()
                    .into_iter()
                    .filter_map(|worker_id| {
                        ctx.registry
                            .lookup_h(&HKey::new(worker_id, event.id.clone(), day))
                    })
                    .collect();
                if !lhs_terms.is_empty() && !rhs_terms.is_empty() {
                    let lhs: Expression = lhs_terms.into_iter().sum();
                    let rhs: Expression = rhs_terms.into_iter().sum();
                    ctx.push(constraint!(lhs >= rhs));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::{Horizon, Plan, Resource};

    fn plan() -> Plan {
        Plan {
            horizon: Horizon { num_days: 2 },
            crops: vec![],
            events: vec![],
            lands: vec![],
            workers: vec![],
            resources: vec![Resource {
                id: "R1".into(),
                name: "Tractor".into(),
                category: None,
                capacity_per_day: Some(1.0),
                blocked_days: Some([2].into_iter().collect()),
            }],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[test]
    fn blocked_day_forces_zero_use() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        ResourcesConstraint.apply(&mut ctx).unwrap();
        assert!(!ctx.constraints.is_empty());
    }
}
