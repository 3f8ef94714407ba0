//! Required-role coverage: on any day an event with `required_roles` is
//! active, some assigned worker must hold each required role, and workers
//! lacking every required role can't be assigned at all.

use std::collections::HashSet;

use farmplan_core::FarmResult;
use farmplan_model::keys::{AKey, RKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct RolesConstraint;

impl Constraint for RolesConstraint {
    fn name(&self) -> &'static str {
        "roles"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let workers: Vec<(String, HashSet<String>)> = ctx
            .plan
            .workers
            .iter()
            .map(|w| (w.id.clone(), w.roles.clone()))
            .collect();
        let events = ctx.plan.events.clone();

        for event in &events {
            let Some(required_roles) = event.required_roles.clone() else {
                continue;
            };
            if required_roles.is_empty() {
                continue;
            }

            for day in 1..=num_days {
                let r = ctx.registry.get_or_create_r(RKey::new(event.id.clone(), day));

                let mut assigns_by_worker = Vec::with_capacity(workers.len());
                for (worker_id, roles) in &workers {
                    let assign = ctx
                        .registry
                        .get_or_create_a(AKey::new(worker_id.clone(), event.id.clone(), day));
                    if (roles & &required_roles).is_empty() {
                        ctx.push(constraint!(assign <= 0));
                    }
                    assigns_by_worker.push((roles.clone(), assign));
                }

                for role in &required_roles {
                    let role_assigns: Vec<_> = assigns_by_worker
                        .iter()
                        .filter(|(roles, _)| roles.contains(role))
                        .map(|(_, assign)| *assign)
                        .collect();
                    if role_assigns.is_empty() {
                        ctx.push(constraint!(r <= 0));
                    } else {
                        let sum: Expression = role_assigns.into_iter().sum();
                        ctx.push(constraint!(sum >= r));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::{Crop, Event, Horizon, Plan, Worker};
    use std::collections::HashSet;

    fn plan_with_role(role: &str, worker_has_role: bool) -> Plan {
        let mut roles = HashSet::new();
        if worker_has_role {
            roles.insert(role.to_string());
        }
        let mut required = HashSet::new();
        required.insert(role.to_string());

        Plan {
            horizon: Horizon { num_days: 1 },
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
                start_cond: None,
                end_cond: None,
                frequency_days: None,
                preceding_event_id: None,
                lag_min_days: None,
                lag_max_days: None,
                people_required: None,
                labor_total_per_area: None,
                labor_daily_cap: None,
                required_roles: Some(required),
                required_resources: None,
            }],
            lands: vec![],
            workers: vec![Worker {
                id: "W1".into(),
                name: "Worker 1".into(),
                roles,
                capacity_per_day: 8.0,
                blocked_days: None,
            }],
            resources: vec![],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[test]
    fn worker_without_role_is_forbidden_from_assignment() {
        let plan = plan_with_role("irrigator", false);
        let mut ctx = ModelContext::new(&plan);
        RolesConstraint.apply(&mut ctx).unwrap();
        assert!(!ctx.constraints.is_empty());
    }

    #[test]
    fn worker_with_role_permits_assignment() {
        let plan = plan_with_role("irrigator", true);
        let mut ctx = ModelContext::new(&plan);
        RolesConstraint.apply(&mut ctx).unwrap();
        assert!(!ctx.constraints.is_empty());
    }
}
