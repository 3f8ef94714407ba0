//! `Σ_c x[l,c,t] + idle[l,t] == area_l` on every unblocked day; blocked days
//! leave `idle` pinned to zero and no area accounting runs, matching a
//! blocked land simply being absent from the day's capacity bookkeeping.
//! Only crops whose sparsified `x[l,c,t]` exists for day `t` contribute.

use std::collections::{HashMap, HashSet};

use farmplan_core::FarmResult;
use farmplan_model::keys::{IdleKey, XKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct IdleConstraint;

impl Constraint for IdleConstraint {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let lands: Vec<(String, f64, std::collections::HashSet<u32>)> = ctx
            .plan
            .lands
            .iter()
            .map(|l| (l.id.clone(), l.area, l.blocked_days.clone().unwrap_or_default()))
            .collect();
        let crop_ids: Vec<String> = ctx.plan.crops.iter().map(|c| c.id.clone()).collect();
        let crop_days: HashMap<String, HashSet<u32>> = crop_ids
            .iter()
            .map(|c| (c.clone(), ctx.x_days(c).into_iter().collect()))
            .collect();

        for (land_id, area, blocked) in &lands {
            for day in 1..=num_days {
                let idle = ctx
                    .registry
                    .get_or_create_idle(IdleKey::new(land_id.clone(), day), *area);

                if blocked.contains(&day) {
                    ctx.push(constraint!(idle <= 0));
                    continue;
                }

                let mut terms = Vec::with_capacity(crop_ids.len());
                for crop_id in &crop_ids {
                    if !crop_days[crop_id].contains(&day) {
                        continue;
                    }
                    let x = ctx.registry.get_or_create_x(
                        XKey::new(land_id.clone(), crop_id.clone(), day),
                        *area,
                    );
                    terms.push(x);
                }
                let sum: Expression = terms.into_iter().sum();
                ctx.push(constraint!(sum + idle == *area));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::{Crop, Horizon, Land, Plan};

    fn plan() -> Plan {
        Plan {
            horizon: Horizon { num_days: 2 },
            crops: vec![Crop {
                id: "wheat".into(),
                name: "Wheat".into(),
                category: None,
                price_per_area: None,
            }],
            events: vec![],
            lands: vec![Land {
                id: "L1".into(),
                name: "Field 1".into(),
                area: 10.0,
                tags: None,
                blocked_days: Some([1].into_iter().collect()),
            }],
            workers: vec![],
            resources: vec![],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[test]
    fn blocked_day_gets_a_single_zero_constraint() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        IdleConstraint.apply(&mut ctx).unwrap();
        assert_eq!(ctx.constraints.len(), 2);
    }
}
