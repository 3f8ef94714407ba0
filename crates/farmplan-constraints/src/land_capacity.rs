//! `Σ_c x[l,c,t] <= area_l` for every land and every day a crop's window
//! admits an `x[l,c,t]` variable at all.

use std::collections::{HashMap, HashSet};

use farmplan_core::FarmResult;
use farmplan_model::keys::XKey;
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct LandCapacityConstraint;

impl Constraint for LandCapacityConstraint {
    fn name(&self) -> &'static str {
        "land_capacity"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let land_ids: Vec<String> = ctx.plan.lands.iter().map(|l| l.id.clone()).collect();
        let crop_ids: Vec<String> = ctx.plan.crops.iter().map(|c| c.id.clone()).collect();
        let days: Vec<u32> = ctx.plan.horizon.days().collect();
        let crop_days: HashMap<String, HashSet<u32>> = crop_ids
            .iter()
            .map(|c| (c.clone(), ctx.x_days(c).into_iter().collect()))
            .collect();

        for land_id in &land_ids {
            let area = ctx.land(land_id).map(|l| l.area).unwrap_or(0.0);
            for &day in &days {
                let terms: Vec<_> = crop_ids
                    .iter()
                    .filter(|crop_id| crop_days[*crop_id].contains(&day))
                    .map(|crop_id| {
                        let key = XKey::new(land_id.clone(), crop_id.clone(), day);
                        ctx.registry.get_or_create_x(key, area)
                    })
                    .collect();
                if terms.is_empty() {
                    continue;
                }
                let sum: Expression = terms.into_iter().sum();
                ctx.push(constraint!(sum <= area));
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
                blocked_days: None,
            }],
            workers: vec![],
            resources: vec![],
            crop_area_bounds: vec![],
            fixed_areas: vec![],
        }
    }

    #[test]
    fn creates_one_constraint_per_land_day() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        LandCapacityConstraint.apply(&mut ctx).unwrap();
        assert_eq!(ctx.constraints.len(), 2);
    }
}
