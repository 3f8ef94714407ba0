//! `Σ_t x[l,c,t] >= fixed_area` for every configured `(land, crop)` pair.

use farmplan_core::FarmResult;
use farmplan_model::keys::XKey;
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct FixedAreaConstraint;

impl Constraint for FixedAreaConstraint {
    fn name(&self) -> &'static str {
        "fixed_area"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let fixed_areas = ctx.plan.fixed_areas.clone();

        for fa in &fixed_areas {
            let land_area = ctx.land(&fa.land_id).map(|l| l.area).unwrap_or(0.0);
            if ctx.land(&fa.land_id).is_none() || ctx.crop(&fa.crop_id).is_none() {
                continue;
            }
            let sum: Expression = ctx
                .x_days(&fa.crop_id)
                .into_iter()
                .map(|day| {
                    ctx.registry.get_or_create_x(
                        XKey::new(fa.land_id.clone(), fa.crop_id.clone(), day),
                        land_area,
                    )
                })
                .sum();
            ctx.push(constraint!(sum >= fa.area));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmplan_core::model::{Crop, FixedArea, Horizon, Land, Plan};

    fn plan() -> Plan {
        Plan {
            horizon: Horizon { num_days: 3 },
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
            fixed_areas: vec![FixedArea {
                land_id: "L1".into(),
                crop_id: "wheat".into(),
                area: 4.0,
            }],
        }
    }

    #[test]
    fn one_constraint_per_fixed_area_entry() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        FixedAreaConstraint.apply(&mut ctx).unwrap();
        assert_eq!(ctx.constraints.len(), 1);
    }

    #[test]
    fn unknown_land_is_skipped() {
        let mut plan = plan();
        plan.fixed_areas[0].land_id = "missing".into();
        let mut ctx = ModelContext::new(&plan);
        FixedAreaConstraint.apply(&mut ctx).unwrap();
        assert!(ctx.constraints.is_empty());
    }
}
