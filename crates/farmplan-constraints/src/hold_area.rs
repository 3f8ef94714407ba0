//! Keeps `x[l,c,t]` constant day-to-day while a land is occupying a crop,
//! so area already committed to a growing crop can't be reshuffled
//! mid-season. Ported from a CP-SAT `OnlyEnforceIf` as a big-M pair since
//! `good_lp` has no native reification: `area <= M` bounds both sides, so
//! `M = land.area` is enough to make the pair vacuous whenever `occ_l = 0`.

use farmplan_core::FarmResult;
use farmplan_model::keys::{OccLKey, XKey};
use farmplan_model::ModelContext;
use good_lp::constraint;

use crate::registry::Constraint;

pub struct HoldAreaConstraint;

impl Constraint for HoldAreaConstraint {
    fn name(&self) -> &'static str {
        "hold_area"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let land_ids: Vec<String> = ctx.plan.lands.iter().map(|l| l.id.clone()).collect();
        let crop_ids: Vec<String> = ctx.plan.crops.iter().map(|c| c.id.clone()).collect();

        for land_id in &land_ids {
            let area = ctx.land(land_id).map(|l| l.area).unwrap_or(0.0);
            let blocked = ctx
                .land(land_id)
                .and_then(|l| l.blocked_days.clone())
                .unwrap_or_default();

            for crop_id in &crop_ids {
                let days = ctx.x_days(crop_id);
                for pair in days.windows(2) {
                    let (prev, t) = (pair[0], pair[1]);
                    if t != prev + 1 {
                        continue;
                    }
                    if blocked.contains(&t) || blocked.contains(&prev) {
                        continue;
                    }
                    let occ_t = ctx.registry.get_or_create_occ_l(OccLKey::new(
                        land_id.clone(),
                        crop_id.clone(),
                        t,
                    ));
                    let x_t = ctx
                        .registry
                        .get_or_create_x(XKey::new(land_id.clone(), crop_id.clone(), t), area);
                    let x_prev = ctx.registry.get_or_create_x(
                        XKey::new(land_id.clone(), crop_id.clone(), prev),
                        area,
                    );

                    ctx.push(constraint!(x_t - x_prev <= area * (1.0 - occ_t)));
                    ctx.push(constraint!(x_prev - x_t <= area * (1.0 - occ_t)));
                }
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
            fixed_areas: vec![],
        }
    }

    #[test]
    fn adds_two_constraints_per_consecutive_day_pair() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        HoldAreaConstraint.apply(&mut ctx).unwrap();
        assert_eq!(ctx.constraints.len(), 4);
    }
}
