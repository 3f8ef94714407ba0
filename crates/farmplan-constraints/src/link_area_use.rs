//! `x[l,c,t] <= area_l * z[l,c]` for every day a crop's window admits an
//! `x[l,c,t]` variable: the horizon-wide "land l ever hosts crop c"
//! indicator must be set whenever any area is planted. Also links each
//! `z[l,c]` to the crop-wide `use[c]` indicator (`z[l,c] <= use[c]`,
//! `use[c] <= Σ_l z[l,c]`), so `use[c] = 1` iff some land ever hosts `c`.

use farmplan_core::FarmResult;
use farmplan_model::keys::{UseKey, XKey, ZKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct LinkAreaUseConstraint;

impl Constraint for LinkAreaUseConstraint {
    fn name(&self) -> &'static str {
        "link_area_use"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let land_ids: Vec<String> = ctx.plan.lands.iter().map(|l| l.id.clone()).collect();
        let crop_ids: Vec<String> = ctx.plan.crops.iter().map(|c| c.id.clone()).collect();

        for crop_id in &crop_ids {
            let days = ctx.x_days(crop_id);
            let mut z_vars = Vec::with_capacity(land_ids.len());

            for land_id in &land_ids {
                let area = ctx.land(land_id).map(|l| l.area).unwrap_or(0.0);
                let z = ctx
                    .registry
                    .get_or_create_z(ZKey::new(land_id.clone(), crop_id.clone()));
                z_vars.push(z);
                for &day in &days {
                    let x = ctx.registry.get_or_create_x(
                        XKey::new(land_id.clone(), crop_id.clone(), day),
                        area,
                    );
                    ctx.push(constraint!(x <= area * z));
                }
            }

            let use_ = ctx.registry.get_or_create_use(UseKey::new(crop_id.clone()));
            for &z in &z_vars {
                ctx.push(constraint!(z <= use_));
            }
            let z_sum: Expression = z_vars.into_iter().sum();
            ctx.push(constraint!(use_ <= z_sum));
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
            horizon: Horizon { num_days: 1 },
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
    fn creates_link_constraint_per_land_crop_day_plus_use_wiring() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        LinkAreaUseConstraint.apply(&mut ctx).unwrap();
        // 1 land * 1 day area-link, plus z<=use per land, plus use<=Σz once.
        assert_eq!(ctx.constraints.len(), 3);
    }
}
