//! Ties a land's per-day occupancy to the crop's occupancy window whenever
//! that land is ever used for the crop (`z[l,c] = 1`), eliminating mid-season
//! gaps and unnecessary land switches. `OnlyEnforceIf(z)` in the source
//! becomes a standard binary big-M pair with `M = 1`.

use std::collections::HashSet;

use farmplan_core::FarmResult;
use farmplan_model::keys::{OccKey, OccLKey, ZKey};
use farmplan_model::ModelContext;
use good_lp::constraint;

use crate::registry::Constraint;

pub struct OccEqualizeConstraint;

impl Constraint for OccEqualizeConstraint {
    fn name(&self) -> &'static str {
        "occ_equalize"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let uses_land_crops: HashSet<String> = ctx
            .plan
            .events
            .iter()
            .filter(|e| e.uses_land)
            .map(|e| e.crop_id.clone())
            .collect();

        let lands: Vec<(String, HashSet<u32>)> = ctx
            .plan
            .lands
            .iter()
            .map(|l| (l.id.clone(), l.blocked_days.clone().unwrap_or_default()))
            .collect();

        for (land_id, blocked) in &lands {
            for crop_id in &uses_land_crops {
                let z = ctx
                    .registry
                    .get_or_create_z(ZKey::new(land_id.clone(), crop_id.clone()));
                for day in 1..=num_days {
                    if blocked.contains(&day) {
                        continue;
                    }
                    let occ_crop = ctx
                        .registry
                        .get_or_create_occ(OccKey::new(crop_id.clone(), day));
                    let occ_land = ctx.registry.get_or_create_occ_l(OccLKey::new(
                        land_id.clone(),
                        crop_id.clone(),
                        day,
                    ));
                    ctx.push(constraint!(occ_land >= occ_crop - (1.0 - z)));
                    ctx.push(constraint!(occ_land <= occ_crop + (1.0 - z)));
                }
            }
        }
        Ok(())
    }
}
