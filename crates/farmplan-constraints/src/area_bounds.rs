//! Per-day `Σ_l x[l,c,t] >= min_area` (gated by `occ[c,t]`, so an idle day
//! doesn't force area in) and `Σ_l x[l,c,t] <= max_area` (always), for every
//! day a crop's window admits an `x[l,c,t]` variable.

use farmplan_core::FarmResult;
use farmplan_model::keys::{OccKey, XKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct AreaBoundsConstraint;

impl Constraint for AreaBoundsConstraint {
    fn name(&self) -> &'static str {
        "area_bounds"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let lands: Vec<(String, f64)> = ctx
            .plan
            .lands
            .iter()
            .map(|l| (l.id.clone(), l.area))
            .collect();
        let bounds = ctx.plan.crop_area_bounds.clone();

        for bound in &bounds {
            if ctx.crop(&bound.crop_id).is_none() {
                continue;
            }
            for day in ctx.x_days(&bound.crop_id) {
                let terms: Vec<_> = lands
                    .iter()
                    .map(|(land_id, area)| {
                        ctx.registry.get_or_create_x(
                            XKey::new(land_id.clone(), bound.crop_id.clone(), day),
                            *area,
                        )
                    })
                    .collect();
                if terms.is_empty() {
                    continue;
                }
                let total: Expression = terms.into_iter().sum();

                if let Some(min_area) = bound.min_area {
                    let occ = ctx
                        .registry
                        .get_or_create_occ(OccKey::new(bound.crop_id.clone(), day));
                    ctx.push(constraint!(total.clone() >= min_area * occ));
                }
                if let Some(max_area) = bound.max_area {
                    ctx.push(constraint!(total <= max_area));
                }
            }
        }
        Ok(())
    }
}
