//! Per-event labor hours: worker-hour variables `h[w,e,t]`, their link to
//! `r[e,t]` and `assign[w,e,t]`, the daily labor cap, the people-required
//! headcount, and the exact total-need equality over the horizon.
//!
//! The event-is-active indicator `r[e,t]` was reified against "any hours
//! worked today" in the source (`daily_sum >= 1 OnlyEnforceIf(r)`,
//! `daily_sum == 0 OnlyEnforceIf(r.Not())`). `good_lp` variables here are
//! real-valued, so the exact integer threshold doesn't carry over; the
//! big-M pair below keeps the same "zero work iff r=0" direction and treats
//! any strictly positive work as sufficient to license `r=1`.

use farmplan_core::scale::Rational;
use farmplan_core::FarmResult;
use farmplan_model::keys::{AKey, HKey, RKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

const WORK_EPSILON: f64 = 1e-6;

pub struct LaborConstraint;

impl Constraint for LaborConstraint {
    fn name(&self) -> &'static str {
        "labor"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let land_ids: Vec<String> = ctx.plan.lands.iter().map(|l| l.id.clone()).collect();
        let workers: Vec<(String, f64, std::collections::HashSet<u32>)> = ctx
            .plan
            .workers
            .iter()
            .map(|w| {
                (
                    w.id.clone(),
                    w.capacity_per_day,
                    w.blocked_days.clone().unwrap_or_default(),
                )
            })
            .collect();
        let events = ctx.plan.events.clone();

        for event in &events {
            let base_area_terms: Vec<_> = land_ids
                .iter()
                .map(|land_id| ctx.representative_x(land_id, &event.crop_id))
                .collect();
            let base_area_sum: Expression = base_area_terms.into_iter().sum();

            let labor_per_area = event.labor_total_per_area.unwrap_or(0.0);
            let rational = Rational::labor_per_area_unit(labor_per_area);
            let p = rational.numerator as f64;
            let q = rational.denominator as f64;

            let allowed_days = ctx.event_days(&event.id).clone();
            let mut horizon_hour_terms: Vec<_> = Vec::new();

            for &day in &allowed_days {
                let r = ctx.registry.get_or_create_r(RKey::new(event.id.clone(), day));

                let mut daily_terms = Vec::new();
                for (worker_id, capacity_per_day, blocked_days) in &workers {
                    if blocked_days.contains(&day) {
                        continue;
                    }
                    let h = ctx.registry.get_or_create_h(
                        HKey::new(worker_id.clone(), event.id.clone(), day),
                        *capacity_per_day,
                    );
                    let assign = ctx
                        .registry
                        .get_or_create_a(AKey::new(worker_id.clone(), event.id.clone(), day));

                    if *capacity_per_day > 0.0 {
                        ctx.push(constraint!(h <= *capacity_per_day * r));
                        ctx.push(constraint!(h <= *capacity_per_day * assign));
                    }
                    ctx.push(constraint!(assign <= r));
                    daily_terms.push(h);
                }

                if daily_terms.is_empty() {
                    ctx.push(constraint!(r <= 0));
                    continue;
                }

                let daily_sum: Expression = daily_terms.iter().copied().sum();
                let worker_cap_sum: f64 = workers
                    .iter()
                    .filter(|(_, _, blocked)| !blocked.contains(&day))
                    .map(|(_, cap, _)| *cap)
                    .sum();

                ctx.push(constraint!(daily_sum.clone() <= worker_cap_sum * r));
                ctx.push(constraint!(daily_sum.clone() >= WORK_EPSILON * r));

                if let Some(daily_cap) = event.labor_daily_cap {
                    ctx.push(constraint!(daily_sum <= daily_cap * r));
                }

                if let Some(required) = event.people_required {
                    if required > 0 {
                        let assigns: Vec<_> = workers
                            .iter()
                            .filter(|(_, _, blocked)| !blocked.contains(&day))
                            .map(|(worker_id, _, _)| {
                                ctx.registry.get_or_create_a(AKey::new(
                                    worker_id.clone(),
                                    event.id.clone(),
                                    day,
                                ))
                            })
                            .collect();
                        if !assigns.is_empty() {
                            let assign_sum: Expression = assigns.into_iter().sum();
                            ctx.push(constraint!(assign_sum >= (required as f64) * r));
                        }
                    }
                }

                horizon_hour_terms.extend(daily_terms);
            }

            if !horizon_hour_terms.is_empty() {
                let horizon_sum: Expression = horizon_hour_terms.into_iter().sum();
                ctx.push(constraint!(q * horizon_sum == p * base_area_sum));
            }
        }

        for (worker_id, capacity_per_day, blocked_days) in &workers {
            for day in 1..=num_days {
                if blocked_days.contains(&day) {
                    continue;
                }
                let day_terms: Vec<_> = events
                    .iter()
                    .filter_map(|event| {
                        ctx.registry
                            .lookup_h(&HKey::new(worker_id.clone(), event.id.clone(), day))
                    })
                    .collect();
                if day_terms.is_empty() {
                    continue;
                }
                let sum: Expression = day_terms.into_iter().sum();
                ctx.push(constraint!(sum <= *capacity_per_day));
            }
        }
        Ok(())
    }
}
