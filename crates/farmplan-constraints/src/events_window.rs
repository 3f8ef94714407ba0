//! Creates `r[e,t]` (event `e` active on day `t`) and restricts it to the
//! event's allowed window, its minimum recurrence gap, and any lag relative
//! to a preceding event. Also derives crop- and land-level occupancy
//! (`occ[c,t]`, `occ_l[l,c,t]`) from which events are active, and forces
//! land-level occupancy to zero across a land's blocked-day spans.

use std::collections::BTreeSet;

use farmplan_core::FarmResult;
use farmplan_model::keys::{OccKey, OccLKey, RKey};
use farmplan_model::ModelContext;
use good_lp::{constraint, Expression};

use crate::registry::Constraint;

pub struct EventsWindowConstraint;

impl Constraint for EventsWindowConstraint {
    fn name(&self) -> &'static str {
        "events_window"
    }

    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let event_ids: Vec<String> = ctx.plan.events.iter().map(|e| e.id.clone()).collect();

        for event_id in &event_ids {
            let allowed = ctx.event_days(event_id).clone();
            for day in 1..=num_days {
                let r = ctx.registry.get_or_create_r(RKey::new(event_id.clone(), day));
                if !allowed.contains(&day) {
                    ctx.push(constraint!(r <= 0));
                }
            }
        }

        for event_id in &event_ids {
            let event = ctx.event(event_id).cloned().expect("event_id from plan.events");
            if let Some(freq) = event.frequency_days {
                if freq > 1 {
                    for t in 1..=num_days {
                        let window_end = num_days.min(t + freq - 1);
                        if window_end <= t {
                            continue;
                        }
                        let window: Expression = (t..=window_end)
                            .map(|tau| ctx.registry.get_or_create_r(RKey::new(event_id.clone(), tau)))
                            .sum();
                        ctx.push(constraint!(window <= 1));
                    }
                }
            }
        }

        for event_id in &event_ids {
            let event = ctx.event(event_id).cloned().expect("event_id from plan.events");
            let (Some(pred), true) = (
                event.preceding_event_id.clone(),
                event.lag_min_days.is_some() || event.lag_max_days.is_some(),
            ) else {
                continue;
            };
            let lag_min = event.lag_min_days.unwrap_or(0);
            let lag_max = event.lag_max_days.unwrap_or(lag_min);

            for t in 1..=num_days {
                let rt = ctx.registry.get_or_create_r(RKey::new(event_id.clone(), t));
                if lag_min > 0 && (t as i64 - lag_min as i64) < 1 {
                    ctx.push(constraint!(rt <= 0));
                    continue;
                }
                let from_t = 1.max(t.saturating_sub(lag_max));
                let to_t = t.saturating_sub(lag_min);
                if to_t < from_t || to_t == 0 {
                    ctx.push(constraint!(rt <= 0));
                    continue;
                }

                let preds: Expression = (from_t..=to_t)
                    .map(|tau| ctx.registry.get_or_create_r(RKey::new(pred.clone(), tau)))
                    .sum();
                ctx.push(constraint!(rt <= preds));

                if lag_min > 0 {
                    let recent_from = 1.max(t.saturating_sub(lag_min - 1));
                    for tau in recent_from..=t {
                        let pvar = ctx.registry.get_or_create_r(RKey::new(pred.clone(), tau));
                        ctx.push(constraint!(rt + pvar <= 1));
                    }
                }
            }
        }

        self.derive_occupancy(ctx)?;
        self.enforce_blocked_continuity(ctx)?;
        Ok(())
    }
}

impl EventsWindowConstraint {
    // `use_any`/`prefix`/`suffix` below are internal booleans, not real
    // per-crop occupancy; they're keyed through the same `occ` map under a
    // suffixed crop id (`__use_any` etc.) purely to reuse its lazy-creation
    // path, not because they mean "crop occupies land".
    fn derive_occupancy(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let crop_ids: Vec<String> = ctx.plan.crops.iter().map(|c| c.id.clone()).collect();
        let land_ids: Vec<String> = ctx.plan.lands.iter().map(|l| l.id.clone()).collect();

        for crop_id in &crop_ids {
            let use_event_ids: Vec<String> = ctx
                .plan
                .events
                .iter()
                .filter(|e| e.crop_id == *crop_id && e.uses_land)
                .map(|e| e.id.clone())
                .collect();

            for day in 1..=num_days {
                ctx.registry
                    .get_or_create_occ(OccKey::new(crop_id.clone(), day));
            }

            if use_event_ids.is_empty() {
                for day in 1..=num_days {
                    let occ = ctx
                        .registry
                        .get_or_create_occ(OccKey::new(crop_id.clone(), day));
                    ctx.push(constraint!(occ <= 0));
                }
                continue;
            }

            let mut use_any_by_day = Vec::with_capacity(num_days as usize);
            for day in 1..=num_days {
                let terms: Vec<_> = use_event_ids
                    .iter()
                    .map(|eid| ctx.registry.get_or_create_r(RKey::new(eid.clone(), day)))
                    .collect();
                let use_any = ctx
                    .registry
                    .get_or_create_occ(OccKey::new(format!("{crop_id}__use_any"), day));
                for &term in &terms {
                    ctx.push(constraint!(term <= use_any));
                }
                let sum_terms: Expression = terms.iter().copied().sum();
                ctx.push(constraint!(sum_terms.clone() >= use_any));
                ctx.push(constraint!(sum_terms <= (terms.len() as f64) * use_any));
                use_any_by_day.push(use_any);
            }

            let mut prefix_by_day = Vec::with_capacity(num_days as usize);
            for (i, day) in (1..=num_days).enumerate() {
                let prefix = ctx
                    .registry
                    .get_or_create_occ(OccKey::new(format!("{crop_id}__prefix"), day));
                if i == 0 {
                    ctx.push(constraint!(prefix == use_any_by_day[0]));
                } else {
                    let prev = prefix_by_day[i - 1];
                    ctx.push(constraint!(prefix >= prev));
                    ctx.push(constraint!(prefix >= use_any_by_day[i]));
                    ctx.push(constraint!(prefix <= prev + use_any_by_day[i]));
                }
                prefix_by_day.push(prefix);
            }

            let mut suffix_by_day = vec![None; num_days as usize];
            for i in (0..num_days as usize).rev() {
                let day = (i + 1) as u32;
                let suffix = ctx
                    .registry
                    .get_or_create_occ(OccKey::new(format!("{crop_id}__suffix"), day));
                if i == num_days as usize - 1 {
                    ctx.push(constraint!(suffix == use_any_by_day[i]));
                } else {
                    let next = suffix_by_day[i + 1].expect("later suffix already computed");
                    ctx.push(constraint!(suffix >= next));
                    ctx.push(constraint!(suffix >= use_any_by_day[i]));
                    ctx.push(constraint!(suffix <= next + use_any_by_day[i]));
                }
                suffix_by_day[i] = Some(suffix);
            }

            let mut land_occ_by_day: Vec<Vec<_>> = vec![Vec::new(); num_days as usize];
            for land_id in &land_ids {
                for day in 1..=num_days {
                    let occ_l = ctx
                        .registry
                        .get_or_create_occ_l(OccLKey::new(land_id.clone(), crop_id.clone(), day));
                    let occ = ctx
                        .registry
                        .get_or_create_occ(OccKey::new(crop_id.clone(), day));
                    ctx.push(constraint!(occ_l <= occ));
                    land_occ_by_day[(day - 1) as usize].push(occ_l);
                }
            }

            for (i, day) in (1..=num_days).enumerate() {
                let occ = ctx
                    .registry
                    .get_or_create_occ(OccKey::new(crop_id.clone(), day));
                let prefix = prefix_by_day[i];
                let suffix = suffix_by_day[i].unwrap();
                ctx.push(constraint!(occ <= prefix));
                ctx.push(constraint!(occ <= suffix));
                ctx.push(constraint!(occ >= prefix + suffix - 1.0));

                let vars_at_day = &land_occ_by_day[i];
                if vars_at_day.is_empty() {
                    ctx.push(constraint!(occ <= 0));
                } else {
                    let sum: Expression = vars_at_day.iter().copied().sum();
                    ctx.push(constraint!(occ <= sum));
                }
            }
        }
        Ok(())
    }

    fn enforce_blocked_continuity(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        let num_days = ctx.plan.horizon.num_days;
        let crop_ids: Vec<String> = ctx.plan.crops.iter().map(|c| c.id.clone()).collect();
        let lands: Vec<(String, BTreeSet<u32>)> = ctx
            .plan
            .lands
            .iter()
            .map(|l| (l.id.clone(), l.blocked_days.clone().unwrap_or_default()))
            .collect();

        for (land_id, blocked) in &lands {
            if blocked.is_empty() {
                continue;
            }
            let segments = contiguous_segments(blocked, num_days);
            for crop_id in &crop_ids {
                for &(start, end) in &segments {
                    for day in start..=end {
                        let occ_l = ctx.registry.get_or_create_occ_l(OccLKey::new(
                            land_id.clone(),
                            crop_id.clone(),
                            day,
                        ));
                        ctx.push(constraint!(occ_l <= 0));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Collapses a set of blocked days into maximal contiguous `[start, end]`
/// runs, clipped to the horizon.
fn contiguous_segments(blocked: &BTreeSet<u32>, num_days: u32) -> Vec<(u32, u32)> {
    let mut segments = Vec::new();
    let mut start = None;
    let mut prev = None;
    for &day in blocked {
        if day < 1 || day > num_days {
            continue;
        }
        match (start, prev) {
            (None, _) => {
                start = Some(day);
                prev = Some(day);
            }
            (Some(_), Some(p)) if day == p + 1 => {
                prev = Some(day);
            }
            (Some(s), Some(p)) => {
                segments.push((s, p));
                start = Some(day);
                prev = Some(day);
            }
            _ => unreachable!(),
        }
    }
    if let (Some(s), Some(p)) = (start, prev) {
        segments.push((s, p));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_blocked_day_is_its_own_segment() {
        let blocked: BTreeSet<u32> = [5].into_iter().collect();
        assert_eq!(contiguous_segments(&blocked, 10), vec![(5, 5)]);
    }

    #[test]
    fn consecutive_blocked_days_merge() {
        let blocked: BTreeSet<u32> = [5, 6, 7, 9].into_iter().collect();
        assert_eq!(contiguous_segments(&blocked, 10), vec![(5, 7), (9, 9)]);
    }
}
