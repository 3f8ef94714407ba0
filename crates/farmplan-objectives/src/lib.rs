//! # farmplan-objectives
//!
//! Pure expression builders for the lexicographic planner's named stages.
//! Each builder reads whatever variables the constraint set already created
//! (creating a land/crop's representative area variable if nothing has
//! touched it yet) and returns a `good_lp` [`Expression`] plus the sense the
//! stage optimizes it in; it never mutates constraints.
//!
//! `dispersion` counts land/crop pairs ever used (`Σ z[l,c]`), minimized to
//! concentrate plantings onto as few pairs as possible. `diversity` counts
//! distinct crops ever planted anywhere (`Σ use[c]`), maximized to spread
//! the plan across more crops regardless of how many lands host each one -
//! a crop grown on five lands still counts once.

use farmplan_model::ModelContext;
use good_lp::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Profit,
    Dispersion,
    Labor,
    Idle,
    Diversity,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Profit => "profit",
            Stage::Dispersion => "dispersion",
            Stage::Labor => "labor",
            Stage::Idle => "idle",
            Stage::Diversity => "diversity",
        }
    }

    pub fn sense(self) -> farmplan_model::Sense {
        use farmplan_model::Sense;
        match self {
            Stage::Profit => Sense::Maximize,
            Stage::Dispersion => Sense::Minimize,
            Stage::Labor => Sense::Minimize,
            Stage::Idle => Sense::Minimize,
            Stage::Diversity => Sense::Maximize,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "profit" => Some(Stage::Profit),
            "dispersion" => Some(Stage::Dispersion),
            "labor" => Some(Stage::Labor),
            "idle" => Some(Stage::Idle),
            "diversity" => Some(Stage::Diversity),
            _ => None,
        }
    }

    pub fn build(self, ctx: &mut ModelContext) -> Expression {
        match self {
            Stage::Profit => build_profit(ctx),
            Stage::Dispersion => build_area_use_count(ctx),
            Stage::Diversity => build_crop_use_count(ctx),
            Stage::Labor => build_labor_hours(ctx),
            Stage::Idle => build_idle(ctx),
        }
    }
}

/// `Σ_{l,c} price[c] * x[l,c]`, using each crop's representative area
/// variable (see [`ModelContext::representative_x`]).
fn build_profit(ctx: &mut ModelContext) -> Expression {
    let land_ids: Vec<String> = ctx.plan.lands.iter().map(|l| l.id.clone()).collect();
    let crops: Vec<(String, f64)> = ctx
        .plan
        .crops
        .iter()
        .map(|c| (c.id.clone(), c.price_per_area.unwrap_or(0.0)))
        .collect();

    let mut expr = Expression::from(0.0);
    for (crop_id, price) in &crops {
        if *price == 0.0 {
            continue;
        }
        for land_id in &land_ids {
            let x = ctx.representative_x(land_id, crop_id);
            expr += *price * x;
        }
    }
    expr
}

/// `Σ_{l,c} z[l,c]`: the count of land/crop pairs ever used.
fn build_area_use_count(ctx: &mut ModelContext) -> Expression {
    ctx.registry.all_z().sum()
}

/// `Σ_c use[c]`: the count of crops planted anywhere, ever - each crop
/// counts once regardless of how many lands host it.
fn build_crop_use_count(ctx: &mut ModelContext) -> Expression {
    ctx.registry.all_use().sum()
}

/// `Σ_{w,e,t} h[w,e,t]`: total worker-hours spent across the whole plan.
fn build_labor_hours(ctx: &mut ModelContext) -> Expression {
    ctx.registry.all_h().sum()
}

/// `Σ_{l,t} idle[l,t]`: total unused land-days.
fn build_idle(ctx: &mut ModelContext) -> Expression {
    ctx.registry.all_idle().sum()
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
                price_per_area: Some(10.0),
            }],
            events: vec![],
            lands: vec![Land {
                id: "L1".into(),
                name: "Field 1".into(),
                area: 5.0,
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
    fn stage_names_round_trip() {
        for stage in [
            Stage::Profit,
            Stage::Dispersion,
            Stage::Labor,
            Stage::Idle,
            Stage::Diversity,
        ] {
            assert_eq!(Stage::parse(stage.name()), Some(stage));
        }
    }

    #[test]
    fn profit_expression_builds_without_panicking() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        let _expr = Stage::Profit.build(&mut ctx);
    }

    #[test]
    fn dispersion_counts_land_crop_pairs_not_crops() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        let _dispersion = Stage::Dispersion.build(&mut ctx);
    }

    #[test]
    fn diversity_counts_each_crops_use_flag_once() {
        let plan = plan();
        let mut ctx = ModelContext::new(&plan);
        ctx.registry
            .get_or_create_use(farmplan_model::keys::UseKey::new("wheat".to_string()));
        let _diversity = Stage::Diversity.build(&mut ctx);
        assert_eq!(ctx.registry.all_use().count(), 1);
    }
}
