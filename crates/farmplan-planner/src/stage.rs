//! Lexicographic stage sequencing (§4.5): runs an ordered list of named
//! stages, locking each completed stage's objective within its tolerance
//! before the next stage's model is built. Every stage rebuilds its model
//! from scratch - fresh [`ModelContext`], fresh [`ConstraintSet`] - and
//! reapplies every prior stage's lock by rebuilding that stage's expression
//! in the new context, matching "no shared mutable state between stages"
//! (§9).

use std::collections::HashMap;
use std::time::Duration;

use farmplan_constraints::ConstraintSet;
use farmplan_core::model::Plan;
use farmplan_model::keys::{HKey, IdleKey, XKey};
use farmplan_model::{solver, ModelContext, ModelResult, Sense, VariableMaps};
use farmplan_objectives::Stage;
use good_lp::Variable;
use tokio_util::sync::CancellationToken;

/// A completed stage's name, sense, and optimal objective value, carried
/// forward only as plain data (per §9, no shared mutable state).
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub name: String,
    pub sense: Sense,
    pub objective_value: f64,
}

/// `{variable-key → value}` snapshots of a completed stage's solution, used
/// to seed the next stage's solve via bounds-tightening hints (§4.4's
/// approximation of a true MIP warm start).
#[derive(Debug, Clone, Default)]
pub struct HintSet {
    pub x: HashMap<XKey, f64>,
    pub h: HashMap<HKey, f64>,
    pub idle: HashMap<IdleKey, f64>,
}

impl HintSet {
    fn from_solution(maps: &VariableMaps, values: &HashMap<Variable, f64>) -> Self {
        let collect = |key: &Variable| values.get(key).copied();
        Self {
            x: maps
                .x
                .iter()
                .filter_map(|(k, v)| collect(v).map(|val| (k.clone(), val)))
                .collect(),
            h: maps
                .h
                .iter()
                .filter_map(|(k, v)| collect(v).map(|val| (k.clone(), val)))
                .collect(),
            idle: maps
                .idle
                .iter()
                .filter_map(|(k, v)| collect(v).map(|val| (k.clone(), val)))
                .collect(),
        }
    }
}

fn hint_slack(value: f64) -> f64 {
    (value.abs() * 0.1).max(0.01)
}

fn apply_hints(ctx: &mut ModelContext, hints: &HintSet) {
    let x_pairs: Vec<(Variable, f64)> = ctx
        .registry
        .x_iter()
        .filter_map(|(k, v)| hints.x.get(k).map(|val| (*v, *val)))
        .collect();
    let h_pairs: Vec<(Variable, f64)> = ctx
        .registry
        .h_iter()
        .filter_map(|(k, v)| hints.h.get(k).map(|val| (*v, *val)))
        .collect();
    let idle_pairs: Vec<(Variable, f64)> = ctx
        .registry
        .idle_iter()
        .filter_map(|(k, v)| hints.idle.get(k).map(|val| (*v, *val)))
        .collect();

    for (var, value) in x_pairs.into_iter().chain(h_pairs).chain(idle_pairs) {
        let slack = hint_slack(value);
        ctx.push(solver::hint_constraint(var, value, slack));
        ctx.push(solver::hint_constraint_upper(var, value, slack));
    }
}

/// Final outcome of running a stage sequence to completion or failure.
pub enum StageRunOutcome {
    /// Every stage solved to `{OPTIMAL, FEASIBLE}`.
    Success {
        records: Vec<StageRecord>,
        maps: VariableMaps,
        values: HashMap<Variable, f64>,
    },

    /// Stage `stage` (1-indexed in `records.len() + 1`) had no feasible
    /// solution. `records`/`last_feasible` hold the prior stages' results,
    /// per "infeasibility at stage k>1 yields the last feasible stage's
    /// solution" (§4.5).
    Infeasible {
        stage: String,
        reason: String,
        records: Vec<StageRecord>,
        last_feasible: Option<(VariableMaps, HashMap<Variable, f64>)>,
    },

    /// The cancellation token was observed at a stage boundary before the
    /// sequence completed.
    Cancelled { records: Vec<StageRecord> },

    /// Stage `stage` stopped (most often its time limit) without a
    /// conclusive `{OPTIMAL, FEASIBLE, INFEASIBLE}` status - distinct from
    /// `Infeasible` because the model itself was never proven to have no
    /// solution, only that the solver didn't find or confirm one in time.
    Unknown {
        stage: String,
        reason: String,
        records: Vec<StageRecord>,
        last_feasible: Option<(VariableMaps, HashMap<Variable, f64>)>,
    },
}

fn validate_tolerance(name: &str, value: f64) -> ModelResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(farmplan_model::ModelError::InvalidTolerance {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

/// Run `stages` in order against `plan`, locking each completed stage's
/// objective within `tolerances.get(name).copied().unwrap_or(default_tolerance)`.
pub fn run_stages(
    plan: &Plan,
    stages: &[Stage],
    tolerances: &HashMap<String, f64>,
    default_tolerance: f64,
    time_limit: Duration,
    cancel: Option<&CancellationToken>,
    mut on_progress: impl FnMut(f32, &str),
) -> ModelResult<StageRunOutcome> {
    validate_tolerance("default_tolerance", default_tolerance)?;
    for (name, value) in tolerances {
        validate_tolerance(name, *value)?;
    }

    let mut records: Vec<StageRecord> = Vec::new();
    let mut last_feasible: Option<(VariableMaps, HashMap<Variable, f64>)> = None;
    let mut last_hints: Option<HintSet> = None;

    for (i, stage) in stages.iter().enumerate() {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Ok(StageRunOutcome::Cancelled { records });
        }

        let fraction = i as f32 / stages.len().max(1) as f32;
        on_progress(fraction, stage.name());
        tracing::info!(stage = stage.name(), sense = ?stage.sense(), "solving stage");

        let mut ctx = ModelContext::new(plan);
        ConstraintSet::standard()
            .apply_all(&mut ctx)
            .map_err(farmplan_model::ModelError::Plan)?;

        if let Some(hints) = &last_hints {
            apply_hints(&mut ctx, hints);
        }

        for record in &records {
            let prior_stage = Stage::parse(&record.name)
                .unwrap_or_else(|| panic!("unknown prior stage name {}", record.name));
            let expr = prior_stage.build(&mut ctx);
            let bound = match record.sense {
                Sense::Maximize => {
                    let tol = tolerances
                        .get(&record.name)
                        .copied()
                        .unwrap_or(default_tolerance);
                    solver::lock_lower_bound(record.objective_value, tol)
                }
                Sense::Minimize => {
                    let tol = tolerances
                        .get(&record.name)
                        .copied()
                        .unwrap_or(default_tolerance);
                    solver::lock_upper_bound(record.objective_value, tol)
                }
            };
            let constraint = match record.sense {
                Sense::Maximize => good_lp::constraint!(expr >= bound),
                Sense::Minimize => good_lp::constraint!(expr <= bound),
            };
            ctx.push(constraint);
        }

        let objective = stage.build(&mut ctx);
        let sense = stage.sense();

        let variables_of_interest = ctx.registry.all_variables();
        let (registry, constraints) = ctx.into_problem();
        let (vars, maps) = registry.into_parts();

        let solution = solver::solve_stage(
            vars,
            constraints,
            objective,
            sense,
            &variables_of_interest,
            time_limit,
        );

        let solution = match solution {
            Ok(s) => s,
            Err(farmplan_model::ModelError::Infeasible)
            | Err(farmplan_model::ModelError::Unbounded)
            | Err(farmplan_model::ModelError::ModelInvalid(_)) => {
                return Ok(StageRunOutcome::Infeasible {
                    stage: stage.name().to_string(),
                    reason: "solver reported no feasible solution".to_string(),
                    records,
                    last_feasible,
                });
            }
            Err(farmplan_model::ModelError::Unknown(reason)) => {
                return Ok(StageRunOutcome::Unknown {
                    stage: stage.name().to_string(),
                    reason,
                    records,
                    last_feasible,
                });
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            stage = stage.name(),
            sense = ?sense,
            status = ?solution.status,
            objective = solution.objective_value,
            "stage solved"
        );

        last_hints = Some(HintSet::from_solution(&maps, &solution.values));
        last_feasible = Some((maps.clone(), solution.values.clone()));

        records.push(StageRecord {
            name: stage.name().to_string(),
            sense,
            objective_value: solution.objective_value,
        });
    }

    on_progress(1.0, "done");

    let (maps, values) = last_feasible.expect("at least one stage must run");
    Ok(StageRunOutcome::Success {
        records,
        maps,
        values,
    })
}
