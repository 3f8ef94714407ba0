//! Single-stage solve: hands an accumulated problem to HiGHS and extracts
//! variable values.
//!
//! `good_lp`'s default backend (Clarabel) only solves continuous problems;
//! this model needs integer/boolean variables (`z`, `r`, `a`, `u`, `occ`,
//! `use`), so the workspace pins the `highs` feature instead. HiGHS also
//! exposes a wall-clock time limit, which the lexicographic planner needs to
//! keep a multi-stage solve within its overall budget.

use std::collections::HashMap;
use std::time::Duration;

use good_lp::{
    solvers::highs::{highs, HighsModelStatus},
    Constraint, Expression, ProblemVariables, Solution as GoodLpSolution, SolverModel, Variable,
};

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// Where a stage's solve landed, mapped from HiGHS's termination status.
/// `Infeasible`/`ModelInvalid` never reach here as a `SolveStatus` - they
/// surface as `Err(ModelError::Infeasible)` / `Err(ModelError::ModelInvalid)`
/// instead, since there's no solution to extract values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The solver proved this objective value is optimal.
    Optimal,
    /// A solution was found but the solver stopped (most often the stage's
    /// time limit) before proving optimality.
    Feasible,
}

/// The result of solving one lexicographic stage: the objective value
/// reached and the values of every variable the caller asked to extract.
/// The planner locks `objective_value` into a bound for the next stage and
/// reads `values` to build the final plan once the last stage completes.
pub struct StageSolution {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub values: HashMap<Variable, f64>,
}

/// Builds and solves one stage's problem: `vars` and `constraints` are the
/// full accumulated model (every prior stage's lock constraints included),
/// `objective` is this stage's expression, and `variables_of_interest` is
/// the set this stage (or a later one) needs extracted afterward.
pub fn solve_stage(
    vars: ProblemVariables,
    constraints: Vec<Constraint>,
    objective: Expression,
    sense: Sense,
    variables_of_interest: &[Variable],
    time_limit: Duration,
) -> ModelResult<StageSolution> {
    let unsolved = match sense {
        Sense::Maximize => vars.maximise(objective.clone()),
        Sense::Minimize => vars.minimise(objective.clone()),
    };
    let mut problem = unsolved.using(highs);
    problem.set_time_limit(time_limit.as_secs_f64());
    let problem = constraints.into_iter().fold(problem, |p, c| p.with(c));

    let solution = problem.solve().map_err(classify_resolution_error)?;

    let status = match solution.status() {
        HighsModelStatus::Optimal => SolveStatus::Optimal,
        _ => SolveStatus::Feasible,
    };

    let objective_value = solution.eval(&objective);
    let values = variables_of_interest
        .iter()
        .map(|&v| (v, solution.value(v)))
        .collect();

    Ok(StageSolution {
        status,
        objective_value,
        values,
    })
}

/// Maps a `good_lp` resolution failure onto this crate's error taxonomy.
/// `Infeasible`/`Unbounded` are genuine model-shape problems with a proven
/// cause; anything else (most often HiGHS stopping at its time limit without
/// a usable dual proof) surfaces as `Unknown` rather than being folded into
/// `Infeasible`, so a stage timeout and a truly infeasible model are never
/// confused. A message naming the model itself as malformed is reported as
/// `ModelInvalid` instead of `Unknown`.
fn classify_resolution_error(err: good_lp::ResolutionError) -> ModelError {
    match err {
        good_lp::ResolutionError::Infeasible => ModelError::Infeasible,
        good_lp::ResolutionError::Unbounded => ModelError::Unbounded,
        other => {
            let message = other.to_string();
            if message.to_lowercase().contains("invalid") {
                ModelError::ModelInvalid(message)
            } else {
                ModelError::Unknown(message)
            }
        }
    }
}

/// A box constraint pinning `var` within `tolerance` of `value`, used to hint
/// a later stage's solve toward an earlier stage's solution without a
/// portable MIP warm-start API. `good_lp`'s `SolverModel` trait exposes no
/// warm-start hook, so hints are plain linear constraints instead.
pub fn hint_constraint(var: Variable, value: f64, tolerance: f64) -> Constraint {
    use good_lp::constraint;
    constraint!(var >= value - tolerance)
}

pub fn hint_constraint_upper(var: Variable, value: f64, tolerance: f64) -> Constraint {
    use good_lp::constraint;
    constraint!(var <= value + tolerance)
}

/// A lower-bound lock on a maximize-sense stage's objective: later stages
/// must not give back more than `tolerance` of the fraction reached.
pub fn lock_lower_bound(value: f64, tolerance: f64) -> f64 {
    (value * (1.0 - tolerance)).floor()
}

/// An upper-bound lock on a minimize-sense stage's objective, mirroring
/// [`lock_lower_bound`].
pub fn lock_upper_bound(value: f64, tolerance: f64) -> f64 {
    (value * (1.0 + tolerance)).ceil()
}
