//! # farmplan-model
//!
//! The `good_lp` model-building layer: variable keys, the lazy variable
//! registry, the per-stage build context, and the single-stage solver
//! driver. Constraint and objective content lives in `farmplan-constraints`
//! and `farmplan-objectives`; this crate only owns the mechanics of turning
//! a [`farmplan_core::model::Plan`] into variables and a solvable problem.

pub mod builder;
pub mod error;
pub mod keys;
pub mod registry;
pub mod solver;
pub mod windows;

pub use builder::ModelContext;
pub use error::{ModelError, ModelResult};
pub use registry::{VariableMaps, VariableRegistry};
pub use solver::{solve_stage, Sense, SolveStatus, StageSolution};
