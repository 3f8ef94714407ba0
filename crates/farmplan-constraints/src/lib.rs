//! # farmplan-constraints
//!
//! Each constraint module ports one rule from the scheduling domain into
//! `good_lp` linear constraints over the shared [`farmplan_model::ModelContext`].
//!
//! The source this was ported from expressed several of these rules as
//! reified constraints (`OnlyEnforceIf`) over a CP-SAT boolean. `good_lp` has
//! no reification primitive, so every such rule is rewritten here as a
//! big-M pair: `expr <= M * indicator` to force `expr == 0` when the
//! indicator is off, and `expr >= indicator` (or `expr >= threshold *
//! indicator`) to force the real bound when it's on. Where the indicator and
//! both sides of the implication are already binary, `M = 1`.

pub mod area_bounds;
pub mod events_window;
pub mod fixed_area;
pub mod hold_area;
pub mod idle;
pub mod labor;
pub mod land_capacity;
pub mod link_area_use;
pub mod occ_equalize;
pub mod registry;
pub mod resources;
pub mod roles;

pub use registry::{Constraint, ConstraintSet};
