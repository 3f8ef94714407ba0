//! The `Constraint` trait and a name-keyed set of which constraints a
//! planning run should apply.
//!
//! Grounded on the formulation/backend registry pattern used to dispatch
//! power-flow solvers by id: constraints here are looked up and applied by
//! name rather than hard-wired into the builder, so a caller can disable one
//! (e.g. to debug infeasibility) without touching the others.

use std::collections::HashMap;

use farmplan_core::FarmResult;
use farmplan_model::ModelContext;

/// One schedulable rule over the model. `apply` mutates `ctx` in place,
/// pushing whatever `good_lp` constraints (and any variables it needs) it
/// requires; it never returns them, since later constraints in the same set
/// may need to look up variables this one created.
pub trait Constraint {
    fn name(&self) -> &'static str;
    fn apply(&self, ctx: &mut ModelContext) -> FarmResult<()>;
}

/// The full, ordered set of constraints a stage applies. Order matters:
/// several constraints (labor, roles) create `r`/`assign` variables lazily
/// and expect earlier constraints to have already created the ones they
/// depend on only when those constraints run first, so [`ConstraintSet::standard`]
/// fixes a safe order and [`ConstraintSet::apply_all`] always honors it.
pub struct ConstraintSet {
    constraints: Vec<Box<dyn Constraint>>,
    enabled: HashMap<&'static str, bool>,
}

impl ConstraintSet {
    /// Every constraint this crate implements, in an order that satisfies
    /// every inter-constraint variable dependency.
    pub fn standard() -> Self {
        let constraints: Vec<Box<dyn Constraint>> = vec![
            Box::new(crate::land_capacity::LandCapacityConstraint),
            Box::new(crate::link_area_use::LinkAreaUseConstraint),
            Box::new(crate::events_window::EventsWindowConstraint),
            Box::new(crate::labor::LaborConstraint),
            Box::new(crate::roles::RolesConstraint),
            Box::new(crate::resources::ResourcesConstraint),
            Box::new(crate::hold_area::HoldAreaConstraint),
            Box::new(crate::fixed_area::FixedAreaConstraint),
            Box::new(crate::area_bounds::AreaBoundsConstraint),
            Box::new(crate::idle::IdleConstraint),
            Box::new(crate::occ_equalize::OccEqualizeConstraint),
        ];
        let enabled = constraints.iter().map(|c| (c.name(), true)).collect();
        Self {
            constraints,
            enabled,
        }
    }

    pub fn disable(&mut self, name: &'static str) {
        self.enabled.insert(name, false);
    }

    pub fn apply_all(&self, ctx: &mut ModelContext) -> FarmResult<()> {
        for constraint in &self.constraints {
            if self.enabled.get(constraint.name()).copied().unwrap_or(true) {
                tracing::debug!(constraint = constraint.name(), "applying constraint");
                constraint.apply(ctx)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_is_nonempty() {
        assert!(!ConstraintSet::standard().constraints.is_empty());
    }

    #[test]
    fn disabled_constraint_is_skipped() {
        let mut set = ConstraintSet::standard();
        set.disable("land_capacity");
        assert_eq!(set.enabled.get("land_capacity"), Some(&false));
    }
}
