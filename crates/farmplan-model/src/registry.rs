//! Lazy, sparse creation of decision variables, keyed by the tuple types in
//! [`crate::keys`].
//!
//! Only variables a constraint or objective actually references get created;
//! the windows in [`crate::windows`] keep that set small. Every `get_or_create_*`
//! method takes `&mut self` and either returns the existing `Variable` for a
//! key or allocates a fresh one in the wrapped [`ProblemVariables`] - never via
//! `entry().or_insert_with()`, since the insert closure would need a second
//! mutable borrow of the `ProblemVariables` field while already borrowing the
//! map field.

use std::collections::HashMap;

use good_lp::{variable, ProblemVariables, Variable};

use crate::keys::{AKey, HKey, IdleKey, OccKey, OccLKey, RKey, UKey, UseKey, XKey, ZKey};

/// Continuous area variable `x[land, crop, day]`, `>= 0`.
/// Boolean indicator `z[land, crop]`: land ever hosts crop over the horizon.
/// Boolean indicator `r[event, day]`: event active on day.
/// Continuous labor-hours variable `h[worker, event, day]`, `>= 0`.
/// Boolean assignment `a[worker, event, day]`: worker assigned to event on day.
/// Continuous resource-hours variable `u[resource, event, day]`, `>= 0`,
/// bounded by the resource's daily capacity.
/// Boolean crop-occupancy indicator `occ[crop, day]`: crop occupies any land.
/// Boolean per-land occupancy indicator `occ_l[land, crop, day]`.
/// Boolean crop-use indicator `use[crop]`: crop planted anywhere, ever.
///
/// `x`, `h`, and `idle` stay real-valued rather than pre-scaled to the
/// integer units in `farmplan_core::scale`: unlike the CP-SAT model this was
/// ported from, HiGHS accepts real-valued bounds and coefficients directly,
/// so scaling only matters at the domain-model boundary (serialization,
/// exact-fraction labor accounting), not in the variables themselves.
#[derive(Default)]
pub struct VariableRegistry {
    vars: ProblemVariables,
    x: HashMap<XKey, Variable>,
    z: HashMap<ZKey, Variable>,
    r: HashMap<RKey, Variable>,
    h: HashMap<HKey, Variable>,
    a: HashMap<AKey, Variable>,
    u: HashMap<UKey, Variable>,
    occ: HashMap<OccKey, Variable>,
    occ_l: HashMap<OccLKey, Variable>,
    use_: HashMap<UseKey, Variable>,
    idle: HashMap<IdleKey, Variable>,
}

/// The per-family maps split out of a [`VariableRegistry`] once its
/// [`ProblemVariables`] half has been consumed to build a solvable problem.
/// Solution extraction only ever needs these maps, not the builder.
#[derive(Default, Clone)]
pub struct VariableMaps {
    pub x: HashMap<XKey, Variable>,
    pub z: HashMap<ZKey, Variable>,
    pub r: HashMap<RKey, Variable>,
    pub h: HashMap<HKey, Variable>,
    pub a: HashMap<AKey, Variable>,
    pub u: HashMap<UKey, Variable>,
    pub occ: HashMap<OccKey, Variable>,
    pub occ_l: HashMap<OccLKey, Variable>,
    pub use_: HashMap<UseKey, Variable>,
    pub idle: HashMap<IdleKey, Variable>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self {
            vars: ProblemVariables::new(),
            ..Default::default()
        }
    }

    pub fn get_or_create_x(&mut self, key: XKey, max_area: f64) -> Variable {
        if let Some(v) = self.x.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().min(0.0).max(max_area));
        self.x.insert(key, v);
        v
    }

    pub fn get_or_create_z(&mut self, key: ZKey) -> Variable {
        if let Some(v) = self.z.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().binary());
        self.z.insert(key, v);
        v
    }

    pub fn get_or_create_r(&mut self, key: RKey) -> Variable {
        if let Some(v) = self.r.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().binary());
        self.r.insert(key, v);
        v
    }

    pub fn get_or_create_h(&mut self, key: HKey, max_hours: f64) -> Variable {
        if let Some(v) = self.h.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().min(0.0).max(max_hours));
        self.h.insert(key, v);
        v
    }

    pub fn get_or_create_a(&mut self, key: AKey) -> Variable {
        if let Some(v) = self.a.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().binary());
        self.a.insert(key, v);
        v
    }

    pub fn get_or_create_u(&mut self, key: UKey, max_hours: f64) -> Variable {
        if let Some(v) = self.u.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().min(0.0).max(max_hours));
        self.u.insert(key, v);
        v
    }

    pub fn get_or_create_occ(&mut self, key: OccKey) -> Variable {
        if let Some(v) = self.occ.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().binary());
        self.occ.insert(key, v);
        v
    }

    pub fn get_or_create_occ_l(&mut self, key: OccLKey) -> Variable {
        if let Some(v) = self.occ_l.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().binary());
        self.occ_l.insert(key, v);
        v
    }

    pub fn get_or_create_use(&mut self, key: UseKey) -> Variable {
        if let Some(v) = self.use_.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().binary());
        self.use_.insert(key, v);
        v
    }

    pub fn get_or_create_idle(&mut self, key: IdleKey, max_area: f64) -> Variable {
        if let Some(v) = self.idle.get(&key) {
            return *v;
        }
        let v = self.vars.add(variable().min(0.0).max(max_area));
        self.idle.insert(key, v);
        v
    }

    pub fn all_z(&self) -> impl Iterator<Item = Variable> + '_ {
        self.z.values().copied()
    }

    pub fn all_h(&self) -> impl Iterator<Item = Variable> + '_ {
        self.h.values().copied()
    }

    pub fn all_idle(&self) -> impl Iterator<Item = Variable> + '_ {
        self.idle.values().copied()
    }

    pub fn all_use(&self) -> impl Iterator<Item = Variable> + '_ {
        self.use_.values().copied()
    }

    /// Every variable this registry has created, across all families.
    /// Used by the lexicographic planner to build the `variables_of_interest`
    /// extraction set each stage passes to [`crate::solve_stage`].
    pub fn all_variables(&self) -> Vec<Variable> {
        self.x
            .values()
            .chain(self.z.values())
            .chain(self.r.values())
            .chain(self.h.values())
            .chain(self.a.values())
            .chain(self.u.values())
            .chain(self.occ.values())
            .chain(self.occ_l.values())
            .chain(self.use_.values())
            .chain(self.idle.values())
            .copied()
            .collect()
    }

    pub fn lookup_x(&self, key: &XKey) -> Option<Variable> {
        self.x.get(key).copied()
    }

    pub fn lookup_h(&self, key: &HKey) -> Option<Variable> {
        self.h.get(key).copied()
    }

    /// Iterate the continuous families a cross-stage hint set can seed:
    /// `x`, `h`, and `idle`. Boolean families aren't hinted - a box
    /// constraint on a `{0,1}` variable is rarely a useful warm start.
    pub fn x_iter(&self) -> impl Iterator<Item = (&XKey, &Variable)> {
        self.x.iter()
    }

    pub fn h_iter(&self) -> impl Iterator<Item = (&HKey, &Variable)> {
        self.h.iter()
    }

    pub fn idle_iter(&self) -> impl Iterator<Item = (&IdleKey, &Variable)> {
        self.idle.iter()
    }

    /// Splits the registry into its raw [`ProblemVariables`] (consumed once
    /// to build the `good_lp` problem) and the key maps (kept for solution
    /// extraction after solving).
    pub fn into_parts(self) -> (ProblemVariables, VariableMaps) {
        let maps = VariableMaps {
            x: self.x,
            z: self.z,
            r: self.r,
            h: self.h,
            a: self.a,
            u: self.u,
            occ: self.occ,
            occ_l: self.occ_l,
            use_: self.use_,
            idle: self.idle,
        };
        (self.vars, maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_key_returns_same_variable() {
        let mut reg = VariableRegistry::new();
        let key = XKey::new("L1", "wheat", 3u32);
        let v1 = reg.get_or_create_x(key.clone(), 10.0);
        let v2 = reg.get_or_create_x(key, 10.0);
        assert_eq!(v1, v2);
    }

    #[test]
    fn distinct_keys_get_distinct_variables() {
        let mut reg = VariableRegistry::new();
        let v1 = reg.get_or_create_z(ZKey::new("L1", "wheat"));
        let v2 = reg.get_or_create_z(ZKey::new("L1", "barley"));
        assert_ne!(v1, v2);
    }

    #[test]
    fn into_parts_preserves_lookup() {
        let mut reg = VariableRegistry::new();
        let key = XKey::new("L1", "wheat", 1u32);
        let v = reg.get_or_create_x(key.clone(), 10.0);
        let (_vars, maps) = reg.into_parts();
        assert_eq!(maps.x[&key], v);
    }
}
