use crate::backend::machine::{ClassId, Machine};

use super::{GroupId, InterferenceGraph, RegisterGroup, RegisterGroups};

/// Per-group upper bounds on how many registers of the group's class its
/// still-active neighbours can block.
///
/// `raw[g][v]` is the pressure attributed to lattice vertex `v`: the worst-case
/// contribution of neighbours whose class sits at `v`, plus the contributions of
/// `v`'s children, each clipped to what the child can hold. `z[g]` sums the clipped
/// values of the roots.
#[derive(Clone, Debug)]
pub struct Pressure {
    raw: Vec<Vec<i64>>,
    z: Vec<i64>,
}

impl Pressure {
    pub fn new(machine: &Machine, groups: &RegisterGroups, graph: &InterferenceGraph) -> Pressure {
        let mut raw = Vec::with_capacity(groups.len());
        let mut z = Vec::with_capacity(groups.len());
        for group in groups.iter() {
            let neighbors: Vec<(ClassId, u32)> = graph
                .neighbors_of(group.id)
                .iter()
                .map(|&n| (groups.get(n).class, groups.get(n).num_registers))
                .collect();
            let values = raw_pressure(machine, group.class, &neighbors);
            z.push(total_pressure(machine, group.class, &values));
            log::trace!("{}: raw {:?} z {}", group.id, values, z[z.len() - 1]);
            raw.push(values);
        }
        Pressure { raw, z }
    }

    pub fn z(&self, group: GroupId) -> i64 {
        self.z[group.index()]
    }

    pub fn raw(&self, group: GroupId) -> &[i64] {
        &self.raw[group.index()]
    }

    /// How far the group is from being stackable. Non-positive means stackable.
    pub fn excess(&self, machine: &Machine, group: &RegisterGroup) -> i64 {
        self.z(group.id) + group.num_registers as i64 - machine.class(group.class).capacity() as i64
    }

    pub fn stackable(&self, machine: &Machine, group: &RegisterGroup) -> bool {
        self.excess(machine, group) <= 0
    }

    /// Removes the contributions of freshly stacked neighbours, given as
    /// `(class, register count)`, from the pressure of `group`.
    pub fn relieve(&mut self, machine: &Machine, group: &RegisterGroup, removed: &[(ClassId, u32)]) {
        let lattice = machine.lattice();
        let bound = machine.bound();
        let mut delta = vec![0i64; lattice.len()];
        for &(class, registers) in removed {
            delta[machine.class(class).vertex.index()] -= contribution(machine, group.class, class, registers);
        }
        let raw = &mut self.raw[group.id.index()];
        for &v in lattice.bottom_up() {
            let carried: i64 = lattice
                .vertex(v)
                .children
                .iter()
                .map(|&c| clip(delta[c.index()], bound.get(group.class, c) as i64, raw[c.index()]))
                .sum();
            delta[v.index()] += carried;
        }
        for (value, change) in raw.iter_mut().zip(&delta) {
            *value += change;
        }
        self.z[group.id.index()] = total_pressure(machine, group.class, raw);
    }
}

fn contribution(machine: &Machine, n: ClassId, c: ClassId, registers: u32) -> i64 {
    registers as i64 * machine.worst().worst(n, c) as i64
}

/// Pressure on class `n` from neighbours given as `(class, register count)`,
/// computed from scratch.
pub fn raw_pressure(machine: &Machine, n: ClassId, neighbors: &[(ClassId, u32)]) -> Vec<i64> {
    let lattice = machine.lattice();
    let mut values = vec![0i64; lattice.len()];
    for &(class, registers) in neighbors {
        values[machine.class(class).vertex.index()] += contribution(machine, n, class, registers);
    }
    for &v in lattice.bottom_up() {
        let carried: i64 = lattice
            .vertex(v)
            .children
            .iter()
            .map(|&c| values[c.index()].min(machine.bound().get(n, c) as i64))
            .sum();
        values[v.index()] += carried;
    }
    values
}

/// Z: the clipped pressure of the lattice roots.
pub fn total_pressure(machine: &Machine, n: ClassId, values: &[i64]) -> i64 {
    machine
        .lattice()
        .roots()
        .iter()
        .map(|&r| values[r.index()].min(machine.bound().get(n, r) as i64))
        .sum()
}

/// Change of `min(bound, value)` when `value` changes by `delta <= 0`.
fn clip(delta: i64, bound: i64, value: i64) -> i64 {
    std::cmp::min(0, std::cmp::max(delta, delta - (bound - value)))
}
