use std::cmp::Reverse;

use smallvec::SmallVec;

use crate::backend::machine::{Machine, RegisterId, RegisterSet};

use super::{GroupId, InterferenceGraph, RegisterGroups, Stack};

/// Pops the stack and gives each group registers of its class that no assigned
/// neighbour aliases. Returns the groups that could not be given registers.
pub fn select(
    machine: &Machine,
    groups: &mut RegisterGroups,
    graph: &InterferenceGraph,
    stack: &Stack,
) -> Result<(), Vec<GroupId>> {
    log::debug!("Starting select phase");
    let mut failed = Vec::new();
    for rank in stack.ranks.iter().rev() {
        for &group in rank {
            match choose_registers(machine, groups, graph, group) {
                Some(registers) => {
                    log::trace!("{} => {:?}", group, registers);
                    groups.get_mut(group).assigned = registers;
                }
                None => {
                    log::debug!("{} could not be assigned", group);
                    failed.push(group);
                }
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(failed)
    }
}

/// Registers aliased by the assignments of `group`'s neighbours.
pub(super) fn blocked(
    machine: &Machine,
    groups: &RegisterGroups,
    graph: &InterferenceGraph,
    group: GroupId,
) -> RegisterSet {
    let mut blocked = RegisterSet::new(machine.register_count());
    for &neighbor in graph.neighbors_of(group) {
        for &register in &groups.get(neighbor).assigned {
            blocked.union_with(machine.aliases(register));
        }
    }
    blocked
}

// A register scores one point per unassigned neighbour it leaves untouched:
// either it aliases nothing in the neighbour's class, or everything it aliases
// there is already blocked for that neighbour. Ties go to the lowest register.
fn choose_registers(
    machine: &Machine,
    groups: &RegisterGroups,
    graph: &InterferenceGraph,
    group: GroupId,
) -> Option<SmallVec<[RegisterId; 2]>> {
    let current = groups.get(group);
    let mut available = machine
        .class(current.class)
        .members
        .difference(&blocked(machine, groups, graph, group));

    let uncertain: Vec<(&RegisterSet, RegisterSet)> = graph
        .neighbors_of(group)
        .iter()
        .map(|&n| groups.get(n))
        .filter(|n| n.assigned.is_empty())
        .map(|n| {
            (
                &machine.class(n.class).members,
                blocked(machine, groups, graph, n.id),
            )
        })
        .collect();
    let score = |register: RegisterId| {
        uncertain
            .iter()
            .filter(|(members, blocked)| {
                let hit = machine.aliases(register).intersection(members);
                hit.is_empty() || hit.is_subset(blocked)
            })
            .count()
    };

    let mut chosen = SmallVec::new();
    for _ in 0..current.num_registers {
        let best = available
            .iter()
            .max_by_key(|&r| (score(r), Reverse(r)))?;
        chosen.push(best);
        available.subtract(machine.aliases(best));
    }
    Some(chosen)
}
