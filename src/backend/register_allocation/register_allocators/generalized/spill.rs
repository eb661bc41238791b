use std::collections::BTreeSet;

use crate::backend::machine::{Machine, RegisterSet};
use crate::backend::register_allocation::{LinkageId, Program};
use crate::error::{AllocError, InfeasibleReason};

use super::{AllocSettings, GroupId, InterferenceGraph, RegisterGroups};

/// What the spill selector decided after a failed attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpillDecision {
    /// Linkages to break, ascending.
    pub broken: Vec<LinkageId>,
    /// Groups to move to memory.
    pub spilled: Vec<GroupId>,
}

impl SpillDecision {
    pub fn is_empty(&self) -> bool {
        self.broken.is_empty() && self.spilled.is_empty()
    }
}

/// For each failed group, each register of its class that an assigned neighbour
/// blocks yields one candidate set: the linkages whose overlaps created the
/// blocking edges. Groups are then resolved stepwise, always taking the group
/// whose cheapest candidate adds the fewest new linkages.
pub fn select_spills(
    machine: &Machine,
    program: &Program,
    groups: &RegisterGroups,
    graph: &InterferenceGraph,
    failed: &[GroupId],
    settings: &AllocSettings,
) -> Result<SpillDecision, AllocError> {
    let mut decision = SpillDecision::default();
    let mut problems: Vec<(GroupId, Vec<BTreeSet<LinkageId>>)> = Vec::new();
    for &group in failed {
        let candidates = candidate_sets(machine, groups, graph, group);
        if !candidates.is_empty() {
            problems.push((group, candidates));
        } else if settings.spill_unallocatable {
            log::info!("{} has no breakable linkage, moving it to memory", group);
            decision.spilled.push(group);
        } else {
            return Err(infeasible(machine, program, groups, group));
        }
    }

    let mut broken: BTreeSet<LinkageId> = BTreeSet::new();
    let cost = |set: &BTreeSet<LinkageId>, broken: &BTreeSet<LinkageId>| set.difference(broken).count();
    while !problems.is_empty() {
        let next = (0..problems.len()).min_by_key(|&i| {
            let (group, candidates) = &problems[i];
            let cheapest = candidates.iter().map(|c| cost(c, &broken)).min().unwrap_or(0);
            (cheapest, *group)
        });
        let index = match next {
            Some(index) => index,
            None => break,
        };
        let (group, candidates) = problems.remove(index);
        if let Some(pick) = candidates.iter().min_by_key(|c| cost(*c, &broken)) {
            log::debug!("{}: breaking {:?}", group, pick);
            broken.extend(pick.iter().copied());
        }
    }
    decision.broken = broken.into_iter().collect();
    Ok(decision)
}

fn candidate_sets(
    machine: &Machine,
    groups: &RegisterGroups,
    graph: &InterferenceGraph,
    group: GroupId,
) -> Vec<BTreeSet<LinkageId>> {
    let blockers: Vec<(GroupId, RegisterSet)> = graph
        .neighbors_of(group)
        .iter()
        .map(|&n| groups.get(n))
        .filter(|n| !n.assigned.is_empty())
        .map(|n| {
            let mut aliases = RegisterSet::new(machine.register_count());
            for &register in &n.assigned {
                aliases.union_with(machine.aliases(register));
            }
            (n.id, aliases)
        })
        .collect();

    let mut candidates: Vec<BTreeSet<LinkageId>> = Vec::new();
    for register in machine.class(groups.get(group).class).iter() {
        let mut set = BTreeSet::new();
        for (neighbor, aliases) in &blockers {
            if aliases.contains(register) {
                set.extend(graph.linkages_between(group, *neighbor));
            }
        }
        if !set.is_empty() && !candidates.contains(&set) {
            candidates.push(set);
        }
    }
    candidates
}

fn infeasible(machine: &Machine, program: &Program, groups: &RegisterGroups, group: GroupId) -> AllocError {
    let group = groups.get(group);
    let class = machine.class(group.class);
    let reg_use = program.reg_use(group.members[0]);
    // nothing blocks the class, so it cannot hold the group on its own
    let reason = InfeasibleReason::TargetCapacity {
        class: class.name.clone(),
        needed: group.num_registers,
        capacity: class.capacity(),
    };
    AllocError::Infeasible {
        function: program.function_name(reg_use.function).to_string(),
        kind: reg_use.kind,
        ref_id: reg_use.ref_id,
        reason,
    }
}
