use std::collections::{BTreeMap, BTreeSet};

use smallvec::SmallVec;

use crate::backend::machine::{ClassId, Machine};

use super::{GroupId, InterferenceGraph, Pressure, RegisterGroups};

/// Groups in stacking order. Rank `i` holds the groups with `stacking_order == i + 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack {
    pub ranks: Vec<SmallVec<[GroupId; 4]>>,
    pub inconclusive_ranks: u32,
}

impl Stack {
    pub fn max_stacking_order(&self) -> u32 {
        self.ranks.len() as u32
    }
}

// Every rank takes all groups that pass `Z + k <= capacity` at once. When none
// pass, the group closest to passing is stacked alone and marked uncertain.
// Stacked groups relieve the pressure of their neighbours that are still active.
pub fn stack(
    machine: &Machine,
    groups: &mut RegisterGroups,
    graph: &InterferenceGraph,
    pressure: &mut Pressure,
) -> Stack {
    let mut active: BTreeSet<GroupId> = groups.iter().map(|g| g.id).collect();
    let mut stack = Stack::default();
    while !active.is_empty() {
        let order = stack.ranks.len() as u32 + 1;
        let mut rank: SmallVec<[GroupId; 4]> = active
            .iter()
            .copied()
            .filter(|&g| pressure.stackable(machine, groups.get(g)))
            .collect();
        let certain = !rank.is_empty();
        if !certain {
            let least = active
                .iter()
                .copied()
                .min_by_key(|&g| (pressure.excess(machine, groups.get(g)), g));
            if let Some(least) = least {
                log::debug!(
                    "rank {}: nothing stackable, optimistically stacking {} (excess {})",
                    order,
                    least,
                    pressure.excess(machine, groups.get(least))
                );
                rank.push(least);
            }
            stack.inconclusive_ranks += 1;
        }

        for &g in &rank {
            active.remove(&g);
            let group = groups.get_mut(g);
            group.stacking_order = order;
            group.assignment_certain = certain;
        }

        let mut relief: BTreeMap<GroupId, SmallVec<[(ClassId, u32); 4]>> = BTreeMap::new();
        for &g in &rank {
            let stacked = groups.get(g);
            for neighbor in graph.neighbors_of(g).iter().filter(|n| active.contains(n)) {
                relief
                    .entry(*neighbor)
                    .or_default()
                    .push((stacked.class, stacked.num_registers));
            }
        }
        for (neighbor, removed) in relief {
            pressure.relieve(machine, groups.get(neighbor), &removed);
        }

        log::trace!("rank {}: {:?}", order, rank);
        stack.ranks.push(rank);
    }
    stack
}
