use std::collections::{BTreeMap, BTreeSet, HashMap};

use smallvec::SmallVec;

use crate::backend::machine::Machine;
use crate::backend::register_allocation::{Program, UseId};

use super::{group_uses, Partition};

/// Splits every group holding incompatible members into conflict-free parts.
/// Active linkages that now cross a part boundary are soft-broken, and the
/// parts are regrouped by the linkages left active, so a part whose members
/// are no longer connected falls apart into its components.
/// Returns the new partition and how many groups were split.
pub fn split_conflicts(
    machine: &Machine,
    program: &mut Program,
    partition: Partition,
) -> (Partition, usize) {
    let weights = link_weights(program);
    let weight = |a: UseId, b: UseId| weights.get(&(a.min(b), a.max(b))).copied().unwrap_or(0);

    let mut splits = 0;
    let mut sets = Vec::with_capacity(partition.len());
    for members in partition.sets {
        let conflicts = conflicts(machine, program, &members);
        if conflicts.is_empty() {
            sets.push(members);
            continue;
        }
        splits += 1;
        let parts = split(&members, &conflicts, weight);
        log::debug!("split {:?} into {:?}", members, parts);
        sets.extend(parts.into_iter().map(SmallVec::from_vec));
    }
    if splits == 0 {
        return (Partition::new(sets), 0);
    }

    let partition = Partition::new(sets);
    let mut set_of = vec![usize::MAX; program.uses().len()];
    for (index, set) in partition.sets.iter().enumerate() {
        for member in set {
            set_of[member.index()] = index;
        }
    }
    let crossing: Vec<_> = program
        .linkages()
        .iter()
        .filter(|l| l.broken.is_active())
        .filter(|l| set_of[l.first.index()] != set_of[l.second.index()])
        .map(|l| l.id)
        .collect();
    for linkage in crossing {
        program.soft_break(linkage);
    }
    (group_uses(program), splits)
}

/// Number of active linkages between each pair of uses, keyed `(low, high)`.
fn link_weights(program: &Program) -> HashMap<(UseId, UseId), u32> {
    let mut weights = HashMap::new();
    for linkage in program.linkages().iter().filter(|l| l.broken.is_active()) {
        let key = (
            linkage.first.min(linkage.second),
            linkage.first.max(linkage.second),
        );
        *weights.entry(key).or_insert(0) += 1;
    }
    weights
}

fn conflicts(machine: &Machine, program: &Program, members: &[UseId]) -> Vec<(UseId, UseId)> {
    let mut conflicts = Vec::new();
    for (index, &a) in members.iter().enumerate() {
        for &b in &members[index + 1..] {
            let (first, second) = (program.reg_use(a), program.reg_use(b));
            let incompatible = match (first.class, second.class) {
                (Some(x), Some(y)) => machine.common_subclass(x, y).is_none(),
                _ => false,
            };
            if incompatible || first.same_slot(second) {
                conflicts.push((a, b));
            }
        }
    }
    conflicts
}

/// Colours `members` so no conflicting pair shares a colour, keeping strongly
/// linked members together. Each colour is returned sorted, colours ordered by
/// their first member.
pub fn split<W>(members: &[UseId], conflicts: &[(UseId, UseId)], weight: W) -> Vec<Vec<UseId>>
where
    W: Fn(UseId, UseId) -> u32,
{
    let mut pending: BTreeMap<UseId, BTreeSet<UseId>> = BTreeMap::new();
    for &(a, b) in conflicts {
        pending.entry(a).or_default().insert(b);
        pending.entry(b).or_default().insert(a);
    }

    // eliminate the least conflicted first, colour in reverse
    let mut elimination = Vec::with_capacity(pending.len());
    while let Some(next) = pending
        .iter()
        .min_by_key(|(&id, remaining)| (remaining.len(), id))
        .map(|(&id, _)| id)
    {
        let remaining = pending.remove(&next).unwrap_or_default();
        for other in &remaining {
            if let Some(set) = pending.get_mut(other) {
                set.remove(&next);
            }
        }
        elimination.push((next, remaining));
    }

    let mut colors: Vec<Vec<UseId>> = Vec::new();
    let mut color_of: HashMap<UseId, usize> = HashMap::new();
    let link = |colors: &Vec<Vec<UseId>>, id: UseId, color: usize| -> u32 {
        colors[color].iter().map(|&m| weight(id, m)).sum()
    };
    for (id, later) in elimination.into_iter().rev() {
        let taken: BTreeSet<usize> = later.iter().filter_map(|m| color_of.get(m)).copied().collect();
        let best = (0..colors.len())
            .filter(|c| !taken.contains(c))
            .max_by_key(|&c| (link(&colors, id, c), std::cmp::Reverse(c)));
        let color = match best {
            Some(color) => color,
            None => {
                colors.push(Vec::new());
                colors.len() - 1
            }
        };
        color_of.insert(id, color);
        colors[color].push(id);
    }

    let mut unconflicted: BTreeSet<UseId> = members
        .iter()
        .filter(|m| !color_of.contains_key(m))
        .copied()
        .collect();
    if colors.is_empty() && !unconflicted.is_empty() {
        colors.push(Vec::new());
    }
    while !unconflicted.is_empty() {
        let placement = unconflicted
            .iter()
            .map(|&id| {
                let (color, strength) = (0..colors.len())
                    .map(|c| (c, link(&colors, id, c)))
                    .max_by_key(|&(c, strength)| (strength, std::cmp::Reverse(c)))
                    .unwrap_or((0, 0));
                (id, color, strength)
            })
            .max_by_key(|&(id, _, strength)| (strength, std::cmp::Reverse(id)));
        if let Some((id, color, _)) = placement {
            unconflicted.remove(&id);
            colors[color].push(id);
        }
    }

    for color in &mut colors {
        color.sort_unstable();
    }
    colors.sort_unstable_by_key(|c| c[0]);
    colors
}
