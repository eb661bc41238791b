use std::collections::BTreeMap;
use std::fmt::Display;

use smallvec::SmallVec;

use crate::backend::machine::{ClassId, Machine, RegisterId};
use crate::backend::register_allocation::{Program, UseId};
use crate::error::Inconsistency;

use super::DisjointSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl GroupId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Uses partitioned into would-be groups, each sorted, ordered by their first use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub sets: Vec<SmallVec<[UseId; 4]>>,
}

impl Partition {
    pub fn new(mut sets: Vec<SmallVec<[UseId; 4]>>) -> Partition {
        sets.retain(|s| !s.is_empty());
        for set in &mut sets {
            set.sort_unstable();
        }
        sets.sort_unstable_by_key(|s| s[0]);
        Partition { sets }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Unions the ends of every active linkage. Spilled uses are left out.
pub fn group_uses(program: &Program) -> Partition {
    let mut disjoint_set = DisjointSet::new(program.uses().len());
    for linkage in program.linkages().iter().filter(|l| l.broken.is_active()) {
        if program.reg_use(linkage.first).spilled || program.reg_use(linkage.second).spilled {
            continue;
        }
        disjoint_set.union(linkage.first.0, linkage.second.0);
    }

    let mut sets: BTreeMap<u32, SmallVec<[UseId; 4]>> = BTreeMap::new();
    for reg_use in program.uses().iter().filter(|u| !u.spilled) {
        let root = disjoint_set.find(reg_use.id.0);
        sets.entry(root).or_default().push(reg_use.id);
    }
    let partition = Partition::new(sets.into_iter().map(|(_, set)| set).collect());
    log::debug!(
        "grouped {} uses into {} groups",
        program.uses().len(),
        partition.len()
    );
    partition
}

#[derive(Clone, Debug)]
pub struct RegisterGroup {
    pub id: GroupId,
    pub members: SmallVec<[UseId; 4]>,
    pub class: ClassId,
    pub num_registers: u32,
    /// Rank at which the group was stacked, starting at 1.
    pub stacking_order: u32,
    pub assignment_certain: bool,
    pub assigned: SmallVec<[RegisterId; 2]>,
}

/// The groups of one attempt, with the group of every unspilled use.
#[derive(Clone, Debug)]
pub struct RegisterGroups {
    groups: Vec<RegisterGroup>,
    group_of: Vec<Option<GroupId>>,
}

impl RegisterGroups {
    /// Fixes each group's effective class and register count.
    pub fn resolve(
        machine: &Machine,
        program: &Program,
        partition: Partition,
    ) -> Result<RegisterGroups, Inconsistency> {
        let mut groups = Vec::with_capacity(partition.len());
        let mut group_of = vec![None; program.uses().len()];
        for (index, members) in partition.sets.into_iter().enumerate() {
            let id = GroupId(index as u32);
            let mut class: Option<ClassId> = None;
            let mut counts: SmallVec<[u32; 2]> = SmallVec::new();
            for &member in &members {
                let reg_use = program.reg_use(member);
                if !counts.contains(&reg_use.num_registers) {
                    counts.push(reg_use.num_registers);
                }
                if let Some(member_class) = reg_use.class {
                    class = match class {
                        None => Some(member_class),
                        Some(current) => Some(
                            machine
                                .common_subclass(current, member_class)
                                .ok_or_else(|| no_common_class(machine, program, id, &members))?,
                        ),
                    };
                }
                group_of[member.index()] = Some(id);
            }
            if counts.len() > 1 {
                return Err(Inconsistency::RegisterCountMismatch {
                    group: id.0,
                    counts: counts.into_vec(),
                });
            }
            let class = class.ok_or(Inconsistency::Unclassified { group: id.0 })?;
            log::trace!("{}: {:?} class {}", id, members, machine.class(class));
            groups.push(RegisterGroup {
                id,
                members,
                class,
                num_registers: counts[0],
                stacking_order: 0,
                assignment_certain: false,
                assigned: SmallVec::new(),
            });
        }
        Ok(RegisterGroups { groups, group_of })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterGroup> + '_ {
        self.groups.iter()
    }

    pub fn get(&self, id: GroupId) -> &RegisterGroup {
        &self.groups[id.index()]
    }

    pub fn get_mut(&mut self, id: GroupId) -> &mut RegisterGroup {
        &mut self.groups[id.index()]
    }

    pub fn group_of(&self, reg_use: UseId) -> Option<GroupId> {
        self.group_of[reg_use.index()]
    }
}

fn no_common_class(
    machine: &Machine,
    program: &Program,
    id: GroupId,
    members: &[UseId],
) -> Inconsistency {
    let mut classes: Vec<String> = members
        .iter()
        .filter_map(|&m| program.reg_use(m).class)
        .map(|c| machine.class(c).name.clone())
        .collect();
    classes.dedup();
    Inconsistency::NoCommonClass {
        group: id.0,
        classes,
    }
}
