use std::collections::BTreeMap;

use thiserror::Error;

use crate::backend::machine::Machine;

use super::{Allocation, BlockId, DisjointSet, Program, UseId};

/// A rule a committed allocation breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{reg_use} holds {held} registers but needs {needed}")]
    RegisterCount { reg_use: UseId, held: usize, needed: u32 },
    #[error("{reg_use} holds `{register}`, which is not in class `{class}`")]
    OutsideClass {
        reg_use: UseId,
        register: String,
        class: String,
    },
    #[error("{reg_use} holds `{register}` twice or in aliasing form")]
    SelfAlias { reg_use: UseId, register: String },
    #[error("linked {first} and {second} hold different registers")]
    LinkMismatch { first: UseId, second: UseId },
    #[error("{reg_use} holds a register aliasing one of {linked}, which is live across it")]
    Clash { linked: UseId, reg_use: UseId },
}

/// Re-checks `allocation` against `program` as left by the allocator.
pub fn verify(machine: &Machine, program: &Program, allocation: &Allocation) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    let registered = |id: UseId| !allocation.location(id).is_spilled();

    for reg_use in program.uses().iter().filter(|u| registered(u.id)) {
        let regs = allocation.location(reg_use.id).regs();
        if regs.len() != reg_use.num_registers as usize {
            violations.push(Violation::RegisterCount {
                reg_use: reg_use.id,
                held: regs.len(),
                needed: reg_use.num_registers,
            });
        }
        for (index, &register) in regs.iter().enumerate() {
            if let Some(class) = reg_use.class.map(|c| machine.class(c)) {
                if !class.members.contains(register) {
                    violations.push(Violation::OutsideClass {
                        reg_use: reg_use.id,
                        register: machine.register(register).name.clone(),
                        class: class.name.clone(),
                    });
                }
            }
            if regs[index + 1..].iter().any(|&r| machine.aliases(register).contains(r)) {
                violations.push(Violation::SelfAlias {
                    reg_use: reg_use.id,
                    register: machine.register(register).name.clone(),
                });
            }
        }
    }

    let mut groups = DisjointSet::new(program.uses().len());
    let active: Vec<_> = program
        .linkages()
        .iter()
        .filter(|l| l.broken.is_active() && registered(l.first) && registered(l.second))
        .collect();
    for linkage in &active {
        groups.union(linkage.first.0, linkage.second.0);
        if allocation.location(linkage.first) != allocation.location(linkage.second) {
            violations.push(Violation::LinkMismatch {
                first: linkage.first,
                second: linkage.second,
            });
        }
    }

    let mut blocks: BTreeMap<BlockId, Vec<(u32, UseId)>> = BTreeMap::new();
    for reg_use in program.uses().iter().filter(|u| registered(u.id)) {
        if let Some(position) = reg_use.position {
            blocks
                .entry(position.block)
                .or_default()
                .push((position.position, reg_use.id));
        }
    }
    for linkage in &active {
        let (first, second) = (program.reg_use(linkage.first), program.reg_use(linkage.second));
        let (a, b) = match (first.position, second.position) {
            (Some(a), Some(b)) if a.block == b.block => (a, b),
            _ => continue,
        };
        let (start, end) = (a.position.min(b.position), a.position.max(b.position));
        let held = allocation.location(first.id).regs();
        let inside = blocks
            .get(&a.block)
            .into_iter()
            .flatten()
            .filter(|&&(p, _)| start <= p && p <= end);
        for &(_, other) in inside {
            if groups.same(first.id.0, other.0) {
                continue;
            }
            let clash = allocation
                .location(other)
                .regs()
                .iter()
                .any(|&r| held.iter().any(|&h| machine.aliases(h).contains(r)));
            if clash {
                violations.push(Violation::Clash {
                    linked: first.id,
                    reg_use: other,
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
