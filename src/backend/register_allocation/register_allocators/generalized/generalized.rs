use crate::backend::machine::Machine;
use crate::backend::register_allocation::{Allocation, AttemptStats, Program};
use crate::error::{AllocError, Inconsistency};

use super::group::group_uses;
use super::select::select;
use super::spill::select_spills;
use super::split::split_conflicts;
use super::stack::stack;
use super::write_back::write_back;
use super::{InterferenceGraph, Pressure, RegisterGroups};

/// Knobs of the allocator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocSettings {
    /// Give up after this many attempts. `None` allows `linkages + uses + 1`,
    /// enough for every linkage to be broken and every use to be spilled.
    pub max_attempts: Option<u32>,
    /// Move groups that cannot fit their class to memory instead of failing.
    pub spill_unallocatable: bool,
}

/// Groups and interference graph of one attempt, built from the current linkages.
pub struct Attempt {
    pub number: u32,
    pub groups: RegisterGroups,
    pub graph: InterferenceGraph,
    pub conflict_splits: usize,
}

impl Attempt {
    pub fn prepare(machine: &Machine, program: &mut Program, number: u32) -> Result<Attempt, Inconsistency> {
        program.reset_soft_breaks();
        let partition = group_uses(program);
        let (partition, conflict_splits) = split_conflicts(machine, program, partition);
        let groups = RegisterGroups::resolve(machine, program, partition)?;
        let graph = InterferenceGraph::build(program, &groups);
        Ok(Attempt {
            number,
            groups,
            graph,
            conflict_splits,
        })
    }
}

/// Assigns registers to every use of `program`, breaking linkages between
/// attempts until an assignment is found.
///
/// Broken linkages are recorded in `program`; everything else an attempt
/// computes is rebuilt from scratch by the next one.
pub fn allocate(machine: &Machine, program: &mut Program, settings: &AllocSettings) -> Result<Allocation, AllocError> {
    let limit = settings
        .max_attempts
        .unwrap_or((program.linkages().len() + program.uses().len() + 1) as u32);
    let mut attempts = Vec::new();
    for number in 1..=limit {
        let mut attempt = Attempt::prepare(machine, program, number)?;
        let mut pressure = Pressure::new(machine, &attempt.groups, &attempt.graph);
        let stack = stack(machine, &mut attempt.groups, &attempt.graph, &mut pressure);
        log::trace!("stack:{:?}", stack);
        let result = select(machine, &mut attempt.groups, &attempt.graph, &stack);

        let mut stats = AttemptStats {
            attempt: number,
            group_count: attempt.groups.len(),
            conflict_splits: attempt.conflict_splits,
            neighbor_count: attempt.graph.edges().len(),
            max_stacking_order: stack.max_stacking_order(),
            inconclusive_ranks: stack.inconclusive_ranks,
            ..AttemptStats::default()
        };

        let failed = match result {
            Ok(()) => {
                log::info!(
                    "attempt {}: assigned {} groups in {} ranks",
                    number,
                    stats.group_count,
                    stats.max_stacking_order
                );
                attempts.push(stats);
                return Ok(Allocation {
                    locations: write_back(program, &attempt.groups),
                    attempts,
                });
            }
            Err(failed) => failed,
        };

        let decision = select_spills(
            machine,
            program,
            &attempt.groups,
            &attempt.graph,
            &failed,
            settings,
        )?;
        if decision.is_empty() {
            return Err(AllocError::NoProgress(number));
        }
        for &linkage in &decision.broken {
            program.break_linkage(linkage, number);
        }
        let mut spilled_uses = 0;
        for &group in &decision.spilled {
            for &member in &attempt.groups.get(group).members {
                program.spill_use(member, number);
                spilled_uses += 1;
            }
        }
        stats.failed_groups = failed.len();
        stats.broken_linkages = decision.broken.len();
        stats.spilled_uses = spilled_uses;
        log::info!(
            "attempt {}: {} groups failed, breaking {} linkages, spilling {} uses",
            number,
            stats.failed_groups,
            stats.broken_linkages,
            stats.spilled_uses
        );
        attempts.push(stats);
    }
    Err(AllocError::AttemptLimit(limit))
}
