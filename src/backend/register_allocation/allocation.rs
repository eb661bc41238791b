use std::fmt::Write;

use crate::backend::machine::Machine;

use super::{Program, RegisterLocation, UseId};

/// Counters collected for one allocation attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttemptStats {
    pub attempt: u32,
    pub group_count: usize,
    pub conflict_splits: usize,
    pub neighbor_count: usize,
    pub max_stacking_order: u32,
    pub inconclusive_ranks: u32,
    pub failed_groups: usize,
    pub broken_linkages: usize,
    pub spilled_uses: usize,
}

/// The committed result: one location per use, indexed by `UseId`.
#[derive(Clone, Debug)]
pub struct Allocation {
    pub locations: Vec<RegisterLocation>,
    pub attempts: Vec<AttemptStats>,
}

impl Allocation {
    pub fn location(&self, reg_use: UseId) -> &RegisterLocation {
        &self.locations[reg_use.index()]
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// One line per use: function, kind, operation, then registers or `spill`.
    pub fn render(&self, machine: &Machine, program: &Program) -> String {
        let mut listing = String::new();
        for (reg_use, location) in program.uses().iter().zip(&self.locations) {
            let _ = writeln!(
                listing,
                "{}\t{}\t{}\t{}",
                program.function_name(reg_use.function),
                reg_use.kind,
                reg_use.ref_id,
                location.display(machine)
            );
        }
        listing
    }

    pub fn render_stats(&self) -> String {
        let mut text = String::new();
        for stats in &self.attempts {
            let _ = writeln!(
                text,
                "attempt {}: {} groups, {} splits, {} neighbors, {} ranks ({} inconclusive), {} failed, {} linkages broken, {} uses spilled",
                stats.attempt,
                stats.group_count,
                stats.conflict_splits,
                stats.neighbor_count,
                stats.max_stacking_order,
                stats.inconclusive_ranks,
                stats.failed_groups,
                stats.broken_linkages,
                stats.spilled_uses
            );
        }
        text
    }
}
