use crate::backend::register_allocation::{Program, RegisterLocation};

use super::RegisterGroups;

/// Copies each group's registers to all of its member uses.
pub fn write_back(program: &Program, groups: &RegisterGroups) -> Vec<RegisterLocation> {
    program
        .uses()
        .iter()
        .map(|reg_use| match groups.group_of(reg_use.id) {
            Some(group) if !reg_use.spilled => {
                RegisterLocation::Reg(groups.get(group).assigned.clone())
            }
            _ => RegisterLocation::Spilled,
        })
        .collect()
}
