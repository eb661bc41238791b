use std::fmt::Display;

use smallvec::SmallVec;

use crate::backend::machine::{Machine, RegisterId};

use RegisterLocation::*;

/// Where a register use ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterLocation {
    Reg(SmallVec<[RegisterId; 2]>),
    Spilled,
}

impl RegisterLocation {
    pub fn regs(&self) -> &[RegisterId] {
        match self {
            Reg(regs) => regs,
            Spilled => &[],
        }
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self, Spilled)
    }

    pub fn display<'a>(&'a self, machine: &'a Machine) -> LocationDisplay<'a> {
        LocationDisplay {
            location: self,
            machine,
        }
    }
}

pub struct LocationDisplay<'a> {
    location: &'a RegisterLocation,
    machine: &'a Machine,
}

impl<'a> Display for LocationDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.location {
            Reg(regs) => {
                let names: Vec<&str> = regs
                    .iter()
                    .map(|&r| self.machine.register(r).name.as_str())
                    .collect();
                write!(f, "{}", names.join(", "))
            }
            Spilled => write!(f, "spill"),
        }
    }
}
