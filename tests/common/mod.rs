#![allow(dead_code)]

use gcra_lib::backend::machine::{ClassId, Machine, MachineDescription};

/// Four byte registers, two pairs over them, and a class for the low half.
pub fn quad() -> Machine {
    let mut description = MachineDescription::new("quad");
    description
        .register("r0", &[])
        .register("r1", &[])
        .register("r2", &[])
        .register("r3", &[])
        .register("p0", &["r0", "r1"])
        .register("p1", &["r2", "r3"])
        .class("single", 1, &["r0", "r1", "r2", "r3"])
        .class("pair", 2, &["p0", "p1"])
        .class("low", 1, &["r0", "r1"]);
    Machine::from_description(&description).unwrap()
}

/// One register and one class holding it.
pub fn lone() -> Machine {
    let mut description = MachineDescription::new("lone");
    description.register("r0", &[]).class("single", 1, &["r0"]);
    Machine::from_description(&description).unwrap()
}

/// Two byte registers and the word over them.
pub fn tiny() -> Machine {
    let mut description = MachineDescription::new("tiny");
    description
        .register("a", &[])
        .register("b", &[])
        .register("ab", &["a", "b"])
        .class("byte", 1, &["a", "b"])
        .class("word", 2, &["ab"]);
    Machine::from_description(&description).unwrap()
}

pub fn class(machine: &Machine, name: &str) -> ClassId {
    machine.class_by_name(name).unwrap()
}

pub fn register_names(machine: &Machine, registers: &[gcra_lib::backend::machine::RegisterId]) -> Vec<String> {
    registers
        .iter()
        .map(|&r| machine.register(r).name.clone())
        .collect()
}
