use lazy_static::lazy_static;

use crate::error::MachineError;

use super::{Machine, MachineDescription};

lazy_static! {
    /// 32 byte registers and the 16 even/odd pairs that overlay them.
    pub static ref AVR: MachineDescription = avr();
    static ref AVR_MACHINE: Result<Machine, MachineError> = Machine::from_description(&AVR);
}

/// Looks up a built-in target description by name.
pub fn builtin(name: &str) -> Option<&'static MachineDescription> {
    match name {
        "avr" => Some(&*AVR),
        _ => None,
    }
}

/// The built-in target, with its tables built on first use only.
pub fn builtin_machine(name: &str) -> Option<Result<&'static Machine, MachineError>> {
    match name {
        "avr" => Some(AVR_MACHINE.as_ref().map_err(MachineError::clone)),
        _ => None,
    }
}

fn byte(index: u32) -> String {
    format!("r{}", index)
}

fn pair(index: u32) -> String {
    format!("r{}:r{}", 2 * index + 1, 2 * index)
}

fn avr() -> MachineDescription {
    let mut description = MachineDescription::new("avr");
    for index in 0..32 {
        description.register(&byte(index), &[]);
    }
    for index in 0..16 {
        let low = byte(2 * index);
        let high = byte(2 * index + 1);
        description.register(&pair(index), &[&low, &high]);
    }

    let class = |description: &mut MachineDescription, name: &str, size: u32, registers: Vec<String>| {
        let registers: Vec<&str> = registers.iter().map(String::as_str).collect();
        description.class(name, size, &registers);
    };
    class(&mut description, "single", 1, (0..32).map(byte).collect());
    class(&mut description, "pair", 2, (0..16).map(pair).collect());
    class(&mut description, "immed", 1, (16..32).map(byte).collect());
    class(&mut description, "immed_word", 2, (12..16).map(pair).collect());
    class(&mut description, "index", 2, (13..16).map(pair).collect());
    class(&mut description, "z", 2, vec![pair(15)]);
    class(&mut description, "mul_result", 2, vec![pair(0)]);
    description
}
