use serde::{Deserialize, Serialize};

use crate::backend::machine::Machine;
use crate::error::InputError;

use super::{FunctionId, Program, UseId, UseKind, UseSpec};

/// Serialized register uses of a program. Classes and functions are named,
/// linkages refer to uses by their index in `uses`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDescription {
    pub functions: Vec<String>,
    pub uses: Vec<UseDescription>,
    #[serde(default)]
    pub linkages: Vec<[usize; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseDescription {
    pub function: String,
    pub kind: UseKind,
    pub ref_id: u32,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default = "default_registers")]
    pub registers: u32,
    #[serde(default)]
    pub block: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
}

fn default_registers() -> u32 {
    1
}

impl ProgramDescription {
    pub fn from_json(text: &str) -> serde_json::Result<ProgramDescription> {
        serde_json::from_str(text)
    }
}

impl Program {
    pub fn from_description(
        description: &ProgramDescription,
        machine: &Machine,
    ) -> Result<Program, InputError> {
        let mut program = Program::new();
        for function in &description.functions {
            program.add_function(function);
        }
        for (index, reg_use) in description.uses.iter().enumerate() {
            let function = description
                .functions
                .iter()
                .position(|f| f == &reg_use.function)
                .ok_or_else(|| InputError::UnknownFunction {
                    index,
                    function: reg_use.function.clone(),
                })?;
            if reg_use.registers == 0 {
                return Err(InputError::ZeroRegisters(index));
            }
            let mut spec = UseSpec::new(FunctionId(function as u32), reg_use.kind, reg_use.ref_id)
                .registers(reg_use.registers);
            if let Some(class) = &reg_use.class {
                let class = machine
                    .class_by_name(class)
                    .ok_or_else(|| InputError::UnknownClass {
                        index,
                        class: class.clone(),
                    })?;
                spec = spec.class(class);
            }
            if let (Some(block), Some(position)) = (reg_use.block, reg_use.position) {
                spec = spec.at(block, position);
            }
            program.add_use(spec);
        }
        let use_count = description.uses.len();
        for (index, &[first, second]) in description.linkages.iter().enumerate() {
            for &target in &[first, second] {
                if target >= use_count {
                    return Err(InputError::UnknownUse { index, target });
                }
            }
            if first == second {
                return Err(InputError::SelfLinkage(index));
            }
            program.link(UseId(first as u32), UseId(second as u32));
        }
        log::debug!(
            "program: {} functions, {} uses, {} linkages",
            program.functions().len(),
            program.uses().len(),
            program.linkages().len()
        );
        Ok(program)
    }
}
