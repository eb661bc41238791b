use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::backend::machine::ClassId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UseId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkageId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl UseId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl LinkageId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for UseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "u{}", self.0)
    }
}

impl Display for LinkageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// What a register use stands for in the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseKind {
    TripleOutput,
    Operand,
    Temp,
    Function,
    FunctionReturn,
    BlockStart,
    BlockEnd,
}

impl Display for UseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UseKind::TripleOutput => "triple-output",
            UseKind::Operand => "operand",
            UseKind::Temp => "temp",
            UseKind::Function => "function",
            UseKind::FunctionReturn => "function-return",
            UseKind::BlockStart => "block-start",
            UseKind::BlockEnd => "block-end",
        };
        write!(f, "{}", name)
    }
}

/// A point in straight-line code: a block and a position within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPosition {
    pub block: BlockId,
    pub position: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegUse {
    pub id: UseId,
    pub function: FunctionId,
    pub kind: UseKind,
    pub ref_id: u32,
    pub class: Option<ClassId>,
    pub num_registers: u32,
    pub position: Option<BlockPosition>,
    /// Lives in memory; takes no further part in allocation.
    pub spilled: bool,
}

impl RegUse {
    /// Two uses naming the same operation slot cannot share a register.
    pub fn same_slot(&self, other: &RegUse) -> bool {
        self.kind == other.kind && self.ref_id == other.ref_id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Broken {
    Active,
    /// Broken by conflict splitting in the current attempt only.
    Soft,
    /// Broken by the spill selector in the given attempt.
    Permanent(u32),
}

impl Broken {
    pub fn is_active(self) -> bool {
        self == Broken::Active
    }
}

impl Display for Broken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Broken::Active => write!(f, "active"),
            Broken::Soft => write!(f, "split"),
            Broken::Permanent(attempt) => write!(f, "broken in attempt {}", attempt),
        }
    }
}

/// A requirement that two uses receive the same registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegUseLinkage {
    pub id: LinkageId,
    pub first: UseId,
    pub second: UseId,
    pub broken: Broken,
}

impl RegUseLinkage {
    pub fn touches(&self, reg_use: UseId) -> bool {
        self.first == reg_use || self.second == reg_use
    }
}

/// Describes a use to add to a `Program`.
#[derive(Clone, Copy, Debug)]
pub struct UseSpec {
    function: FunctionId,
    kind: UseKind,
    ref_id: u32,
    class: Option<ClassId>,
    num_registers: u32,
    position: Option<BlockPosition>,
}

impl UseSpec {
    pub fn new(function: FunctionId, kind: UseKind, ref_id: u32) -> UseSpec {
        UseSpec {
            function,
            kind,
            ref_id,
            class: None,
            num_registers: 1,
            position: None,
        }
    }

    pub fn class(mut self, class: ClassId) -> UseSpec {
        self.class = Some(class);
        self
    }

    pub fn registers(mut self, num_registers: u32) -> UseSpec {
        self.num_registers = num_registers;
        self
    }

    pub fn at(mut self, block: u32, position: u32) -> UseSpec {
        self.position = Some(BlockPosition {
            block: BlockId(block),
            position,
        });
        self
    }
}

/// Register uses and linkages of a whole program.
/// Ids are dense indices in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Program {
    functions: Vec<String>,
    uses: Vec<RegUse>,
    linkages: Vec<RegUseLinkage>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn add_function(&mut self, name: &str) -> FunctionId {
        self.functions.push(name.to_string());
        FunctionId(self.functions.len() as u32 - 1)
    }

    pub fn add_use(&mut self, spec: UseSpec) -> UseId {
        let id = UseId(self.uses.len() as u32);
        self.uses.push(RegUse {
            id,
            function: spec.function,
            kind: spec.kind,
            ref_id: spec.ref_id,
            class: spec.class,
            num_registers: spec.num_registers,
            position: spec.position,
            spilled: false,
        });
        id
    }

    pub fn link(&mut self, first: UseId, second: UseId) -> LinkageId {
        let id = LinkageId(self.linkages.len() as u32);
        self.linkages.push(RegUseLinkage {
            id,
            first,
            second,
            broken: Broken::Active,
        });
        id
    }

    pub fn function_name(&self, function: FunctionId) -> &str {
        &self.functions[function.0 as usize]
    }

    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    pub fn uses(&self) -> &[RegUse] {
        &self.uses
    }

    pub fn reg_use(&self, id: UseId) -> &RegUse {
        &self.uses[id.index()]
    }

    pub fn linkages(&self) -> &[RegUseLinkage] {
        &self.linkages
    }

    pub fn linkage(&self, id: LinkageId) -> &RegUseLinkage {
        &self.linkages[id.index()]
    }

    /// Linkages broken by the spill selector, in id order.
    pub fn broken_linkages(&self) -> impl Iterator<Item = &RegUseLinkage> + '_ {
        self.linkages
            .iter()
            .filter(|l| matches!(l.broken, Broken::Permanent(_)))
    }

    pub(crate) fn reset_soft_breaks(&mut self) {
        for linkage in &mut self.linkages {
            if linkage.broken == Broken::Soft {
                linkage.broken = Broken::Active;
            }
        }
    }

    pub(crate) fn soft_break(&mut self, id: LinkageId) {
        self.linkages[id.index()].broken = Broken::Soft;
    }

    pub(crate) fn break_linkage(&mut self, id: LinkageId, attempt: u32) {
        self.linkages[id.index()].broken = Broken::Permanent(attempt);
    }

    /// Moves a use to memory and breaks every linkage that touches it.
    pub(crate) fn spill_use(&mut self, id: UseId, attempt: u32) {
        self.uses[id.index()].spilled = true;
        for linkage in &mut self.linkages {
            if linkage.touches(id) && !matches!(linkage.broken, Broken::Permanent(_)) {
                linkage.broken = Broken::Permanent(attempt);
            }
        }
    }
}
