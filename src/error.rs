use std::fmt::{self, Display};

use thiserror::Error;

use crate::backend::register_allocation::{UseKind, Violation};

#[macro_export]
macro_rules! error {
    ($context:expr,$( $exp:expr ),*) => {
        {
            use colored::Colorize;
            let string = format!("{}: error: {}", $context, format!($($exp,)*).red());
            eprintln!("{}", string);
            string
        }
    };
}

#[macro_export]
macro_rules! warning {
    ($context:expr,$( $exp:expr ),*) => {
        {
            use colored::Colorize;
            format!("{}: warning: {}", $context, format!($($exp,)*).purple())
        }
    };
}

/// Problems found while turning a machine description into a `Machine`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine `{0}` declares no registers")]
    NoRegisters(String),
    #[error("register `{0}` is declared twice")]
    DuplicateRegister(String),
    #[error("register class `{0}` is declared twice")]
    DuplicateClass(String),
    #[error("`{owner}` names register `{register}`, which is not declared")]
    UnknownRegister { owner: String, register: String },
    #[error("register class `{0}` has no registers")]
    EmptyClass(String),
    #[error("register class `{0}` has a register size of 0")]
    ZeroRegisterSize(String),
    #[error("register classes `{0}` and `{1}` partially overlap; alias sets must nest or be disjoint")]
    NotLaminar(String, String),
}

/// Problems found while resolving a program description against a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("use {index}: unknown function `{function}`")]
    UnknownFunction { index: usize, function: String },
    #[error("use {index}: unknown register class `{class}`")]
    UnknownClass { index: usize, class: String },
    #[error("use {0}: register count must be at least 1")]
    ZeroRegisters(usize),
    #[error("linkage {index}: use {target} does not exist")]
    UnknownUse { index: usize, target: usize },
    #[error("linkage {0} links a use to itself")]
    SelfLinkage(usize),
}

/// Defects in the upstream class-compatibility guarantee. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    #[error("register group {group} mixes register counts {counts:?}")]
    RegisterCountMismatch { group: u32, counts: Vec<u32> },
    #[error("register group {group} has no class common to {classes:?}")]
    NoCommonClass { group: u32, classes: Vec<String> },
    #[error("register group {group} has no register class")]
    Unclassified { group: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfeasibleReason {
    TargetCapacity {
        class: String,
        needed: u32,
        capacity: usize,
    },
}

impl Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibleReason::TargetCapacity {
                class,
                needed,
                capacity,
            } => write!(
                f,
                "needs {} non-aliasing registers of class `{}`, which holds {}",
                needed, class, capacity
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("internal error: {0}")]
    Inconsistency(#[from] Inconsistency),
    #[error("cannot allocate {kind} of operation {ref_id} in function `{function}`: {reason}")]
    Infeasible {
        function: String,
        kind: UseKind,
        ref_id: u32,
        reason: InfeasibleReason,
    },
    #[error("attempt {0} failed without breaking a linkage or spilling a use")]
    NoProgress(u32),
    #[error("register allocation did not converge within {0} attempts")]
    AttemptLimit(u32),
}

impl AllocError {
    /// True for defects of the allocator or its inputs rather than limits of the target.
    pub fn is_internal(&self) -> bool {
        matches!(self, AllocError::Inconsistency(..) | AllocError::NoProgress(..))
    }
}

/// Everything the driver can run into.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("`{path}` is not valid: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("unknown built-in target `{0}`")]
    UnknownTarget(String),
    #[error(transparent)]
    Machine(#[from] MachineError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error("allocation failed verification:\n{}", display_violations(.0))]
    Verification(Vec<Violation>),
}

fn display_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("\t{}", v))
        .collect::<Vec<_>>()
        .join("\n")
}
