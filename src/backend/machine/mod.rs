//! The register model of a target: physical registers, aliasing, register classes,
//! the forest of class alias sets and the tables the allocator reads from it.

mod avr;
mod description;
mod lattice;
mod register_class;
mod tables;

pub use self::avr::{builtin, builtin_machine, AVR};
pub use self::description::{ClassDescription, MachineDescription, RegisterDescription};
pub use self::lattice::{ClassLattice, Vertex, VertexId};
pub use self::register_class::{ClassId, PhysicalRegister, RegisterClass, RegisterId, RegisterSet};
pub use self::tables::{BoundTable, WorstTable};

use std::collections::HashMap;

use crate::error::MachineError;

#[derive(Clone, Debug)]
pub struct Machine {
    name: String,
    registers: Vec<PhysicalRegister>,
    classes: Vec<RegisterClass>,
    lattice: ClassLattice,
    worst: WorstTable,
    bound: BoundTable,
    common_subclass: Vec<Option<ClassId>>,
    superset_chain: Vec<Vec<ClassId>>,
    subclasses: Vec<Vec<ClassId>>,
}

impl Machine {
    pub fn from_description(description: &MachineDescription) -> Result<Machine, MachineError> {
        if description.registers.is_empty() {
            return Err(MachineError::NoRegisters(description.name.clone()));
        }
        let count = description.registers.len();
        let mut by_name: HashMap<&str, RegisterId> = HashMap::new();
        for (index, register) in description.registers.iter().enumerate() {
            if by_name
                .insert(register.name.as_str(), RegisterId(index as u32))
                .is_some()
            {
                return Err(MachineError::DuplicateRegister(register.name.clone()));
            }
        }
        let lookup = |owner: &str, name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| MachineError::UnknownRegister {
                    owner: owner.to_string(),
                    register: name.to_string(),
                })
        };

        // aliasing is the symmetric closure of the declared lists, plus the register itself
        let mut aliases: Vec<RegisterSet> = (0..count)
            .map(|index| RegisterSet::from_registers(count, Some(RegisterId(index as u32))))
            .collect();
        for (index, register) in description.registers.iter().enumerate() {
            for alias in &register.aliases {
                let alias = lookup(&register.name, alias)?;
                aliases[index].insert(alias);
                aliases[alias.index()].insert(RegisterId(index as u32));
            }
        }
        let registers: Vec<PhysicalRegister> = description
            .registers
            .iter()
            .zip(aliases)
            .enumerate()
            .map(|(index, (register, aliases))| PhysicalRegister {
                id: RegisterId(index as u32),
                name: register.name.clone(),
                aliases,
            })
            .collect();

        let mut classes = Vec::with_capacity(description.classes.len());
        for (index, class) in description.classes.iter().enumerate() {
            if description.classes[..index]
                .iter()
                .any(|c| c.name == class.name)
            {
                return Err(MachineError::DuplicateClass(class.name.clone()));
            }
            if class.registers.is_empty() {
                return Err(MachineError::EmptyClass(class.name.clone()));
            }
            if class.register_size == 0 {
                return Err(MachineError::ZeroRegisterSize(class.name.clone()));
            }
            let mut members = RegisterSet::new(count);
            for name in &class.registers {
                members.insert(lookup(&class.name, name)?);
            }
            let mut class_aliases = RegisterSet::new(count);
            for member in members.iter() {
                class_aliases.union_with(&registers[member.index()].aliases);
            }
            classes.push(RegisterClass {
                id: ClassId(index as u32),
                name: class.name.clone(),
                register_size: class.register_size,
                members,
                aliases: class_aliases,
                vertex: VertexId(0),
            });
        }

        for (index, a) in classes.iter().enumerate() {
            for b in &classes[index + 1..] {
                let nested = a.aliases.is_subset(&b.aliases) || b.aliases.is_subset(&a.aliases);
                if !nested && !a.aliases.is_disjoint(&b.aliases) {
                    return Err(MachineError::NotLaminar(a.name.clone(), b.name.clone()));
                }
            }
        }

        let alias_sets: Vec<RegisterSet> = classes.iter().map(|c| c.aliases.clone()).collect();
        let (lattice, class_vertex) = ClassLattice::build(&alias_sets);
        for (class, vertex) in classes.iter_mut().zip(class_vertex) {
            class.vertex = vertex;
        }

        let worst = WorstTable::build(&registers, &classes);
        let bound = BoundTable::build(&classes, &lattice);
        let common_subclass = common_subclass_table(&classes);
        let superset_chain = classes
            .iter()
            .map(|class| superset_chain(&classes, class))
            .collect();
        let subclasses = classes
            .iter()
            .map(|class| subclasses(&classes, &lattice, class))
            .collect();

        log::info!(
            "machine {}: {} registers, {} classes",
            description.name,
            registers.len(),
            classes.len()
        );
        Ok(Machine {
            name: description.name.clone(),
            registers,
            classes,
            lattice,
            worst,
            bound,
            common_subclass,
            superset_chain,
            subclasses,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registers(&self) -> &[PhysicalRegister] {
        &self.registers
    }

    pub fn register(&self, id: RegisterId) -> &PhysicalRegister {
        &self.registers[id.index()]
    }

    pub fn register_by_name(&self, name: &str) -> Option<RegisterId> {
        self.registers.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn aliases(&self, id: RegisterId) -> &RegisterSet {
        &self.registers[id.index()].aliases
    }

    pub fn classes(&self) -> &[RegisterClass] {
        &self.classes
    }

    pub fn class(&self, id: ClassId) -> &RegisterClass {
        &self.classes[id.index()]
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.classes.iter().find(|c| c.name == name).map(|c| c.id)
    }

    pub fn lattice(&self) -> &ClassLattice {
        &self.lattice
    }

    pub fn worst(&self) -> &WorstTable {
        &self.worst
    }

    pub fn bound(&self) -> &BoundTable {
        &self.bound
    }

    /// The largest class contained in both `a` and `b`, lowest id on ties.
    pub fn common_subclass(&self, a: ClassId, b: ClassId) -> Option<ClassId> {
        self.common_subclass[a.index() * self.classes.len() + b.index()]
    }

    /// Classes containing every member of `class`, smallest first, `class` itself leading.
    pub fn superset_chain(&self, class: ClassId) -> &[ClassId] {
        &self.superset_chain[class.index()]
    }

    /// Classes below `class` in the lattice, largest first.
    pub fn subclasses(&self, class: ClassId) -> &[ClassId] {
        &self.subclasses[class.index()]
    }
}

fn common_subclass_table(classes: &[RegisterClass]) -> Vec<Option<ClassId>> {
    let mut table = Vec::with_capacity(classes.len() * classes.len());
    for a in classes {
        for b in classes {
            let common = classes
                .iter()
                .filter(|c| c.members.is_subset(&a.members) && c.members.is_subset(&b.members))
                .min_by_key(|c| (std::cmp::Reverse(c.capacity()), c.id))
                .map(|c| c.id);
            table.push(common);
        }
    }
    table
}

fn superset_chain(classes: &[RegisterClass], class: &RegisterClass) -> Vec<ClassId> {
    let mut chain: Vec<&RegisterClass> = classes
        .iter()
        .filter(|c| c.id != class.id && class.members.is_subset(&c.members))
        .collect();
    chain.sort_by_key(|c| (c.capacity(), c.id));
    std::iter::once(class.id)
        .chain(chain.into_iter().map(|c| c.id))
        .collect()
}

fn subclasses(classes: &[RegisterClass], lattice: &ClassLattice, class: &RegisterClass) -> Vec<ClassId> {
    let mut below: Vec<&RegisterClass> = lattice
        .vertex(class.vertex)
        .deep_children
        .iter()
        .flat_map(|&v| lattice.vertex(v).classes.iter())
        .map(|&c| &classes[c.index()])
        .collect();
    below.sort_by_key(|c| (std::cmp::Reverse(c.capacity()), c.id));
    below.into_iter().map(|c| c.id).collect()
}
