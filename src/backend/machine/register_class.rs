use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use bitvec::prelude::BitVec;

use super::VertexId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

impl RegisterId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for RegisterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A set of physical registers of one machine, stored as a bit per register.
#[derive(Clone)]
pub struct RegisterSet {
    vector: BitVec,
}

impl RegisterSet {
    pub fn new(register_count: usize) -> RegisterSet {
        RegisterSet {
            vector: BitVec::repeat(false, register_count),
        }
    }

    pub fn from_registers<I: IntoIterator<Item = RegisterId>>(
        register_count: usize,
        registers: I,
    ) -> RegisterSet {
        let mut set = RegisterSet::new(register_count);
        for register in registers {
            set.insert(register);
        }
        set
    }

    pub fn insert(&mut self, register: RegisterId) -> bool {
        !self.vector.replace(register.index(), true)
    }

    pub fn remove(&mut self, register: RegisterId) -> bool {
        self.vector.replace(register.index(), false)
    }

    pub fn contains(&self, register: RegisterId) -> bool {
        register.index() < self.vector.len() && self.vector[register.index()]
    }

    /// Number of registers in the set.
    pub fn len(&self) -> usize {
        self.vector.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.not_any()
    }

    /// Registers in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = RegisterId> + '_ {
        self.vector.iter_ones().map(|index| RegisterId(index as u32))
    }

    pub fn union_with(&mut self, other: &RegisterSet) {
        for index in other.vector.iter_ones() {
            self.vector.set(index, true);
        }
    }

    pub fn subtract(&mut self, other: &RegisterSet) {
        for index in other.vector.iter_ones() {
            self.vector.set(index, false);
        }
    }

    pub fn intersection(&self, other: &RegisterSet) -> RegisterSet {
        let mut set = RegisterSet::new(self.vector.len());
        for register in self.iter().filter(|&r| other.contains(r)) {
            set.insert(register);
        }
        set
    }

    pub fn difference(&self, other: &RegisterSet) -> RegisterSet {
        let mut set = self.clone();
        set.subtract(other);
        set
    }

    pub fn intersection_len(&self, other: &RegisterSet) -> usize {
        self.iter().filter(|&r| other.contains(r)).count()
    }

    pub fn is_subset(&self, other: &RegisterSet) -> bool {
        self.iter().all(|r| other.contains(r))
    }

    pub fn is_disjoint(&self, other: &RegisterSet) -> bool {
        self.iter().all(|r| !other.contains(r))
    }
}

impl PartialEq for RegisterSet {
    fn eq(&self, other: &Self) -> bool {
        self.vector.as_bitslice() == other.vector.as_bitslice()
    }
}

impl Eq for RegisterSet {}

impl Hash for RegisterSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for index in self.vector.iter_ones() {
            index.hash(state);
        }
    }
}

impl Debug for RegisterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for register in self.iter() {
            write!(f, "{},", register)?;
        }
        write!(f, "]")
    }
}

#[derive(Clone, Debug)]
pub struct PhysicalRegister {
    pub id: RegisterId,
    pub name: String,
    /// Every register sharing storage with this one, itself included.
    pub aliases: RegisterSet,
}

#[derive(Clone, Debug)]
pub struct RegisterClass {
    pub id: ClassId,
    pub name: String,
    pub register_size: u32,
    pub members: RegisterSet,
    /// Union of the aliases of all members.
    pub aliases: RegisterSet,
    pub vertex: VertexId,
}

impl RegisterClass {
    pub fn capacity(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = RegisterId> + '_ {
        self.members.iter()
    }
}

impl Display for RegisterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
