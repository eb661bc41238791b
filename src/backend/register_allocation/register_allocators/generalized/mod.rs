mod disjoint_set;
mod generalized;
mod graph;
mod group;
mod pressure;
mod select;
mod spill;
mod split;
mod stack;
mod write_back;

pub use disjoint_set::DisjointSet;
pub use generalized::{allocate, AllocSettings, Attempt};
pub use graph::{BitMatrix, InterferenceGraph, Overlap, RgNeighbor};
pub use group::{group_uses, GroupId, Partition, RegisterGroup, RegisterGroups};
pub use pressure::{raw_pressure, total_pressure, Pressure};
pub use select::select;
pub use spill::{select_spills, SpillDecision};
pub use split::{split, split_conflicts};
pub use stack::{stack, Stack};
pub use write_back::write_back;
