use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use bitvec::prelude::BitVec;
use smallvec::SmallVec;

use crate::backend::register_allocation::{BlockId, LinkageId, Program, UseId};

use super::{GroupId, RegisterGroups};

/// A use of another group lying inside the span of an active linkage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
    pub linkage: LinkageId,
    pub reg_use: UseId,
}

/// An interference edge. `first < second`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgNeighbor {
    pub first: GroupId,
    pub second: GroupId,
    pub overlaps: SmallVec<[Overlap; 2]>,
}

pub struct InterferenceGraph {
    bit_matrix: BitMatrix,
    adjacency_list: Vec<SmallVec<[GroupId; 4]>>,
    neighbors: Vec<RgNeighbor>,
    edge_index: BTreeMap<(GroupId, GroupId), usize>,
}

impl InterferenceGraph {
    pub fn build(program: &Program, groups: &RegisterGroups) -> InterferenceGraph {
        let mut blocks: BTreeMap<BlockId, Vec<(u32, UseId)>> = BTreeMap::new();
        for reg_use in program.uses() {
            if let (Some(position), Some(_)) = (reg_use.position, groups.group_of(reg_use.id)) {
                blocks
                    .entry(position.block)
                    .or_default()
                    .push((position.position, reg_use.id));
            }
        }
        for uses in blocks.values_mut() {
            uses.sort_unstable();
        }

        let mut edges: BTreeMap<(GroupId, GroupId), SmallVec<[Overlap; 2]>> = BTreeMap::new();
        for linkage in program.linkages().iter().filter(|l| l.broken.is_active()) {
            let (first, second) = (program.reg_use(linkage.first), program.reg_use(linkage.second));
            let (a, b) = match (first.position, second.position) {
                (Some(a), Some(b)) if a.block == b.block => (a, b),
                _ => continue,
            };
            let group = match groups.group_of(first.id) {
                Some(group) => group,
                None => continue,
            };
            let (start, end) = (a.position.min(b.position), a.position.max(b.position));
            let uses = match blocks.get(&a.block) {
                Some(uses) => uses,
                None => continue,
            };
            let low = uses.partition_point(|&(p, _)| p < start);
            let high = uses.partition_point(|&(p, _)| p <= end);
            for &(_, inside) in &uses[low..high] {
                let other = match groups.group_of(inside) {
                    Some(other) if other != group => other,
                    _ => continue,
                };
                edges
                    .entry((group.min(other), group.max(other)))
                    .or_default()
                    .push(Overlap {
                        linkage: linkage.id,
                        reg_use: inside,
                    });
            }
        }

        let mut bit_matrix = BitMatrix::new(groups.len());
        let mut adjacency_list = vec![SmallVec::new(); groups.len()];
        let mut neighbors = Vec::with_capacity(edges.len());
        let mut edge_index = BTreeMap::new();
        for ((first, second), overlaps) in edges {
            bit_matrix.replace(first.0, second.0, true);
            adjacency_list[first.index()].push(second);
            adjacency_list[second.index()].push(first);
            edge_index.insert((first, second), neighbors.len());
            neighbors.push(RgNeighbor {
                first,
                second,
                overlaps,
            });
        }
        for list in &mut adjacency_list {
            list.sort_unstable();
        }
        log::debug!(
            "interference graph: {} groups, {} edges",
            groups.len(),
            neighbors.len()
        );
        InterferenceGraph {
            bit_matrix,
            adjacency_list,
            neighbors,
            edge_index,
        }
    }

    pub fn interfere(&self, x: GroupId, y: GroupId) -> bool {
        x != y && self.bit_matrix.get(x.0, y.0)
    }

    /// Neighbours of `group` in ascending id order.
    pub fn neighbors_of(&self, group: GroupId) -> &[GroupId] {
        &self.adjacency_list[group.index()]
    }

    pub fn degree(&self, group: GroupId) -> usize {
        self.adjacency_list[group.index()].len()
    }

    pub fn edges(&self) -> &[RgNeighbor] {
        &self.neighbors
    }

    pub fn edge(&self, x: GroupId, y: GroupId) -> Option<&RgNeighbor> {
        self.edge_index
            .get(&(x.min(y), x.max(y)))
            .map(|&index| &self.neighbors[index])
    }

    /// Linkages whose breaking would remove the edge between `x` and `y`.
    pub fn linkages_between(&self, x: GroupId, y: GroupId) -> BTreeSet<LinkageId> {
        self.edge(x, y)
            .map(|edge| edge.overlaps.iter().map(|o| o.linkage).collect())
            .unwrap_or_default()
    }
}

impl Debug for InterferenceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bitmatrix:{:?}", self.bit_matrix)?;
        writeln!(f, "adjacency lists:")?;
        for (group, adjacencies) in self.adjacency_list.iter().enumerate() {
            writeln!(f, "\tg{} => {:?}", group, adjacencies)?;
        }
        Ok(())
    }
}

/// Lower triangle of a symmetric boolean matrix.
pub struct BitMatrix {
    vector: BitVec,
    size: usize,
}

impl BitMatrix {
    pub fn new(size: usize) -> BitMatrix {
        let len = (size * size + 1) / 2;
        BitMatrix {
            vector: BitVec::repeat(false, len),
            size,
        }
    }
    fn to_index(x: u32, y: u32) -> usize {
        debug_assert_ne!(x, y);
        let i = std::cmp::min(x, y) as usize;
        let j = std::cmp::max(x, y) as usize;
        (j * (j - 1)) / 2 + i
    }
    pub fn get(&self, x: u32, y: u32) -> bool {
        let index = BitMatrix::to_index(x, y);
        self.vector[index]
    }
    pub fn replace(&mut self, x: u32, y: u32, value: bool) -> bool {
        let index = BitMatrix::to_index(x, y);
        self.vector.replace(index, value)
    }
}

impl Debug for BitMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        for i in 1..self.size {
            write!(f, "{:4}:[", i)?;
            for j in 0..i {
                write!(f, "{}", self.get(i as u32, j as u32) as u32)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
