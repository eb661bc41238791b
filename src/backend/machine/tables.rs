use std::collections::HashSet;

use super::{ClassId, ClassLattice, PhysicalRegister, RegisterClass, RegisterSet, VertexId};

/// Frontier size above which worst-case coverage falls back to a greedy upper bound.
const FRONTIER_LIMIT: usize = 4096;

/// `worst(N, C, m)`: the most registers of class N that m registers of class C can
/// block through aliasing. Indexed `[N][C]`, with one entry per m in `0..=|C|`.
#[derive(Clone, Debug)]
pub struct WorstTable {
    class_count: usize,
    values: Vec<Vec<u32>>,
}

impl WorstTable {
    pub(super) fn build(registers: &[PhysicalRegister], classes: &[RegisterClass]) -> WorstTable {
        let class_count = classes.len();
        let mut values = Vec::with_capacity(class_count * class_count);
        for n in classes {
            for c in classes {
                values.push(worst_case_coverage(registers, n, c));
            }
        }
        WorstTable {
            class_count,
            values,
        }
    }

    /// Values of m past the capacity of C are answered as if m were `|C|`.
    pub fn get(&self, n: ClassId, c: ClassId, m: usize) -> u32 {
        let row = &self.values[n.index() * self.class_count + c.index()];
        row[m.min(row.len() - 1)]
    }

    /// Shorthand for `get(n, c, 1)`.
    pub fn worst(&self, n: ClassId, c: ClassId) -> u32 {
        self.get(n, c, 1)
    }
}

fn worst_case_coverage(
    registers: &[PhysicalRegister],
    n: &RegisterClass,
    c: &RegisterClass,
) -> Vec<u32> {
    let coverage: Vec<RegisterSet> = c
        .iter()
        .map(|r| registers[r.index()].aliases.intersection(&n.members))
        .collect();
    let reachable = n.members.intersection(&c.aliases).len() as u32;
    let capacity = c.capacity();

    let mut row = vec![0u32; capacity + 1];
    let mut frontier: HashSet<RegisterSet> = HashSet::new();
    frontier.insert(RegisterSet::new(registers.len()));
    for m in 1..=capacity {
        let mut next = HashSet::with_capacity(frontier.len() * coverage.len());
        for covered in &frontier {
            for register in &coverage {
                let mut union = covered.clone();
                union.union_with(register);
                next.insert(union);
            }
        }
        row[m] = next.iter().map(|s| s.len() as u32).max().unwrap_or(0);
        if row[m] == reachable {
            for value in &mut row[m..] {
                *value = reachable;
            }
            break;
        }
        if next.len() > FRONTIER_LIMIT {
            log::debug!(
                "worst({}, {}) exceeds the search frontier at m = {}, bounding greedily",
                n,
                c,
                m
            );
            let mut sizes: Vec<u32> = coverage.iter().map(|s| s.len() as u32).collect();
            sizes.sort_unstable_by(|a, b| b.cmp(a));
            for later in (m + 1)..=capacity {
                let bound: u32 = sizes.iter().take(later).sum();
                row[later] = bound.min(reachable);
            }
            break;
        }
        frontier = next;
    }
    row
}

/// `bound(N, v)`: how many registers of class N the vertex v can hold at most.
#[derive(Clone, Debug)]
pub struct BoundTable {
    vertex_count: usize,
    values: Vec<u32>,
}

impl BoundTable {
    pub(super) fn build(classes: &[RegisterClass], lattice: &ClassLattice) -> BoundTable {
        let vertex_count = lattice.len();
        let mut values = Vec::with_capacity(classes.len() * vertex_count);
        for n in classes {
            for vertex in lattice.vertices() {
                values.push(n.members.intersection_len(&vertex.set) as u32);
            }
        }
        BoundTable {
            vertex_count,
            values,
        }
    }

    pub fn get(&self, n: ClassId, vertex: VertexId) -> u32 {
        self.values[n.index() * self.vertex_count + vertex.index()]
    }
}
