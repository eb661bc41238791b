use std::fmt::Display;

use smallvec::SmallVec;

use super::{ClassId, RegisterSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One node of the class forest: a distinct class alias set.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub id: VertexId,
    pub set: RegisterSet,
    pub parent: Option<VertexId>,
    pub children: SmallVec<[VertexId; 4]>,
    /// All strict descendants, nearest first.
    pub deep_children: Vec<VertexId>,
    pub classes: SmallVec<[ClassId; 2]>,
    /// Leaves are at height 1.
    pub height: u32,
}

/// Forest of class alias sets ordered by inclusion.
/// Built from a laminar family: any two sets either nest or are disjoint.
#[derive(Clone, Debug)]
pub struct ClassLattice {
    vertices: Vec<Vertex>,
    bottom_up: Vec<VertexId>,
    roots: Vec<VertexId>,
}

impl ClassLattice {
    /// Builds the forest and returns the vertex of each alias set, in input order.
    pub(super) fn build(alias_sets: &[RegisterSet]) -> (ClassLattice, Vec<VertexId>) {
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut class_vertex = Vec::with_capacity(alias_sets.len());
        for (class, set) in alias_sets.iter().enumerate() {
            let vertex = match vertices.iter().position(|v| &v.set == set) {
                Some(index) => index,
                None => {
                    vertices.push(Vertex {
                        id: VertexId(vertices.len() as u32),
                        set: set.clone(),
                        parent: None,
                        children: SmallVec::new(),
                        deep_children: Vec::new(),
                        classes: SmallVec::new(),
                        height: 1,
                    });
                    vertices.len() - 1
                }
            };
            vertices[vertex].classes.push(ClassId(class as u32));
            class_vertex.push(VertexId(vertex as u32));
        }

        for index in 0..vertices.len() {
            let size = vertices[index].set.len();
            let parent = vertices
                .iter()
                .filter(|v| v.set.len() > size && vertices[index].set.is_subset(&v.set))
                .min_by_key(|v| (v.set.len(), v.id))
                .map(|v| v.id);
            vertices[index].parent = parent;
            if let Some(parent) = parent {
                vertices[parent.index()].children.push(VertexId(index as u32));
            }
        }

        // children are strictly smaller than their parent
        let mut by_size: Vec<VertexId> = vertices.iter().map(|v| v.id).collect();
        by_size.sort_by_key(|&v| (vertices[v.index()].set.len(), v));
        for &v in &by_size {
            let vertex = &vertices[v.index()];
            let height = vertex
                .children
                .iter()
                .map(|c| vertices[c.index()].height + 1)
                .max()
                .unwrap_or(1);
            let mut deep_children = Vec::new();
            for &child in &vertex.children {
                deep_children.push(child);
            }
            for &child in &vertex.children {
                deep_children.extend_from_slice(&vertices[child.index()].deep_children);
            }
            let vertex = &mut vertices[v.index()];
            vertex.height = height;
            vertex.deep_children = deep_children;
        }

        let mut bottom_up: Vec<VertexId> = vertices.iter().map(|v| v.id).collect();
        bottom_up.sort_by_key(|&v| (vertices[v.index()].height, v));
        let roots: Vec<VertexId> = vertices
            .iter()
            .filter(|v| v.parent.is_none())
            .map(|v| v.id)
            .collect();

        log::debug!(
            "class lattice: {} vertices, {} roots",
            vertices.len(),
            roots.len()
        );
        (
            ClassLattice {
                vertices,
                bottom_up,
                roots,
            },
            class_vertex,
        )
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Every vertex, children before parents.
    pub fn bottom_up(&self) -> &[VertexId] {
        &self.bottom_up
    }

    pub fn roots(&self) -> &[VertexId] {
        &self.roots
    }

    /// The vertex for the intersection of two vertex sets, if it is not empty.
    pub fn intersection(&self, a: VertexId, b: VertexId) -> Option<VertexId> {
        if a == b || self.vertex(a).deep_children.contains(&b) {
            Some(b)
        } else if self.vertex(b).deep_children.contains(&a) {
            Some(a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::machine::RegisterId;

    fn set(registers: &[u32]) -> RegisterSet {
        RegisterSet::from_registers(8, registers.iter().map(|&r| RegisterId(r)))
    }

    #[test]
    fn forest_shape() {
        let (lattice, vertex_of) = ClassLattice::build(&[
            set(&[0, 1, 2, 3, 4, 5]),
            set(&[0, 1, 2, 3]),
            set(&[0, 1]),
            set(&[0, 1, 2, 3, 4, 5]),
            set(&[4]),
            set(&[6, 7]),
        ]);
        assert_eq!(lattice.len(), 5);
        assert_eq!(vertex_of[0], vertex_of[3]);
        assert_eq!(
            lattice.vertex(vertex_of[0]).classes.as_slice(),
            &[ClassId(0), ClassId(3)]
        );
        assert_eq!(lattice.vertex(vertex_of[2]).parent, Some(vertex_of[1]));
        assert_eq!(lattice.vertex(vertex_of[1]).parent, Some(vertex_of[0]));
        assert_eq!(lattice.vertex(vertex_of[4]).parent, Some(vertex_of[0]));
        assert_eq!(lattice.vertex(vertex_of[0]).height, 3);
        assert_eq!(lattice.vertex(vertex_of[4]).height, 1);
        assert_eq!(lattice.roots(), &[vertex_of[0], vertex_of[5]]);
        assert_eq!(lattice.vertex(vertex_of[0]).deep_children.len(), 3);
    }

    #[test]
    fn bottom_up_visits_children_first() {
        let (lattice, _) = ClassLattice::build(&[set(&[0, 1, 2, 3]), set(&[0, 1]), set(&[0]), set(&[2])]);
        let order = lattice.bottom_up();
        for vertex in lattice.vertices() {
            let position = order.iter().position(|&v| v == vertex.id).unwrap();
            for child in &vertex.children {
                assert!(order.iter().position(|v| v == child).unwrap() < position);
            }
        }
    }

    #[test]
    fn intersections() {
        let (lattice, v) = ClassLattice::build(&[set(&[0, 1, 2, 3]), set(&[0, 1]), set(&[2, 3])]);
        assert_eq!(lattice.intersection(v[0], v[1]), Some(v[1]));
        assert_eq!(lattice.intersection(v[2], v[0]), Some(v[2]));
        assert_eq!(lattice.intersection(v[1], v[1]), Some(v[1]));
        assert_eq!(lattice.intersection(v[1], v[2]), None);
    }
}
