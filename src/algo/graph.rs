//! Vertex graph construction.
//!
//! The clustering pipeline treats a triangle mesh as a graph whose nodes are
//! vertices and whose edges are triangle sides. [`GraphBuilder`] computes the
//! vertex-to-face incidence once and then produces, for any vertex subset, the
//! Laplacian of the induced subgraph. Edges that leave the subset are dropped,
//! so every row of an [`InducedLaplacian`] sums to zero.

use std::collections::HashSet;

use super::sparse::CsrMatrix;
use super::union_find::DisjointSet;

/// Vertex to incident-face mapping in CSR layout.
#[derive(Debug, Clone)]
pub struct VertexFaceIncidence {
    offsets: Vec<usize>,
    faces: Vec<usize>,
}

impl VertexFaceIncidence {
    /// Build the incidence of `num_vertices` vertices from a face list.
    ///
    /// # Panics
    ///
    /// Panics if a face references a vertex `>= num_vertices`.
    pub fn new(faces: &[[usize; 3]], num_vertices: usize) -> Self {
        let mut offsets = vec![0usize; num_vertices + 1];
        for face in faces {
            for &v in face {
                assert!(v < num_vertices, "face vertex {} out of range", v);
                offsets[v + 1] += 1;
            }
        }
        for i in 0..num_vertices {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut incident = vec![0usize; offsets[num_vertices]];
        for (fi, face) in faces.iter().enumerate() {
            for &v in face {
                incident[cursor[v]] = fi;
                cursor[v] += 1;
            }
        }

        Self {
            offsets,
            faces: incident,
        }
    }

    /// Number of vertices covered.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Faces touching vertex `v`.
    #[inline]
    pub fn faces_of(&self, v: usize) -> &[usize] {
        &self.faces[self.offsets[v]..self.offsets[v + 1]]
    }
}

/// Laplacian of the subgraph induced by a vertex subset.
///
/// Row/column `i` corresponds to the global vertex `vertices[i]`.
#[derive(Debug, Clone)]
pub struct InducedLaplacian {
    /// Local index to global vertex id.
    pub vertices: Vec<usize>,
    /// Square symmetric matrix of size `vertices.len()`.
    pub matrix: CsrMatrix,
}

impl InducedLaplacian {
    /// Number of vertices in the subset.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the subset is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

const NOT_IN_SUBSET: usize = usize::MAX;

/// Builds induced Laplacians over a fixed face list.
///
/// Holds a vertex-sized scratch table for subset membership, so one builder
/// is meant to be reused for every subset of a run.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    faces: &'a [[usize; 3]],
    incidence: VertexFaceIncidence,
    local_index: Vec<usize>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder for a mesh with `num_vertices` vertices.
    ///
    /// # Panics
    ///
    /// Panics if a face references a vertex `>= num_vertices`.
    pub fn new(faces: &'a [[usize; 3]], num_vertices: usize) -> Self {
        Self {
            faces,
            incidence: VertexFaceIncidence::new(faces, num_vertices),
            local_index: vec![NOT_IN_SUBSET; num_vertices],
        }
    }

    /// The vertex-face incidence this builder was created with.
    pub fn incidence(&self) -> &VertexFaceIncidence {
        &self.incidence
    }

    /// Build the Laplacian of the subgraph induced by `subset`.
    ///
    /// For each vertex, every incident face contributes a `-1` entry for each
    /// other face vertex inside the subset, and the vertex's diagonal counts
    /// those entries. An edge shared by two faces therefore weighs 2.
    ///
    /// # Panics
    ///
    /// Panics if `subset` holds an out-of-range or repeated vertex id.
    pub fn induced_laplacian(&mut self, subset: &[usize]) -> InducedLaplacian {
        let n = self.local_index.len();
        for (local, &v) in subset.iter().enumerate() {
            assert!(v < n, "subset vertex {} out of range ({} vertices)", v, n);
            assert_eq!(self.local_index[v], NOT_IN_SUBSET, "subset vertex {} repeated", v);
            self.local_index[v] = local;
        }

        let mut degree = vec![0.0f64; subset.len()];
        let mut triplets = Vec::with_capacity(subset.len() * 7);

        for (i, &v) in subset.iter().enumerate() {
            for &f in self.incidence.faces_of(v) {
                for &u in &self.faces[f] {
                    if u == v {
                        continue;
                    }
                    let j = self.local_index[u];
                    if j != NOT_IN_SUBSET {
                        degree[i] += 1.0;
                        triplets.push((i, j, -1.0));
                    }
                }
            }
        }

        for (i, &d) in degree.iter().enumerate() {
            triplets.push((i, i, d));
        }

        for &v in subset {
            self.local_index[v] = NOT_IN_SUBSET;
        }

        InducedLaplacian {
            vertices: subset.to_vec(),
            matrix: CsrMatrix::from_triplets(subset.len(), subset.len(), triplets),
        }
    }
}

/// Deduplicated undirected edge set of a face list.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: HashSet<(usize, usize)>,
}

impl EdgeSet {
    /// Collect the three sides of every face.
    pub fn from_faces(faces: &[[usize; 3]]) -> Self {
        let mut edges = HashSet::with_capacity(faces.len() * 3 / 2);
        for face in faces {
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
        Self { edges }
    }

    /// Whether `a` and `b` share an edge.
    #[inline]
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.edges.contains(&(a.min(b), a.max(b)))
    }

    /// Number of distinct edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Keep only the edges for which `keep(min, max)` returns true.
    pub fn retain<F: FnMut(usize, usize) -> bool>(&mut self, mut keep: F) {
        self.edges.retain(|&(a, b)| keep(a, b));
    }

    /// Iterate over edges as `(min, max)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }
}

/// Group `vertices` into the connected components of the subgraph they induce.
///
/// Components are returned in order of their smallest member, each sorted.
pub fn connected_components(edges: &EdgeSet, vertices: &[usize]) -> Vec<Vec<usize>> {
    let mut sets = DisjointSet::new(vertices.to_vec());
    let members: HashSet<usize> = vertices.iter().copied().collect();

    for (a, b) in edges.iter() {
        if members.contains(&a) && members.contains(&b) {
            sets.union(&a, &b);
        }
    }

    let mut groups = sets.groups();
    for g in &mut groups {
        g.sort_unstable();
    }
    groups.sort_unstable_by_key(|g| g[0]);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two triangles forming a quad: 0-1-2, 0-2-3.
    fn quad_faces() -> Vec<[usize; 3]> {
        vec![[0, 1, 2], [0, 2, 3]]
    }

    #[test]
    fn test_incidence() {
        let faces = quad_faces();
        let inc = VertexFaceIncidence::new(&faces, 5);
        assert_eq!(inc.num_vertices(), 5);
        assert_eq!(inc.faces_of(0), &[0, 1]);
        assert_eq!(inc.faces_of(1), &[0]);
        assert_eq!(inc.faces_of(2), &[0, 1]);
        assert_eq!(inc.faces_of(3), &[1]);
        assert!(inc.faces_of(4).is_empty());
    }

    #[test]
    fn test_full_laplacian_rows_sum_to_zero() {
        let faces = quad_faces();
        let mut builder = GraphBuilder::new(&faces, 4);
        let lap = builder.induced_laplacian(&[0, 1, 2, 3]);

        assert_eq!(lap.len(), 4);
        for i in 0..4 {
            let sum: f64 = lap.matrix.row(i).map(|(_, v)| v).sum();
            assert!(sum.abs() < 1e-12);
        }
        // Diagonal edge 0-2 is shared by both faces.
        assert_eq!(lap.matrix.get(0, 2), -2.0);
        assert_eq!(lap.matrix.get(0, 0), 4.0);
        assert_eq!(lap.matrix.get(1, 1), 2.0);
        assert_eq!(lap.matrix.get(1, 3), 0.0);
    }

    #[test]
    fn test_induced_laplacian_drops_outside_edges() {
        let faces = quad_faces();
        let mut builder = GraphBuilder::new(&faces, 4);
        // Subset {3, 0, 1}: edges 3-0 and 0-1 survive, 1-3 is not an edge.
        let lap = builder.induced_laplacian(&[3, 0, 1]);

        assert_eq!(lap.vertices, vec![3, 0, 1]);
        let dense = lap.matrix.to_dense();
        assert_eq!(dense[(0, 0)], 1.0);
        assert_eq!(dense[(1, 1)], 2.0);
        assert_eq!(dense[(2, 2)], 1.0);
        assert_eq!(dense[(0, 1)], -1.0);
        assert_eq!(dense[(1, 2)], -1.0);
        assert_eq!(dense[(0, 2)], 0.0);
        assert_eq!(dense, dense.transpose());
    }

    #[test]
    fn test_builder_is_reusable() {
        let faces = quad_faces();
        let mut builder = GraphBuilder::new(&faces, 4);
        let a = builder.induced_laplacian(&[0, 1]);
        let b = builder.induced_laplacian(&[2, 3]);
        assert_eq!(a.matrix.get(0, 1), -1.0);
        assert_eq!(b.matrix.get(0, 1), -1.0);
        assert_eq!(b.matrix.get(0, 0), 1.0);
    }

    #[test]
    #[should_panic]
    fn test_induced_laplacian_out_of_range_panics() {
        let faces = quad_faces();
        let mut builder = GraphBuilder::new(&faces, 4);
        builder.induced_laplacian(&[0, 9]);
    }

    #[test]
    fn test_edge_set_dedup() {
        let edges = EdgeSet::from_faces(&quad_faces());
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(2, 0));
        assert!(!edges.contains(1, 3));

        let mut inner = edges.clone();
        inner.retain(|a, b| a != 0 && b != 0);
        assert_eq!(inner.len(), 2);
        assert!(inner.contains(1, 2) && inner.contains(2, 3));
    }

    #[test]
    fn test_connected_components() {
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let edges = EdgeSet::from_faces(&faces);

        let comps = connected_components(&edges, &[5, 0, 1, 2, 3, 4]);
        assert_eq!(comps, vec![vec![0, 1, 2], vec![3, 4, 5]]);

        // Vertex 1 missing breaks nothing: 0-2 is still an edge.
        let comps = connected_components(&edges, &[0, 2, 4]);
        assert_eq!(comps, vec![vec![0, 2], vec![4]]);
    }
}
