//! Per-cluster vertex ordering.
//!
//! Given a finished [`ClusterAssignment`], each cluster is laid out in a
//! contiguous range of the output order, clusters in id order. Within a
//! cluster the vertices are ordered to minimize the edge span
//!
//! ```text
//! span(order) = Σ (j - i)   over positions i < j whose vertices share an edge
//! ```
//!
//! Clusters of up to `max_exhaustive_size` vertices are searched
//! exhaustively in lexicographic permutation order; the first minimum found
//! wins. Larger clusters get a breadth-first (Cuthill-McKee) ordering.
//! Clusters are independent and are processed in parallel with rayon.
//!
//! # Example
//!
//! ```
//! use mesh_layout::algo::cluster::ClusterAssignment;
//! use mesh_layout::algo::layout::{optimize_layout, LayoutOptions};
//!
//! // A strip of four triangles whose vertex ids are shuffled along the strip.
//! let chain = [3, 0, 4, 1, 5, 2];
//! let faces: Vec<_> = chain.windows(3).map(|w| [w[0], w[1], w[2]]).collect();
//! let assignment = ClusterAssignment::from_ids(vec![0; 6]).unwrap();
//!
//! let layout = optimize_layout(&faces, &assignment, &LayoutOptions::default());
//! assert_eq!(layout.order(), &[2, 5, 1, 4, 0, 3]);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::info;
use rayon::prelude::*;

use super::cluster::{cluster_vertices_with_progress, ClusterAssignment, ClusterOptions};
use super::graph::EdgeSet;
use super::Progress;
use crate::error::Result;
use crate::mesh::TriangleMesh;

/// Options for layout optimization.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Largest cluster searched exhaustively.
    ///
    /// The search visits `k!` permutations for a cluster of `k` vertices.
    pub max_exhaustive_size: usize,

    /// Whether to optimize clusters in parallel (default: true).
    pub parallel: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_exhaustive_size: 8,
            parallel: true,
        }
    }
}

impl LayoutOptions {
    /// Set the largest cluster searched exhaustively.
    pub fn with_max_exhaustive_size(mut self, max_exhaustive_size: usize) -> Self {
        self.max_exhaustive_size = max_exhaustive_size;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// A vertex order: original vertex id at each new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPermutation {
    new_to_old: Vec<usize>,
}

impl LayoutPermutation {
    /// Original vertex id per new position.
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.new_to_old
    }

    /// New position per original vertex id.
    ///
    /// This is the mapping [`TriangleMesh::rearrange_vertices`] expects.
    pub fn old_to_new(&self) -> Vec<usize> {
        let mut old_to_new = vec![0; self.new_to_old.len()];
        for (new, &old) in self.new_to_old.iter().enumerate() {
            old_to_new[old] = new;
        }
        old_to_new
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.new_to_old.len()
    }

    /// Whether the order is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.new_to_old.is_empty()
    }

    /// Consume into the new-to-old vector.
    pub fn into_order(self) -> Vec<usize> {
        self.new_to_old
    }
}

/// Edge span of a vertex sequence.
pub fn edge_span(order: &[usize], edges: &EdgeSet) -> usize {
    let mut span = 0;
    for i in 0..order.len() {
        for j in i + 1..order.len() {
            if edges.contains(order[i], order[j]) {
                span += j - i;
            }
        }
    }
    span
}

/// Order every cluster of `assignment` for low edge span.
///
/// # Panics
///
/// Panics if `assignment` does not cover every vertex.
pub fn optimize_layout(
    faces: &[[usize; 3]],
    assignment: &ClusterAssignment,
    options: &LayoutOptions,
) -> LayoutPermutation {
    optimize_layout_with_progress(faces, assignment, options, &Progress::none())
}

/// Order every cluster of `assignment`, reporting finished clusters.
///
/// # Panics
///
/// Panics if `assignment` does not cover every vertex.
pub fn optimize_layout_with_progress(
    faces: &[[usize; 3]],
    assignment: &ClusterAssignment,
    options: &LayoutOptions,
    progress: &Progress,
) -> LayoutPermutation {
    assert!(
        assignment.is_complete(),
        "every vertex needs a cluster before layout"
    );

    let start = Instant::now();
    let adjacency = vertex_adjacency(&EdgeSet::from_faces(faces), assignment.num_vertices());
    let clusters = assignment.clusters();
    let total = clusters.len();

    let mut order = vec![0usize; assignment.num_vertices()];
    let mut ranges: Vec<&mut [usize]> = Vec::with_capacity(total);
    let mut rest: &mut [usize] = &mut order;
    for cluster in &clusters {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(cluster.len());
        ranges.push(head);
        rest = tail;
    }
    debug_assert!(rest.is_empty());

    let done = AtomicUsize::new(0);
    let order_one = |(cluster, out): (&Vec<usize>, &mut [usize])| {
        order_cluster(cluster, &adjacency, options.max_exhaustive_size, out);
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress.report(finished, total, "Optimizing layout");
    };

    if options.parallel {
        clusters.par_iter().zip(ranges.into_par_iter()).for_each(order_one);
    } else {
        clusters.iter().zip(ranges).for_each(order_one);
    }

    info!(
        "ordered {} clusters ({} vertices) in {:.2?}",
        total,
        order.len(),
        start.elapsed()
    );
    LayoutPermutation { new_to_old: order }
}

/// Cluster a mesh and order its vertices.
pub fn compute_layout(
    mesh: &TriangleMesh,
    cluster_options: &ClusterOptions,
    layout_options: &LayoutOptions,
) -> Result<LayoutPermutation> {
    compute_layout_with_progress(mesh, cluster_options, layout_options, &Progress::none())
}

/// Cluster a mesh and order its vertices, reporting both stages.
pub fn compute_layout_with_progress(
    mesh: &TriangleMesh,
    cluster_options: &ClusterOptions,
    layout_options: &LayoutOptions,
    progress: &Progress,
) -> Result<LayoutPermutation> {
    let assignment = cluster_vertices_with_progress(mesh, cluster_options, progress)?;
    Ok(optimize_layout_with_progress(
        mesh.faces(),
        &assignment,
        layout_options,
        progress,
    ))
}

/// Sorted neighbor lists per vertex. Edges touching ids `>= num_vertices`
/// are ignored.
fn vertex_adjacency(edges: &EdgeSet, num_vertices: usize) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); num_vertices];
    for (a, b) in edges.iter() {
        if b < num_vertices {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    for neighbors in &mut adjacency {
        neighbors.sort_unstable();
    }
    adjacency
}

/// Write the best order of `vertices` (ascending) into `out`.
fn order_cluster(
    vertices: &[usize],
    adjacency: &[Vec<usize>],
    max_exhaustive_size: usize,
    out: &mut [usize],
) {
    debug_assert_eq!(vertices.len(), out.len());
    let k = vertices.len();
    if k <= 1 {
        out.copy_from_slice(vertices);
        return;
    }

    // Neighbors in cluster-local indices, ascending.
    let local_neighbors: Vec<Vec<usize>> = vertices
        .iter()
        .map(|&v| {
            adjacency[v]
                .iter()
                .filter_map(|u| vertices.binary_search(u).ok())
                .collect()
        })
        .collect();

    let local = if k <= max_exhaustive_size {
        exhaustive_order(&local_neighbors)
    } else {
        breadth_first_order(&local_neighbors)
    };

    for (slot, &l) in out.iter_mut().zip(&local) {
        *slot = vertices[l];
    }
}

fn local_span(perm: &[usize], adjacent: &[bool], k: usize) -> usize {
    let mut span = 0;
    for i in 0..perm.len() {
        let row = perm[i] * k;
        for (j, &b) in perm.iter().enumerate().skip(i + 1) {
            if adjacent[row + b] {
                span += j - i;
            }
        }
    }
    span
}

/// Minimum-span permutation of `0..k`, first in lexicographic order.
fn exhaustive_order(neighbors: &[Vec<usize>]) -> Vec<usize> {
    let k = neighbors.len();
    let mut adjacent = vec![false; k * k];
    for (a, list) in neighbors.iter().enumerate() {
        for &b in list {
            adjacent[a * k + b] = true;
        }
    }
    let adjacent = adjacent.as_slice();

    let mut perm: Vec<usize> = (0..k).collect();
    let mut best = perm.clone();
    let mut best_span = local_span(&perm, adjacent, k);

    while next_permutation(&mut perm) {
        let span = local_span(&perm, adjacent, k);
        if span < best_span {
            best_span = span;
            best.copy_from_slice(&perm);
        }
    }
    best
}

/// Advance to the next lexicographic permutation; false after the last.
fn next_permutation(perm: &mut [usize]) -> bool {
    let n = perm.len();
    if n < 2 {
        return false;
    }

    let mut i = n - 1;
    while i > 0 && perm[i - 1] >= perm[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let mut j = n - 1;
    while perm[j] <= perm[i - 1] {
        j -= 1;
    }
    perm.swap(i - 1, j);
    perm[i..].reverse();
    true
}

/// Cuthill-McKee order of `0..k`.
///
/// Each component starts at its lowest-degree vertex; neighbors are queued
/// by ascending degree, then index.
fn breadth_first_order(neighbors: &[Vec<usize>]) -> Vec<usize> {
    let k = neighbors.len();
    let degree: Vec<usize> = neighbors.iter().map(Vec::len).collect();

    let mut visited = vec![false; k];
    let mut order = Vec::with_capacity(k);
    let mut queue = VecDeque::new();

    while order.len() < k {
        let seed = (0..k)
            .filter(|&v| !visited[v])
            .min_by_key(|&v| (degree[v], v))
            .unwrap_or(0);
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            let mut next: Vec<usize> = neighbors[v]
                .iter()
                .copied()
                .filter(|&u| !visited[u])
                .collect();
            next.sort_by_key(|&u| (degree[u], u));
            for u in next {
                visited[u] = true;
                queue.push_back(u);
            }
        }
    }
    order
}
