//! Hierarchical vertex clustering.
//!
//! Vertices are grouped into small, graph-compact clusters in two stages:
//!
//! 1. [`SpatialPrepartitioner`] cuts the vertex set into octree buckets of
//!    fewer than `max_spectral_size` vertices.
//! 2. [`RecursivePartitioner`] bisects each bucket by the sign of its Fiedler
//!    vector until pieces are small enough or deep enough.
//!
//! Every vertex ends up in exactly one cluster. Subsets the eigensolver
//! cannot split (non-convergence, disconnected induced subgraph) become one
//! cluster each; their [`ClusterLeaf::reason`] records why.
//!
//! # Example
//!
//! ```
//! use mesh_layout::prelude::*;
//! use mesh_layout::algo::cluster::{cluster_vertices, ClusterOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = ClusterOptions::default().with_max_cluster_size(4);
//! let assignment = cluster_vertices(&mesh, &options).unwrap();
//! assert_eq!(assignment.num_clusters(), 1);
//! ```

mod octree;
mod partition;

pub use octree::{child_center, octant_of, OctreeStats, SpatialPrepartitioner};
pub use partition::RecursivePartitioner;

use log::info;
use nalgebra::Point3;

use super::eigen::{LobpcgSolver, SymmetricEigensolver};
use super::graph::GraphBuilder;
use super::Progress;
use crate::error::{LayoutError, Result, SpectralError};
use crate::mesh::{validate_faces, TriangleMesh};

/// Options for vertex clustering.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Deepest bisection level; subsets at this depth become clusters.
    pub max_depth: usize,

    /// Subsets of at most this many vertices become clusters.
    pub max_cluster_size: usize,

    /// Octree buckets hold fewer than this many vertices.
    pub max_spectral_size: usize,

    /// Eigensolver iteration budget per bisection.
    pub max_iterations: usize,

    /// Eigensolver relative residual tolerance.
    pub tolerance: f64,

    /// Deepest octree level before oversized buckets are emitted anyway.
    pub max_octree_depth: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_cluster_size: 100,
            max_spectral_size: 10_000,
            max_iterations: 100_000,
            tolerance: 1e-5,
            max_octree_depth: SpatialPrepartitioner::DEFAULT_MAX_DEPTH,
        }
    }
}

impl ClusterOptions {
    /// Set the maximum bisection depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the leaf size threshold.
    pub fn with_max_cluster_size(mut self, max_cluster_size: usize) -> Self {
        self.max_cluster_size = max_cluster_size;
        self
    }

    /// Set the octree bucket size threshold.
    pub fn with_max_spectral_size(mut self, max_spectral_size: usize) -> Self {
        self.max_spectral_size = max_spectral_size;
        self
    }

    /// Set the eigensolver iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the eigensolver tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the octree depth cap.
    pub fn with_max_octree_depth(mut self, max_octree_depth: usize) -> Self {
        self.max_octree_depth = max_octree_depth;
        self
    }

    /// Check that the options describe a runnable configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_spectral_size == 0 {
            return Err(LayoutError::invalid_param(
                "max_spectral_size",
                self.max_spectral_size,
                "must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(LayoutError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be positive",
            ));
        }
        Ok(())
    }

    /// The default eigensolver configured with these options.
    pub fn solver(&self) -> LobpcgSolver {
        LobpcgSolver::default()
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
    }
}

/// Why a subset stopped being split.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafReason {
    /// Size reached `max_cluster_size`.
    SizeLimit,
    /// Depth reached `max_depth`.
    DepthLimit,
    /// The spectral split failed.
    Unsplittable(SpectralError),
}

/// Record of one emitted cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLeaf {
    /// Dense cluster id.
    pub id: usize,
    /// Bisection depth within its octree bucket.
    pub depth: usize,
    /// Number of member vertices.
    pub size: usize,
    /// Termination reason.
    pub reason: LeafReason,
}

/// Summary of cluster sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClusterStats {
    /// Number of clusters.
    pub num_clusters: usize,
    /// Smallest cluster size.
    pub min_size: usize,
    /// Largest cluster size.
    pub max_size: usize,
    /// Mean cluster size.
    pub mean_size: f64,
}

/// Dense cluster id per vertex, filled one leaf at a time.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    cluster_of: Vec<usize>,
    leaves: Vec<ClusterLeaf>,
    assigned: usize,
}

impl ClusterAssignment {
    /// Marker for a vertex without a cluster in [`cluster_ids`](Self::cluster_ids).
    pub const UNASSIGNED: usize = usize::MAX;

    /// An assignment over `num_vertices` vertices with no clusters yet.
    pub fn new(num_vertices: usize) -> Self {
        Self {
            cluster_of: vec![Self::UNASSIGNED; num_vertices],
            leaves: Vec::new(),
            assigned: 0,
        }
    }

    /// Build an assignment from explicit per-vertex cluster ids.
    ///
    /// Ids must be dense: every id in `0..max + 1` is used at least once.
    /// Leaves are recorded at depth 0 with [`LeafReason::SizeLimit`].
    pub fn from_ids(ids: Vec<usize>) -> Result<Self> {
        let max = ids.iter().max().copied();
        if let Some(max) = max.filter(|&m| m >= ids.len()) {
            return Err(LayoutError::invalid_param(
                "cluster ids",
                max,
                "must be dense",
            ));
        }

        let num_clusters = max.map_or(0, |m| m + 1);
        let mut sizes = vec![0usize; num_clusters];
        for &id in &ids {
            sizes[id] += 1;
        }
        if let Some(missing) = sizes.iter().position(|&s| s == 0) {
            return Err(LayoutError::invalid_param(
                "cluster ids",
                missing,
                "must be dense",
            ));
        }

        let leaves = sizes
            .into_iter()
            .enumerate()
            .map(|(id, size)| ClusterLeaf {
                id,
                depth: 0,
                size,
                reason: LeafReason::SizeLimit,
            })
            .collect();
        Ok(Self {
            assigned: ids.len(),
            cluster_of: ids,
            leaves,
        })
    }

    /// Give every vertex of `vertices` the next cluster id.
    ///
    /// # Panics
    ///
    /// Panics if a vertex is out of range or already assigned.
    pub(crate) fn push_leaf(&mut self, vertices: &[usize], depth: usize, reason: LeafReason) {
        let id = self.leaves.len();
        for &v in vertices {
            assert_eq!(
                self.cluster_of[v],
                Self::UNASSIGNED,
                "vertex {} assigned twice",
                v
            );
            self.cluster_of[v] = id;
        }
        self.assigned += vertices.len();
        self.leaves.push(ClusterLeaf {
            id,
            depth,
            size: vertices.len(),
            reason,
        });
    }

    /// Number of vertices covered by the assignment.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.cluster_of.len()
    }

    /// Number of clusters emitted.
    #[inline]
    pub fn num_clusters(&self) -> usize {
        self.leaves.len()
    }

    /// Cluster id per vertex.
    #[inline]
    pub fn cluster_ids(&self) -> &[usize] {
        &self.cluster_of
    }

    /// Cluster id of vertex `v`, if it has one.
    #[inline]
    pub fn cluster_of(&self, v: usize) -> Option<usize> {
        self.cluster_of
            .get(v)
            .copied()
            .filter(|&id| id != Self::UNASSIGNED)
    }

    /// Leaf records, indexed by cluster id.
    #[inline]
    pub fn leaves(&self) -> &[ClusterLeaf] {
        &self.leaves
    }

    /// Whether every vertex has a cluster.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.assigned == self.cluster_of.len()
    }

    /// Member vertices of each cluster, ascending, indexed by cluster id.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters: Vec<Vec<usize>> = self
            .leaves
            .iter()
            .map(|leaf| Vec::with_capacity(leaf.size))
            .collect();
        for (v, &id) in self.cluster_of.iter().enumerate() {
            if id != Self::UNASSIGNED {
                clusters[id].push(v);
            }
        }
        clusters
    }

    /// Cluster size summary.
    pub fn stats(&self) -> ClusterStats {
        if self.leaves.is_empty() {
            return ClusterStats::default();
        }

        let sizes = self.leaves.iter().map(|leaf| leaf.size);
        let total: usize = sizes.clone().sum();
        ClusterStats {
            num_clusters: self.leaves.len(),
            min_size: sizes.clone().min().unwrap_or(0),
            max_size: sizes.max().unwrap_or(0),
            mean_size: total as f64 / self.leaves.len() as f64,
        }
    }
}

/// Cluster the vertices of a mesh.
///
/// # Example
///
/// ```
/// use mesh_layout::prelude::*;
/// use mesh_layout::algo::cluster::{cluster_vertices, ClusterOptions};
/// use nalgebra::Point3;
///
/// let vertices: Vec<_> = (0..30)
///     .map(|i| Point3::new((i / 2) as f64, (i % 2) as f64, 0.0))
///     .collect();
/// let faces: Vec<_> = (0..28).map(|i| [i, i + 1, i + 2]).collect();
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
///
/// let options = ClusterOptions::default().with_max_cluster_size(8);
/// let assignment = cluster_vertices(&mesh, &options).unwrap();
/// assert!(assignment.is_complete());
/// assert!(assignment.num_clusters() >= 4);
/// ```
pub fn cluster_vertices(
    mesh: &TriangleMesh,
    options: &ClusterOptions,
) -> Result<ClusterAssignment> {
    cluster_vertices_with_progress(mesh, options, &Progress::none())
}

/// Cluster the vertices of a mesh, reporting covered vertices.
pub fn cluster_vertices_with_progress(
    mesh: &TriangleMesh,
    options: &ClusterOptions,
    progress: &Progress,
) -> Result<ClusterAssignment> {
    cluster_with_solver(
        mesh.positions(),
        mesh.faces(),
        options,
        options.solver(),
        progress,
    )
}

/// Cluster raw positions and faces with a caller-supplied eigensolver.
///
/// `options.max_iterations` and `options.tolerance` are not applied to
/// `solver`; it is used as configured.
pub fn cluster_with_solver<S: SymmetricEigensolver>(
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
    options: &ClusterOptions,
    solver: S,
    progress: &Progress,
) -> Result<ClusterAssignment> {
    options.validate()?;
    let n = positions.len();
    validate_faces(faces, n)?;

    let mut graph = GraphBuilder::new(faces, n);
    let mut assignment = ClusterAssignment::new(n);
    let partitioner =
        RecursivePartitioner::new(solver, options.max_depth, options.max_cluster_size);
    let octree = SpatialPrepartitioner::new(options.max_spectral_size)
        .with_max_depth(options.max_octree_depth);

    let mut covered = 0usize;
    let octree_stats = octree.for_each_bucket(positions, |bucket| {
        covered += bucket.len();
        partitioner.partition(&mut graph, bucket, &mut assignment);
        progress.report(covered, n, "Clustering vertices");
    });

    let unsplittable = assignment
        .leaves()
        .iter()
        .filter(|leaf| matches!(leaf.reason, LeafReason::Unsplittable(_)))
        .count();
    info!(
        "clustered {} vertices into {} clusters ({} octree buckets, {} unsplittable)",
        n,
        assignment.num_clusters(),
        octree_stats.buckets,
        unsplittable
    );

    debug_assert!(assignment.is_complete());
    Ok(assignment)
}
