//! Spatial pre-partitioning with an octree.
//!
//! Eigen-decomposition cost grows quickly with subset size, so large meshes
//! are first cut into spatially compact buckets of fewer than
//! `max_spectral_size` vertices. Each bucket is then partitioned spectrally
//! on its own.
//!
//! Nodes are cubes: the root is centered on the bounding box and its side is
//! the box's largest extent. A vertex falls in octant
//! `x_bit | y_bit << 1 | z_bit << 2`, where a bit is set when the coordinate
//! is `>=` the node center. Traversal uses an explicit stack.

use log::warn;
use nalgebra::{Point3, Vector3};

use crate::mesh::bounding_box;

/// Counters describing one octree traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    /// Nodes popped and classified.
    pub nodes: usize,
    /// Buckets handed to the callback.
    pub buckets: usize,
    /// Buckets emitted at the depth cap while still too large.
    pub forced_buckets: usize,
    /// Deepest node classified.
    pub max_depth: usize,
}

#[derive(Debug)]
struct OctreeNode {
    depth: usize,
    center: Point3<f64>,
    vertices: Vec<usize>,
}

/// Splits a point set into bounded-size, spatially compact buckets.
#[derive(Debug, Clone)]
pub struct SpatialPrepartitioner {
    max_spectral_size: usize,
    max_depth: usize,
}

impl SpatialPrepartitioner {
    /// Default cap on node depth.
    ///
    /// Only reached when many vertices share (nearly) the same position.
    pub const DEFAULT_MAX_DEPTH: usize = 16;

    /// Create a pre-partitioner emitting buckets of fewer than
    /// `max_spectral_size` vertices.
    pub fn new(max_spectral_size: usize) -> Self {
        Self {
            max_spectral_size,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the deepest node depth; buckets that would need a deeper node are
    /// emitted regardless of their size.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bucket all of `positions`, calling `emit` once per non-empty bucket.
    ///
    /// Every vertex id lands in exactly one bucket. If the whole set is
    /// already smaller than `max_spectral_size` it is emitted unsplit.
    pub fn for_each_bucket<F>(&self, positions: &[Point3<f64>], mut emit: F) -> OctreeStats
    where
        F: FnMut(Vec<usize>),
    {
        let mut stats = OctreeStats::default();
        let n = positions.len();

        let Some((min, max)) = bounding_box(positions) else {
            return stats;
        };

        // Small inputs skip classification so a mesh that already fits stays whole.
        if n < self.max_spectral_size {
            stats.buckets = 1;
            emit((0..n).collect());
            return stats;
        }

        let extent = (max - min).max();
        let mut stack = vec![OctreeNode {
            depth: 0,
            center: nalgebra::center(&min, &max),
            vertices: (0..n).collect(),
        }];
        let mut pending = n;
        let mut resolved = 0usize;

        while let Some(node) = stack.pop() {
            debug_assert_eq!(pending + resolved, n);
            pending -= node.vertices.len();
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(node.depth);

            let side = extent * 0.5f64.powi(node.depth as i32);
            let mut buckets: [Vec<usize>; 8] = Default::default();
            for &v in &node.vertices {
                buckets[octant_of(&positions[v], &node.center)].push(v);
            }

            let mut children = Vec::new();
            for (octant, bucket) in buckets.into_iter().enumerate() {
                if bucket.is_empty() {
                    continue;
                }

                if bucket.len() < self.max_spectral_size || node.depth >= self.max_depth {
                    if bucket.len() >= self.max_spectral_size {
                        warn!(
                            "octree depth cap {} reached, emitting bucket of {} vertices",
                            self.max_depth,
                            bucket.len()
                        );
                        stats.forced_buckets += 1;
                    }
                    resolved += bucket.len();
                    stats.buckets += 1;
                    emit(bucket);
                } else {
                    pending += bucket.len();
                    children.push(OctreeNode {
                        depth: node.depth + 1,
                        center: child_center(&node.center, side, octant),
                        vertices: bucket,
                    });
                }
            }

            // Lower octants are visited first.
            stack.extend(children.into_iter().rev());
        }

        debug_assert_eq!(resolved, n);
        stats
    }
}

/// Octant index of `p` relative to `center`.
#[inline]
pub fn octant_of(p: &Point3<f64>, center: &Point3<f64>) -> usize {
    (p.x >= center.x) as usize
        | ((p.y >= center.y) as usize) << 1
        | ((p.z >= center.z) as usize) << 2
}

/// Center of child `octant` of a node with the given center and side length.
#[inline]
pub fn child_center(center: &Point3<f64>, side: f64, octant: usize) -> Point3<f64> {
    let offset = 0.25 * side;
    let sign = |bit: usize| if octant & bit != 0 { offset } else { -offset };
    center + Vector3::new(sign(1), sign(2), sign(4))
}
