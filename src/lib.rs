//! # mesh-layout
//!
//! Cache-friendly vertex reordering for triangle meshes.
//!
//! Vertices are first grouped into small, graph-compact clusters: an octree
//! bounds the size of each subproblem, then every octree bucket is bisected
//! recursively by the sign of its Fiedler vector (the second eigenvector of
//! the induced graph Laplacian). Each cluster is then laid out contiguously,
//! ordered to minimize its edge span, with clusters processed in parallel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mesh_layout::prelude::*;
//!
//! let mut mesh = mesh_layout::io::load("model.ply").unwrap();
//!
//! let layout = compute_layout(&mesh, &ClusterOptions::default(), &LayoutOptions::default())
//!     .unwrap();
//! mesh.rearrange_vertices(&layout.old_to_new()).unwrap();
//!
//! mesh_layout::io::save(&mesh, "out.ply").unwrap();
//! ```
//!
//! ## Clustering Only
//!
//! ```
//! use mesh_layout::prelude::*;
//! use nalgebra::Point3;
//!
//! // A strip of 20 triangles.
//! let vertices: Vec<_> = (0..22)
//!     .map(|i| Point3::new((i / 2) as f64, (i % 2) as f64, 0.0))
//!     .collect();
//! let faces: Vec<_> = (0..20).map(|i| [i, i + 1, i + 2]).collect();
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = ClusterOptions::default().with_max_cluster_size(6);
//! let assignment = cluster_vertices(&mesh, &options).unwrap();
//!
//! assert!(assignment.is_complete());
//! for leaf in assignment.leaves() {
//!     assert!(leaf.size <= 6);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use mesh_layout::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::cluster::{cluster_vertices, ClusterAssignment, ClusterOptions, LeafReason};
    pub use crate::algo::layout::{
        compute_layout, optimize_layout, LayoutOptions, LayoutPermutation,
    };
    pub use crate::error::{LayoutError, Result, SpectralError};
    pub use crate::mesh::{build_from_polygons, build_from_triangles, TriangleMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_cluster_then_layout() {
        let (w, h) = (10, 10);
        let mut vertices = Vec::with_capacity(w * h);
        for j in 0..h {
            for i in 0..w {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..h - 1 {
            for i in 0..w - 1 {
                let v = j * w + i;
                faces.push([v, v + 1, v + w + 1]);
                faces.push([v, v + w + 1, v + w]);
            }
        }
        let mut mesh = build_from_triangles(&vertices, &faces).unwrap();

        let cluster_options = ClusterOptions::default().with_max_cluster_size(8);
        let assignment = cluster_vertices(&mesh, &cluster_options).unwrap();
        assert_eq!(assignment.cluster_ids().len(), w * h);
        assert!(assignment.is_complete());

        let layout = optimize_layout(mesh.faces(), &assignment, &LayoutOptions::default());
        assert_eq!(layout.len(), w * h);

        // Each cluster's vertices are contiguous in the new order.
        let old_to_new = layout.old_to_new();
        for cluster in assignment.clusters() {
            let positions: Vec<usize> = cluster.iter().map(|&v| old_to_new[v]).collect();
            let min = *positions.iter().min().unwrap();
            let max = *positions.iter().max().unwrap();
            assert_eq!(max - min + 1, cluster.len());
        }

        mesh.rearrange_vertices(&old_to_new).unwrap();
        assert_eq!(mesh.num_vertices(), w * h);
        assert_eq!(mesh.num_faces(), faces.len());
    }
}
