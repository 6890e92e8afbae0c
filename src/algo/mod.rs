//! Clustering and layout algorithms.
//!
//! - **Graph**: vertex/face incidence, induced Laplacians, edge sets
//! - **Eigensolvers**: smallest eigenpairs of sparse symmetric matrices
//! - **Spectral bisection**: Fiedler-vector splits of vertex subsets
//! - **Clustering**: octree pre-partitioning plus recursive bisection
//! - **Layout**: per-cluster edge-span minimizing vertex orders
//! - **Utilities**: union-find, cluster colors, progress reporting

pub mod cluster;
pub mod colormap;
pub mod eigen;
pub mod graph;
pub mod layout;
pub mod progress;
pub mod sparse;
pub mod spectral;
pub mod union_find;

pub use progress::Progress;
