//! Core mesh data structures.
//!
//! The layout pipeline only needs a mesh's vertex positions and its triangle
//! list, so the representation here is a plain indexed [`TriangleMesh`].
//! Vertex ids are `usize` positions into the vertex array and stay stable for
//! the duration of a clustering run; [`TriangleMesh::rearrange_vertices`] is
//! the only operation that renumbers them.
//!
//! # Construction
//!
//! ```
//! use mesh_layout::mesh::build_from_triangles;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! ```

mod builder;
mod triangle_mesh;

pub use builder::{build_from_polygons, build_from_triangles};
pub(crate) use builder::validate_faces;
pub use triangle_mesh::TriangleMesh;
pub(crate) use triangle_mesh::bounding_box;
