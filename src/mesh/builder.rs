//! Mesh construction utilities.
//!
//! Builds validated [`TriangleMesh`]es from face-vertex lists as commonly found
//! in mesh file formats.

use nalgebra::Point3;

use super::triangle_mesh::TriangleMesh;
use crate::error::{LayoutError, Result};

/// Build a triangle mesh from vertices and triangle faces.
///
/// Every face index must refer to an existing vertex. Degenerate faces
/// (repeated indices) and non-manifold configurations are accepted as-is;
/// they only contribute fewer or extra edges to the vertex graph.
///
/// # Example
/// ```
/// use mesh_layout::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<TriangleMesh> {
    if faces.is_empty() {
        return Err(LayoutError::EmptyMesh);
    }

    validate_faces(faces, vertices.len())?;

    Ok(TriangleMesh::from_parts(vertices.to_vec(), faces.to_vec()))
}

/// Build a triangle mesh from arbitrary polygons by fan triangulation.
///
/// Polygons with fewer than three vertices are skipped.
pub fn build_from_polygons(
    vertices: &[Point3<f64>],
    polygons: &[Vec<usize>],
) -> Result<TriangleMesh> {
    let mut faces = Vec::with_capacity(polygons.len());
    for poly in polygons {
        if poly.len() < 3 {
            continue;
        }
        for i in 1..poly.len() - 1 {
            faces.push([poly[0], poly[i], poly[i + 1]]);
        }
    }

    build_from_triangles(vertices, &faces)
}

/// Check that every face index is below `num_vertices`.
pub(crate) fn validate_faces(faces: &[[usize; 3]], num_vertices: usize) -> Result<()> {
    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= num_vertices) {
            return Err(LayoutError::InvalidVertexIndex { face: fi, vertex: vi });
        }
    }
    Ok(())
}
