//! Indexed triangle mesh.
//!
//! A flat vertex/face representation: vertex `i` is `positions[i]`, and each
//! face is a triple of vertex indices. Unlike a half-edge structure this places
//! no manifoldness requirement on the input, which suits layout computation
//! where the topology is only read as a graph.

use nalgebra::Point3;

use crate::error::{LayoutError, Result};

/// An indexed triangle mesh with optional per-vertex colors.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    colors: Option<Vec<[u8; 3]>>,
}

impl TriangleMesh {
    /// Create a mesh without validating the face indices.
    ///
    /// Use [`build_from_triangles`](super::build_from_triangles) for untrusted input.
    pub(crate) fn from_parts(positions: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            positions,
            faces,
            colors: None,
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions, indexed by vertex id.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Triangle faces as vertex id triples.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Per-vertex colors, if any were loaded or assigned.
    #[inline]
    pub fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    /// Attach per-vertex colors.
    ///
    /// Fails if the color count does not match the vertex count.
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) -> Result<()> {
        if colors.len() != self.positions.len() {
            return Err(LayoutError::invalid_param(
                "colors",
                colors.len(),
                "must provide one color per vertex",
            ));
        }
        self.colors = Some(colors);
        Ok(())
    }

    /// Remove per-vertex colors.
    pub fn clear_colors(&mut self) {
        self.colors = None;
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        bounding_box(&self.positions)
    }

    /// Physically reorder vertices.
    ///
    /// `old_to_new[i]` is the new index of the vertex currently at index `i`.
    /// Positions and colors move to their new slots and every face is
    /// rewritten to reference the new indices; face order is unchanged.
    ///
    /// Fails with [`LayoutError::InvalidMapping`] unless the mapping is a
    /// permutation of `0..num_vertices`.
    pub fn rearrange_vertices(&mut self, old_to_new: &[usize]) -> Result<()> {
        let n = self.positions.len();
        if old_to_new.len() != n {
            return Err(LayoutError::InvalidMapping {
                reason: format!(
                    "mapping has {} entries, mesh has {} vertices",
                    old_to_new.len(),
                    n
                ),
            });
        }

        let mut seen = vec![false; n];
        for &new in old_to_new {
            if new >= n || seen[new] {
                return Err(LayoutError::InvalidMapping {
                    reason: format!("target index {} is out of range or repeated", new),
                });
            }
            seen[new] = true;
        }

        let mut positions = vec![Point3::origin(); n];
        for (old, &new) in old_to_new.iter().enumerate() {
            positions[new] = self.positions[old];
        }
        self.positions = positions;

        if let Some(colors) = self.colors.as_mut() {
            let mut moved = vec![[0u8; 3]; n];
            for (old, &new) in old_to_new.iter().enumerate() {
                moved[new] = colors[old];
            }
            *colors = moved;
        }

        for face in &mut self.faces {
            for v in face.iter_mut() {
                *v = old_to_new[*v];
            }
        }

        Ok(())
    }
}

/// Axis-aligned bounding box of a point set.
pub(crate) fn bounding_box(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;

    for p in &points[1..] {
        min = min.inf(p);
        max = max.sup(p);
    }

    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn create_quad() -> TriangleMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_bounding_box() {
        let mesh = create_quad();
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
        assert!(TriangleMesh::default().bounding_box().is_none());
    }

    #[test]
    fn test_rearrange_moves_positions_and_faces() {
        let mut mesh = create_quad();
        let original = mesh.positions().to_vec();

        // Reverse the vertex order.
        let old_to_new = vec![3, 2, 1, 0];
        mesh.rearrange_vertices(&old_to_new).unwrap();

        for (old, &new) in old_to_new.iter().enumerate() {
            assert_eq!(mesh.positions()[new], original[old]);
        }
        assert_eq!(mesh.faces(), &[[3, 2, 1], [3, 1, 0]]);
    }

    #[test]
    fn test_rearrange_preserves_geometry_of_faces() {
        let mut mesh = create_quad();
        let before: Vec<[Point3<f64>; 3]> = mesh
            .faces()
            .iter()
            .map(|f| [mesh.positions()[f[0]], mesh.positions()[f[1]], mesh.positions()[f[2]]])
            .collect();

        mesh.rearrange_vertices(&[2, 0, 3, 1]).unwrap();

        let after: Vec<[Point3<f64>; 3]> = mesh
            .faces()
            .iter()
            .map(|f| [mesh.positions()[f[0]], mesh.positions()[f[1]], mesh.positions()[f[2]]])
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rearrange_moves_colors() {
        let mut mesh = create_quad();
        mesh.set_colors(vec![[1, 0, 0], [2, 0, 0], [3, 0, 0], [4, 0, 0]])
            .unwrap();
        mesh.rearrange_vertices(&[1, 0, 3, 2]).unwrap();
        assert_eq!(
            mesh.colors().unwrap(),
            &[[2, 0, 0], [1, 0, 0], [4, 0, 0], [3, 0, 0]]
        );
    }

    #[test]
    fn test_rearrange_rejects_non_permutation() {
        let mut mesh = create_quad();
        assert!(matches!(
            mesh.rearrange_vertices(&[0, 0, 1, 2]),
            Err(LayoutError::InvalidMapping { .. })
        ));
        assert!(matches!(
            mesh.rearrange_vertices(&[0, 1, 2]),
            Err(LayoutError::InvalidMapping { .. })
        ));
        assert!(matches!(
            mesh.rearrange_vertices(&[0, 1, 2, 4]),
            Err(LayoutError::InvalidMapping { .. })
        ));
    }

    #[test]
    fn test_set_colors_length_mismatch() {
        let mut mesh = create_quad();
        assert!(mesh.set_colors(vec![[0, 0, 0]; 3]).is_err());
        assert!(mesh.colors().is_none());
    }
}
