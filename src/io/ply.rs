//! PLY (Stanford polygon) format support.
//!
//! Loading accepts ASCII and binary files with any numeric coordinate type
//! and any integer list type for face indices; polygons are fan-triangulated.
//! Per-vertex `red`/`green`/`blue` uchar properties are read when all three
//! are present. Saving writes ASCII with double-precision coordinates and,
//! if the mesh has colors, `red`/`green`/`blue` uchar properties.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{LayoutError, Result};
use crate::mesh::{build_from_polygons, TriangleMesh};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use mesh_layout::io::ply;
///
/// let mesh = ply::load("model.ply").unwrap();
/// println!("{} vertices", mesh.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let load_error = |message: &str| LayoutError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    let mut colors: Vec<[u8; 3]> = Vec::with_capacity(vertex_element.len());
    let mut has_colors = true;
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| load_error(&format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));

        if has_colors {
            match (
                get_color_property(vertex, "red"),
                get_color_property(vertex, "green"),
                get_color_property(vertex, "blue"),
            ) {
                (Some(r), Some(g), Some(b)) => colors.push([r, g, b]),
                _ => has_colors = false,
            }
        }
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut polygons: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;
        polygons.push(indices);
    }

    if polygons.iter().all(|p| p.len() < 3) {
        return Err(load_error("PLY file contains no faces"));
    }

    let mut mesh = build_from_polygons(&vertices, &polygons)?;
    if has_colors && !colors.is_empty() {
        mesh.set_colors(colors)?;
    }
    Ok(mesh)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_color_property(element: &DefaultElement, name: &str) -> Option<u8> {
    match element.get(name)? {
        Property::UChar(v) => Some(*v),
        Property::Float(v) => Some((v.clamp(0.0, 1.0) * 255.0).round() as u8),
        Property::Double(v) => Some((v.clamp(0.0, 1.0) * 255.0).round() as u8),
        _ => None,
    }
}

/// Face index lists of any integer type. Negative indices map to
/// `usize::MAX` so that face validation rejects them.
fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    fn convert<T: Copy>(values: &[T]) -> Vec<usize>
    where
        usize: TryFrom<T>,
    {
        values
            .iter()
            .map(|&x| usize::try_from(x).unwrap_or(usize::MAX))
            .collect()
    }

    match element.get(name)? {
        Property::ListInt(v) => Some(convert(v)),
        Property::ListUInt(v) => Some(convert(v)),
        Property::ListShort(v) => Some(convert(v)),
        Property::ListUShort(v) => Some(convert(v)),
        Property::ListChar(v) => Some(convert(v)),
        Property::ListUChar(v) => Some(convert(v)),
        _ => None,
    }
}

/// Save a mesh to an ASCII PLY file.
///
/// # Example
///
/// ```no_run
/// use mesh_layout::io::ply;
/// use mesh_layout::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let colors = mesh.colors();

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by mesh-layout")?;
    writeln!(writer, "element vertex {}", mesh.num_vertices())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    if colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "element face {}", mesh.num_faces())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, p) in mesh.positions().iter().enumerate() {
        match colors {
            Some(c) => writeln!(
                writer,
                "{} {} {} {} {} {}",
                p.x, p.y, p.z, c[i][0], c[i][1], c[i][2]
            )?,
            None => writeln!(writer, "{} {} {}", p.x, p.y, p.z)?,
        }
    }

    for f in mesh.faces() {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use std::fs;

    fn quad() -> TriangleMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.5),
            Point3::new(0.0, 1.0, -0.25),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.ply");

        let mesh = quad();
        save(&mesh, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.positions(), mesh.positions());
        assert_eq!(loaded.faces(), mesh.faces());
        assert!(loaded.colors().is_none());
    }

    #[test]
    fn test_colors_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colored.ply");

        let mut mesh = quad();
        let colors = vec![[255, 0, 0], [0, 255, 0], [0, 0, 255], [10, 20, 30]];
        mesh.set_colors(colors.clone()).unwrap();
        save(&mesh, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("property uchar red"));

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.colors(), Some(colors.as_slice()));
    }

    #[test]
    fn test_load_polygon_and_float_coords() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pentagon.ply");
        fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 5\nproperty float x\nproperty float y\n\
             property float z\nelement face 2\nproperty list uchar uint vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n1.5 1 0\n0.5 2 0\n-0.5 1 0\n5 0 1 2 3 4\n2 0 1\n",
        )
        .unwrap();

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.faces(), &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_load_rejects_bad_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ply");
        fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n0 1 0\n3 0 1 -1\n",
        )
        .unwrap();

        assert!(matches!(
            load(&path),
            Err(LayoutError::InvalidVertexIndex { face: 0, vertex: usize::MAX })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path().join("nope.ply")), Err(LayoutError::Io(_))));
    }

    #[test]
    fn test_load_without_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.ply");
        fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\n\
             property float z\nelement face 0\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n",
        )
        .unwrap();

        assert!(matches!(load(&path), Err(LayoutError::LoadError { .. })));
    }
}
