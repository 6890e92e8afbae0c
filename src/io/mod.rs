//! Mesh file I/O.
//!
//! Meshes are read and written as PLY, including optional per-vertex
//! colors. [`load`] and [`save`] pick the format from the file extension.
//!
//! ```no_run
//! use mesh_layout::io::{load, save};
//!
//! let mesh = load("model.ply").unwrap();
//! save(&mesh, "out.ply").unwrap();
//! ```

pub mod ply;

use std::path::Path;

use crate::error::{LayoutError, Result};
use crate::mesh::TriangleMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| LayoutError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh, detecting the format from the extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Ply => ply::load(path),
    }
}

/// Save a mesh, detecting the format from the extension.
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Ply => ply::save(mesh, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/mesh.PLY"), Some(Format::Ply));
        assert_eq!(Format::from_path("mesh.obj"), None);
        assert_eq!(Format::from_path("mesh"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let mesh = TriangleMesh::default();
        match save(&mesh, "mesh.stl") {
            Err(LayoutError::UnsupportedFormat { extension }) => assert_eq!(extension, "stl"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
        assert!(matches!(
            load("mesh"),
            Err(LayoutError::UnsupportedFormat { extension }) if extension == "(none)"
        ));
    }
}
