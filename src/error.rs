//! Error types for mesh-layout.
//!
//! [`LayoutError`] covers everything that can go wrong before or around a
//! clustering run (bad input, I/O, bad parameters). [`SpectralError`] is the
//! local outcome of a failed spectral split; it never escapes the partitioner,
//! which records it on the leaf cluster it produced instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`LayoutError`].
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors that can occur while loading, clustering or rearranging a mesh.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// A vertex mapping handed to a rearrangement is not a permutation.
    #[error("invalid vertex mapping: {reason}")]
    InvalidMapping {
        /// What is wrong with the mapping.
        reason: String,
    },

    /// Spectral computation failed.
    #[error("spectral computation failed: {0}")]
    Spectral(#[from] SpectralError),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl LayoutError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        LayoutError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Reasons a vertex subset could not be bisected spectrally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectralError {
    /// The solver produced fewer eigenpairs than requested.
    #[error("eigensolver returned {found} eigenpairs, {requested} requested")]
    NotEnoughEigenpairs {
        /// Number of eigenpairs asked for.
        requested: usize,
        /// Number of eigenpairs obtained.
        found: usize,
    },

    /// The solver ran out of iterations before the residuals were small enough.
    #[error("eigensolver did not converge within {iterations} iterations")]
    NotConverged {
        /// Iteration budget that was exhausted.
        iterations: usize,
    },

    /// The Fiedler value is not positive, so the induced subgraph is disconnected.
    #[error("non-positive Fiedler value {eigenvalue} (disconnected subgraph)")]
    DisconnectedSubgraph {
        /// The offending second-smallest eigenvalue.
        eigenvalue: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_message() {
        let err = LayoutError::invalid_param("tolerance", -1.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter: tolerance = -1 (must be positive)"
        );
    }

    #[test]
    fn test_spectral_error_converts() {
        let err: LayoutError = SpectralError::NotConverged { iterations: 7 }.into();
        assert!(matches!(
            err,
            LayoutError::Spectral(SpectralError::NotConverged { iterations: 7 })
        ));
    }
}
