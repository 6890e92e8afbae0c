//! Spectral bisection of vertex subsets.
//!
//! A connected graph's Laplacian has a simple zero eigenvalue; the eigenvector
//! of the next one (the Fiedler vector) varies smoothly along the graph and
//! its sign pattern cuts the graph into two well-balanced, compact halves.

use nalgebra::DVector;

use super::eigen::SymmetricEigensolver;
use super::graph::InducedLaplacian;
use crate::error::SpectralError;

/// The second-smallest eigenpair of a Laplacian.
#[derive(Debug, Clone)]
pub struct FiedlerPair {
    /// The Fiedler value (algebraic connectivity).
    pub value: f64,
    /// The Fiedler vector, indexed by subset-local vertex index.
    pub vector: DVector<f64>,
}

/// A vertex subset split in two.
#[derive(Debug, Clone)]
pub struct Bisection {
    /// Vertices with a negative Fiedler component.
    pub negative: Vec<usize>,
    /// Vertices with a non-negative Fiedler component.
    pub non_negative: Vec<usize>,
    /// The Fiedler value the split was derived from.
    pub fiedler_value: f64,
}

/// Splits subsets by the sign of their Fiedler vector.
#[derive(Debug, Clone)]
pub struct SpectralBisector<S> {
    solver: S,
}

impl<S: SymmetricEigensolver> SpectralBisector<S> {
    /// Create a bisector backed by the given eigensolver.
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    /// The underlying eigensolver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Compute the Fiedler pair of an induced Laplacian.
    ///
    /// Fails if the solver does not deliver two eigenpairs, does not converge,
    /// or the Fiedler value is `<= 0` (the induced subgraph is disconnected).
    pub fn fiedler(&self, laplacian: &InducedLaplacian) -> Result<FiedlerPair, SpectralError> {
        let pairs = self.solver.smallest_eigenpairs(&laplacian.matrix, 2)?;
        if pairs.len() != 2 {
            return Err(SpectralError::NotEnoughEigenpairs {
                requested: 2,
                found: pairs.len(),
            });
        }

        let value = pairs.values[1];
        if value <= 0.0 {
            return Err(SpectralError::DisconnectedSubgraph { eigenvalue: value });
        }

        Ok(FiedlerPair {
            value,
            vector: pairs.vector(1),
        })
    }

    /// Split the subset behind `laplacian` into two parts.
    ///
    /// Local order is preserved within each part. Either part may come out
    /// empty if the Fiedler vector has a single sign.
    pub fn bisect(&self, laplacian: &InducedLaplacian) -> Result<Bisection, SpectralError> {
        let fiedler = self.fiedler(laplacian)?;

        let mut negative = Vec::new();
        let mut non_negative = Vec::new();
        for (local, &v) in laplacian.vertices.iter().enumerate() {
            if fiedler.vector[local] < 0.0 {
                negative.push(v);
            } else {
                non_negative.push(v);
            }
        }

        Ok(Bisection {
            negative,
            non_negative,
            fiedler_value: fiedler.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::eigen::{EigenPairs, LobpcgSolver};
    use crate::algo::graph::GraphBuilder;
    use crate::algo::sparse::CsrMatrix;
    use nalgebra::DMatrix;

    /// A strip of triangles (i, i+1, i+2) over `n` vertices.
    fn strip_faces(n: usize) -> Vec<[usize; 3]> {
        (0..n - 2).map(|i| [i, i + 1, i + 2]).collect()
    }

    #[test]
    fn test_bisect_strip_into_halves() {
        let n = 40;
        let faces = strip_faces(n);
        let mut graph = GraphBuilder::new(&faces, n);
        let all: Vec<usize> = (0..n).collect();
        let laplacian = graph.induced_laplacian(&all);

        let bisector = SpectralBisector::new(LobpcgSolver::default().with_tolerance(1e-8));
        let split = bisector.bisect(&laplacian).unwrap();

        assert!(split.fiedler_value > 0.0);
        assert_eq!(split.negative.len() + split.non_negative.len(), n);

        // The Fiedler vector of a strip is monotone, so each half is a
        // contiguous run of vertex ids.
        for part in [&split.negative, &split.non_negative] {
            assert!(!part.is_empty());
            let min = *part.iter().min().unwrap();
            let max = *part.iter().max().unwrap();
            assert_eq!(max - min + 1, part.len());
        }
        assert!(split.negative.len().abs_diff(split.non_negative.len()) <= 2);
    }

    #[test]
    fn test_disconnected_subset_fails() {
        // Two triangles with no shared vertex.
        let faces = vec![[0, 1, 2], [3, 4, 5]];
        let mut graph = GraphBuilder::new(&faces, 6);
        let laplacian = graph.induced_laplacian(&[0, 1, 2, 3, 4, 5]);

        let bisector = SpectralBisector::new(LobpcgSolver::default());
        let err = bisector.bisect(&laplacian).unwrap_err();
        assert!(matches!(
            err,
            SpectralError::DisconnectedSubgraph { eigenvalue } if eigenvalue <= 0.0
        ));
    }

    #[test]
    fn test_single_vertex_fails() {
        let faces = vec![[0, 1, 2]];
        let mut graph = GraphBuilder::new(&faces, 3);
        let laplacian = graph.induced_laplacian(&[1]);

        let bisector = SpectralBisector::new(LobpcgSolver::default());
        assert!(matches!(
            bisector.bisect(&laplacian),
            Err(SpectralError::NotEnoughEigenpairs { requested: 2, found: 1 })
        ));
    }

    /// Returns only the smallest eigenpair, whatever was asked for.
    struct ShortSolver;

    impl SymmetricEigensolver for ShortSolver {
        fn smallest_eigenpairs(
            &self,
            matrix: &CsrMatrix,
            _count: usize,
        ) -> Result<EigenPairs, SpectralError> {
            let n = matrix.nrows();
            Ok(EigenPairs {
                values: vec![0.0],
                vectors: DMatrix::from_element(n, 1, 1.0 / (n as f64).sqrt()),
                iterations: 0,
            })
        }
    }

    #[test]
    fn test_short_solver_output_fails() {
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mut graph = GraphBuilder::new(&faces, 4);
        let laplacian = graph.induced_laplacian(&[0, 1, 2, 3]);

        let bisector = SpectralBisector::new(ShortSolver);
        assert_eq!(
            bisector.bisect(&laplacian).unwrap_err(),
            SpectralError::NotEnoughEigenpairs {
                requested: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_triangle_fiedler_value() {
        // Complete graph K3: eigenvalues 0, 3, 3.
        let faces = vec![[0, 1, 2]];
        let mut graph = GraphBuilder::new(&faces, 3);
        let laplacian = graph.induced_laplacian(&[0, 1, 2]);

        let bisector = SpectralBisector::new(LobpcgSolver::default());
        let fiedler = bisector.fiedler(&laplacian).unwrap();
        assert!((fiedler.value - 3.0).abs() < 1e-10);
    }
}
