//! Smallest eigenpairs of sparse symmetric matrices.
//!
//! The partitioner only ever asks one question of linear algebra: "give me
//! the `k` smallest eigenpairs of this symmetric matrix, or tell me you
//! couldn't". [`SymmetricEigensolver`] is that question; [`LobpcgSolver`] is
//! the default answer.
//!
//! # Algorithm
//!
//! [`LobpcgSolver`] runs block LOBPCG (Knyazev 2001) with a Jacobi
//! preconditioner and one guard vector beyond the requested count. Each step
//! orthonormalizes the trial basis `[X, W, P]` explicitly and performs a dense
//! Rayleigh-Ritz projection with [`SymmetricEigen`]. Matrices too small to
//! hold a three-block basis are solved densely.
//!
//! A pair `(θ, x)` counts as converged once
//! `‖Ax − θx‖ ≤ tol · max(|θ|, √ε · ‖A‖)`, where `‖A‖` is the maximum
//! absolute row sum. Eigenvalues at or below `tol · √ε · ‖A‖` in magnitude
//! are indistinguishable from zero at that accuracy and are reported as
//! exactly `0.0`.
//!
//! # References
//!
//! - Knyazev, A. (2001). "Toward the Optimal Preconditioned Eigensolver:
//!   Locally Optimal Block Preconditioned Conjugate Gradient Method."
//!   SIAM J. Sci. Comput.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sparse::CsrMatrix;
use crate::error::SpectralError;

/// Eigenpairs sorted by ascending eigenvalue.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    /// Eigenvalues, ascending.
    pub values: Vec<f64>,
    /// Unit eigenvectors, one column per eigenvalue.
    pub vectors: DMatrix<f64>,
    /// Solver iterations spent (0 for a dense solve).
    pub iterations: usize,
}

impl EigenPairs {
    /// Number of eigenpairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no eigenpairs are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The `i`-th eigenvector.
    pub fn vector(&self, i: usize) -> DVector<f64> {
        self.vectors.column(i).into_owned()
    }
}

/// Computes the smallest eigenpairs of a sparse symmetric matrix.
pub trait SymmetricEigensolver {
    /// Return exactly `count` eigenpairs of smallest algebraic value, or the
    /// reason they could not be obtained.
    fn smallest_eigenpairs(
        &self,
        matrix: &CsrMatrix,
        count: usize,
    ) -> Result<EigenPairs, SpectralError>;
}

impl<S: SymmetricEigensolver + ?Sized> SymmetricEigensolver for &S {
    fn smallest_eigenpairs(
        &self,
        matrix: &CsrMatrix,
        count: usize,
    ) -> Result<EigenPairs, SpectralError> {
        (**self).smallest_eigenpairs(matrix, count)
    }
}

/// Block LOBPCG eigensolver.
#[derive(Debug, Clone)]
pub struct LobpcgSolver {
    /// Maximum number of LOBPCG steps.
    pub max_iterations: usize,

    /// Relative residual tolerance.
    pub tolerance: f64,

    /// Seed for the random part of the starting block.
    pub seed: u64,

    /// Matrices with at most this many rows are solved densely.
    pub dense_limit: usize,
}

impl Default for LobpcgSolver {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tolerance: 1e-5,
            seed: 0x5eed,
            dense_limit: 64,
        }
    }
}

impl LobpcgSolver {
    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the residual tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the starting block seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the size up to which matrices are solved densely.
    pub fn with_dense_limit(mut self, dense_limit: usize) -> Self {
        self.dense_limit = dense_limit;
        self
    }

    fn solve_dense(&self, matrix: &CsrMatrix, count: usize, zero_level: f64) -> EigenPairs {
        let (values, vectors) = sorted_eigen(matrix.to_dense());
        EigenPairs {
            values: values[..count].iter().map(|&v| snap_zero(v, zero_level)).collect(),
            vectors: vectors.columns(0, count).into_owned(),
            iterations: 0,
        }
    }

    fn solve_lobpcg(
        &self,
        matrix: &CsrMatrix,
        count: usize,
        block: usize,
        scale: f64,
    ) -> Result<EigenPairs, SpectralError> {
        let n = matrix.nrows();
        let floor = f64::EPSILON.sqrt() * scale;
        let residual_floor = 1e3 * f64::EPSILON * scale;

        let preconditioner: DVector<f64> = matrix
            .diagonal()
            .map(|d| if d > 0.0 { 1.0 / d } else { 1.0 });

        // Starting block: the constant vector plus seeded noise.
        let mut rng = StdRng::seed_from_u64(self.seed);
        let start: Vec<DVector<f64>> = (0..block)
            .map(|j| {
                if j == 0 {
                    DVector::from_element(n, 1.0)
                } else {
                    DVector::from_fn(n, |_, _| rng.gen_range(-1.0..1.0))
                }
            })
            .collect();

        let s = orthonormalize(start, n);
        if s.ncols() < block {
            return Err(SpectralError::NotEnoughEigenpairs {
                requested: count,
                found: s.ncols(),
            });
        }
        let as_ = matrix.mul_mat(&s);
        let (mut theta, c) = rayleigh_ritz(&s, &as_);
        let mut x = &s * &c;
        let mut ax = &as_ * &c;
        let mut p: Option<DMatrix<f64>> = None;

        for iteration in 0..=self.max_iterations {
            let mut r = ax.clone();
            for j in 0..block {
                r.column_mut(j).axpy(-theta[j], &x.column(j), 1.0);
            }

            let converged = (0..count).all(|j| {
                let bound = (self.tolerance * theta[j].abs().max(floor)).max(residual_floor);
                r.column(j).norm() <= bound
            });

            if converged {
                let zero_level = self.tolerance * floor;
                return Ok(EigenPairs {
                    values: theta[..count].iter().map(|&v| snap_zero(v, zero_level)).collect(),
                    vectors: x.columns(0, count).into_owned(),
                    iterations: iteration,
                });
            }

            if iteration == self.max_iterations {
                break;
            }

            let mut trial: Vec<DVector<f64>> = Vec::with_capacity(3 * block);
            trial.extend(x.column_iter().map(|c| c.into_owned()));
            trial.extend(r.column_iter().map(|c| c.component_mul(&preconditioner)));
            if let Some(p) = &p {
                trial.extend(p.column_iter().map(|c| c.into_owned()));
            }

            let s = orthonormalize(trial, n);
            if s.ncols() < block {
                return Err(SpectralError::NotEnoughEigenpairs {
                    requested: count,
                    found: s.ncols(),
                });
            }

            let as_ = matrix.mul_mat(&s);
            let (values, c) = rayleigh_ritz(&s, &as_);
            let c_x = c.columns(0, block);

            x = &s * &c_x;
            ax = &as_ * &c_x;
            theta = values;

            let extra = s.ncols() - block;
            p = if extra > 0 {
                Some(s.columns(block, extra) * c_x.rows(block, extra))
            } else {
                None
            };
        }

        Err(SpectralError::NotConverged {
            iterations: self.max_iterations,
        })
    }
}

impl SymmetricEigensolver for LobpcgSolver {
    fn smallest_eigenpairs(
        &self,
        matrix: &CsrMatrix,
        count: usize,
    ) -> Result<EigenPairs, SpectralError> {
        assert_eq!(matrix.nrows(), matrix.ncols(), "Matrix must be square");

        let n = matrix.nrows();
        if count > n {
            return Err(SpectralError::NotEnoughEigenpairs {
                requested: count,
                found: n,
            });
        }
        if count == 0 {
            return Ok(EigenPairs {
                values: Vec::new(),
                vectors: DMatrix::zeros(n, 0),
                iterations: 0,
            });
        }

        let scale = matrix.norm_bound();
        let block = (count + 1).min(n);

        if n <= self.dense_limit.max(3 * block) {
            let zero_level = self.tolerance * f64::EPSILON.sqrt() * scale;
            return Ok(self.solve_dense(matrix, count, zero_level));
        }

        self.solve_lobpcg(matrix, count, block, scale)
    }
}

#[inline]
fn snap_zero(value: f64, zero_level: f64) -> f64 {
    if value.abs() <= zero_level {
        0.0
    } else {
        value
    }
}

/// Full eigendecomposition of a dense symmetric matrix, ascending.
fn sorted_eigen(matrix: DMatrix<f64>) -> (Vec<f64>, DMatrix<f64>) {
    let k = matrix.nrows();
    let eig = SymmetricEigen::new(matrix);

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));

    let values = order.iter().map(|&i| eig.eigenvalues[i]).collect();
    let vectors = DMatrix::from_fn(k, k, |r, c| eig.eigenvectors[(r, order[c])]);
    (values, vectors)
}

/// Rayleigh-Ritz on an orthonormal basis `s` with `as_ = A * s`.
fn rayleigh_ritz(s: &DMatrix<f64>, as_: &DMatrix<f64>) -> (Vec<f64>, DMatrix<f64>) {
    let g = s.transpose() * as_;
    let g = (&g + g.transpose()) * 0.5;
    sorted_eigen(g)
}

/// Modified Gram-Schmidt with reorthogonalization.
///
/// Columns that are (numerically) dependent on earlier ones are dropped, so
/// the result may have fewer columns than the input.
fn orthonormalize(columns: Vec<DVector<f64>>, n: usize) -> DMatrix<f64> {
    const DROP_TOLERANCE: f64 = 1e-10;

    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(columns.len());
    for mut v in columns {
        let original = v.norm();
        if !(original > 0.0 && original.is_finite()) {
            continue;
        }

        for _ in 0..2 {
            for q in &basis {
                let proj = q.dot(&v);
                v.axpy(-proj, q, 1.0);
            }
        }

        let norm = v.norm();
        if norm > DROP_TOLERANCE * original {
            basis.push(v / norm);
        }
    }

    if basis.is_empty() {
        DMatrix::zeros(n, 0)
    } else {
        DMatrix::from_columns(&basis)
    }
}
