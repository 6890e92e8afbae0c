//! Compressed sparse row matrices.
//!
//! Graph Laplacians are assembled as triplet lists and compressed into
//! [`CsrMatrix`], which supports the matrix-vector and matrix-block products
//! an iterative eigensolver needs.

use nalgebra::{DMatrix, DVector};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` is the slice of row `i` in `col_idx`/`values`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    ///
    /// # Panics
    ///
    /// Panics if a triplet lies outside the `rows x cols` shape.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        for &(r, c, _) in &triplets {
            assert!(
                r < rows && c < cols,
                "triplet ({}, {}) outside {}x{} matrix",
                r,
                c,
                rows,
                cols
            );
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            col_idx.push(col);
            values.push(val);
            row_ptr[row + 1] += 1;
            last = Some((row, col));
        }

        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(col, value)` entries of one row.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Value at `(i, j)`, zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.row(i)
            .find(|&(c, _)| c == j)
            .map(|(_, v)| v)
            .unwrap_or(0.0)
    }

    /// Diagonal entries.
    pub fn diagonal(&self) -> DVector<f64> {
        let n = self.rows.min(self.cols);
        DVector::from_iterator(n, (0..n).map(|i| self.get(i, i)))
    }

    /// Maximum absolute row sum, an upper bound on the spectral radius.
    pub fn norm_bound(&self) -> f64 {
        (0..self.rows)
            .map(|i| self.row(i).map(|(_, v)| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);
        for i in 0..self.rows {
            y[i] = self.row(i).map(|(c, v)| v * x[c]).sum();
        }
        y
    }

    /// Multiply matrix by a dense block of column vectors: Y = A * X.
    pub fn mul_mat(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(x.nrows(), self.cols, "Block dimension mismatch");

        let mut y = DMatrix::zeros(self.rows, x.ncols());
        for i in 0..self.rows {
            for (c, v) in self.row(i) {
                for k in 0..x.ncols() {
                    y[(i, k)] += v * x[(c, k)];
                }
            }
        }
        y
    }

    /// Expand into a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for (c, v) in self.row(i) {
                dense[(i, c)] += v;
            }
        }
        dense
    }
}
