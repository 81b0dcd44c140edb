//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts

use crate::traits::LinearOperator;
use ndarray::{Array1, Array2};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Row count above which the mat-vec is split across the rayon pool
#[cfg(feature = "rayon")]
const PARALLEL_ROW_THRESHOLD: usize = 4096;

/// Compressed Sparse Row (CSR) matrix format
///
/// Column indices are sorted within each row and duplicates are merged, which
/// the ILU factorisation relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<f64>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl CsrMatrix {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<f64>, threshold: f64) -> Self {
        let num_rows = dense.nrows();
        let num_cols = dense.ncols();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.abs() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed, so
    /// assemblers can emit one triplet per face contribution.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
    ) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut col_indices: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            debug_assert!(row < num_rows && col < num_cols, "triplet out of range");
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            values.push(val);
            col_indices.push(col);
            row_counts[row] += 1;
            last = Some((row, col));
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        let mut acc = 0;
        for count in row_counts {
            acc += count;
            row_ptrs.push(acc);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create an identity matrix
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![1.0; n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<f64>) -> Array1<f64> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= PARALLEL_ROW_THRESHOLD {
                return self.matvec_parallel(x);
            }
        }

        let mut y = Array1::zeros(self.num_rows);
        for i in 0..self.num_rows {
            y[i] = self.row_entries(i).map(|(j, v)| v * x[j]).sum();
        }
        y
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<f64>) -> Array1<f64> {
        let results: Vec<f64> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| self.row_entries(i).map(|(j, v)| v * x[j]).sum())
            .collect();
        Array1::from_vec(results)
    }

    /// Get element at (i, j), zero when not stored
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let range = self.row_range(i);
        match self.col_indices[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Extract the diagonal
    pub fn diagonal(&self) -> Array1<f64> {
        let n = self.num_rows.min(self.num_cols);
        Array1::from_iter((0..n).map(|i| self.get(i, i)))
    }

    /// Check A == A^T up to a relative tolerance on each entry pair
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if self.num_rows != self.num_cols {
            return false;
        }
        for i in 0..self.num_rows {
            for (j, v) in self.row_entries(i) {
                if j == i {
                    continue;
                }
                let w = self.get(j, i);
                let scale = v.abs().max(w.abs()).max(1.0);
                if (v - w).abs() > tol * scale {
                    return false;
                }
            }
        }
        true
    }

    /// Convert to dense matrix
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.num_rows, self.num_cols));
        for i in 0..self.num_rows {
            for (j, v) in self.row_entries(i) {
                dense[[i, j]] += v;
            }
        }
        dense
    }
}

impl LinearOperator for CsrMatrix {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        self.matvec(x)
    }
}
