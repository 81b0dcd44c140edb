//! ILU(0) preconditioner
//!
//! Incomplete LU factorization with no fill-in.
//! Effective for the banded, diagonally dominant systems that finite-volume
//! discretisations produce, including non-symmetric convection rows.

use crate::sparse::CsrMatrix;
use crate::traits::Preconditioner;
use ndarray::Array1;

/// ILU(0) preconditioner
///
/// The factors share the sparsity pattern of the input matrix: the strictly
/// lower part holds L (unit diagonal implied), the rest holds U.
#[derive(Debug, Clone)]
pub struct IluPreconditioner {
    /// Factored values in the pattern of the input matrix
    values: Vec<f64>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
    /// Position of the diagonal entry in each row, if stored
    diag_indices: Vec<Option<usize>>,
    n: usize,
}

impl IluPreconditioner {
    /// Create ILU(0) preconditioner from a CSR matrix
    ///
    /// Relies on sorted column indices within each row, which
    /// [`CsrMatrix::from_triplets`] and [`CsrMatrix::from_dense`] guarantee.
    pub fn from_csr(matrix: &CsrMatrix) -> Self {
        let n = matrix.num_rows;
        let col_indices = matrix.col_indices.clone();
        let row_ptrs = matrix.row_ptrs.clone();
        let mut values = matrix.values.clone();

        let diag_indices: Vec<Option<usize>> = (0..n)
            .map(|i| (row_ptrs[i]..row_ptrs[i + 1]).find(|&idx| col_indices[idx] == i))
            .collect();

        // Column -> position in the current row, usize::MAX when absent
        let mut marker = vec![usize::MAX; matrix.num_cols.max(n)];

        for i in 0..n {
            let row = row_ptrs[i]..row_ptrs[i + 1];
            for idx in row.clone() {
                marker[col_indices[idx]] = idx;
            }

            for idx in row.clone() {
                let k = col_indices[idx];
                if k >= i {
                    break;
                }
                let Some(kk) = diag_indices[k] else {
                    continue;
                };
                let u_kk = values[kk];
                if u_kk.abs() < 1e-300 {
                    continue;
                }

                let l_ik = values[idx] / u_kk;
                values[idx] = l_ik;

                for kj in (kk + 1)..row_ptrs[k + 1] {
                    let pos = marker[col_indices[kj]];
                    if pos != usize::MAX {
                        values[pos] -= l_ik * values[kj];
                    }
                }
            }

            for idx in row {
                marker[col_indices[idx]] = usize::MAX;
            }
        }

        Self {
            values,
            col_indices,
            row_ptrs,
            diag_indices,
            n,
        }
    }
}

impl Preconditioner for IluPreconditioner {
    fn apply(&self, r: &Array1<f64>) -> Array1<f64> {
        let mut x = r.clone();

        // Forward substitution: Ly = r (L has unit diagonal)
        for i in 0..self.n {
            let mut sum = x[i];
            for idx in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                let j = self.col_indices[idx];
                if j >= i {
                    break;
                }
                sum -= self.values[idx] * x[j];
            }
            x[i] = sum;
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            let mut sum = x[i];
            for idx in self.row_ptrs[i]..self.row_ptrs[i + 1] {
                let j = self.col_indices[idx];
                if j > i {
                    sum -= self.values[idx] * x[j];
                }
            }
            x[i] = match self.diag_indices[i] {
                Some(d) if self.values[d].abs() > 1e-300 => sum / self.values[d],
                _ => sum,
            };
        }

        x
    }
}
