//! Diagonal (Jacobi) preconditioner
//!
//! Simple but effective preconditioner that scales by the diagonal of A.
//! Finite-volume matrices are diagonally dominant, so this is the default
//! companion of CG.

use crate::sparse::CsrMatrix;
use crate::traits::Preconditioner;
use ndarray::Array1;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Length above which the scaling is split across the rayon pool
#[cfg(feature = "rayon")]
const PARALLEL_LEN_THRESHOLD: usize = 4096;

/// Diagonal (Jacobi) preconditioner
///
/// M = diag(A), so M^(-1) scales each component by 1/A_ii. Zero diagonal
/// entries are left unscaled.
#[derive(Debug, Clone)]
pub struct DiagonalPreconditioner {
    /// Inverse diagonal elements
    inv_diag: Array1<f64>,
}

impl DiagonalPreconditioner {
    /// Create a diagonal preconditioner from a CSR matrix
    pub fn from_csr(matrix: &CsrMatrix) -> Self {
        Self::from_diagonal(&matrix.diagonal())
    }

    /// Create from a diagonal vector directly
    pub fn from_diagonal(diag: &Array1<f64>) -> Self {
        let inv_diag = diag.mapv(|d| if d.abs() > 1e-300 { 1.0 / d } else { 1.0 });
        Self { inv_diag }
    }
}

impl Preconditioner for DiagonalPreconditioner {
    fn apply(&self, r: &Array1<f64>) -> Array1<f64> {
        #[cfg(feature = "rayon")]
        {
            if r.len() >= PARALLEL_LEN_THRESHOLD {
                if let (Some(rs), Some(ds)) = (r.as_slice(), self.inv_diag.as_slice()) {
                    let results: Vec<f64> = rs
                        .par_iter()
                        .zip(ds.par_iter())
                        .map(|(&ri, &di)| ri * di)
                        .collect();
                    return Array1::from_vec(results);
                }
            }
        }
        r * &self.inv_diag
    }
}
