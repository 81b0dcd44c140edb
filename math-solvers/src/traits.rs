//! Core traits for linear algebra operations
//!
//! This module defines the two abstractions the solvers are written against:
//! - [`LinearOperator`]: matrix-like objects that can perform matrix-vector products
//! - [`Preconditioner`]: approximate inverses applied to a residual

use ndarray::Array1;

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// Solvers only ever need `y = A x`, so sparse matrices and matrix-free
/// operators can be used interchangeably.
pub trait LinearOperator: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<f64>) -> Array1<f64>;
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone.
pub trait Preconditioner: Send + Sync {
    /// Apply the preconditioner: y = M * r
    fn apply(&self, r: &Array1<f64>) -> Array1<f64>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &Array1<f64>) -> Array1<f64> {
        r.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_preconditioner() {
        let precond = IdentityPreconditioner;
        let r = array![1.0, -2.0, 3.5];
        let y = precond.apply(&r);
        assert_eq!(r, y);
    }
}
