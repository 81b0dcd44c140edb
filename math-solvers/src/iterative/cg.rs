//! CG (Conjugate Gradient) solver
//!
//! The Conjugate Gradient method for symmetric definite systems, with an
//! optional preconditioner and initial guess. Pure diffusion and transient
//! discretisations produce exactly this kind of matrix.

use crate::blas_helpers::{axpy, inner_product, residual_scale, vector_norm};
use crate::traits::{IdentityPreconditioner, LinearOperator, Preconditioner};
use ndarray::Array1;

/// CG solver configuration
#[derive(Debug, Clone)]
pub struct CgConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: f64,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
            print_interval: 0,
        }
    }
}

/// CG solver result
#[derive(Debug)]
pub struct CgSolution {
    /// Solution vector
    pub x: Array1<f64>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the Conjugate Gradient method
///
/// Note: This method is only correct for symmetric definite matrices.
/// For non-symmetric systems, use GMRES or BiCGSTAB instead.
pub fn cg<A>(operator: &A, b: &Array1<f64>, config: &CgConfig) -> CgSolution
where
    A: LinearOperator,
{
    pcg(operator, &IdentityPreconditioner, b, None, config)
}

/// Solve Ax = b using preconditioned CG starting from `x0`
///
/// A definite preconditioner of either sign works: a negative definite
/// system with a negative Jacobi diagonal runs the same iteration as its
/// negation.
pub fn pcg<A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<f64>,
    x0: Option<&Array1<f64>>,
    config: &CgConfig,
) -> CgSolution
where
    A: LinearOperator,
    P: Preconditioner,
{
    let n = b.len();
    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => Array1::zeros(n),
    };

    let scale = residual_scale(b);

    // r = b - A x
    let mut r = b - &operator.apply(&x);
    let mut rel_residual = vector_norm(&r) / scale;
    if rel_residual < config.tolerance {
        return CgSolution {
            x,
            iterations: 0,
            residual: rel_residual,
            converged: true,
        };
    }

    let mut z = precond.apply(&r);
    let mut p = z.clone();
    let mut rho = inner_product(&r, &z);

    for iter in 0..config.max_iterations {
        let q = operator.apply(&p);

        let pq = inner_product(&p, &q);
        if pq.abs() < 1e-300 {
            return CgSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }

        let alpha = rho / pq;
        axpy(alpha, &p, &mut x);
        axpy(-alpha, &q, &mut r);

        rel_residual = vector_norm(&r) / scale;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "CG iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual
            );
        }

        if rel_residual < config.tolerance {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        z = precond.apply(&r);
        let rho_new = inner_product(&r, &z);
        if rho.abs() < 1e-300 {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }

        let beta = rho_new / rho;
        rho = rho_new;

        // p = z + beta * p
        p = &z + &(&p * beta);
    }

    CgSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}
