//! CGS (Conjugate Gradient Squared) solver
//!
//! CGS is a Krylov subspace method for non-symmetric systems.
//! It can converge faster than BiCG but may be less stable.

use crate::blas_helpers::{axpy, inner_product, residual_scale, vector_norm};
use crate::traits::LinearOperator;
use ndarray::Array1;

/// CGS solver configuration
#[derive(Debug, Clone)]
pub struct CgsConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: f64,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for CgsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
            print_interval: 0,
        }
    }
}

/// CGS solver result
#[derive(Debug)]
pub struct CgsSolution {
    /// Solution vector
    pub x: Array1<f64>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the CGS method
pub fn cgs<A>(operator: &A, b: &Array1<f64>, config: &CgsConfig) -> CgsSolution
where
    A: LinearOperator,
{
    cgs_with_guess(operator, b, None, config)
}

/// Solve Ax = b using CGS starting from `x0`
pub fn cgs_with_guess<A>(
    operator: &A,
    b: &Array1<f64>,
    x0: Option<&Array1<f64>>,
    config: &CgsConfig,
) -> CgsSolution
where
    A: LinearOperator,
{
    let n = b.len();
    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => Array1::zeros(n),
    };

    let scale = residual_scale(b);
    let mut r = b - &operator.apply(&x);
    let mut rel_residual = vector_norm(&r) / scale;
    if rel_residual < config.tolerance {
        return CgsSolution {
            x,
            iterations: 0,
            residual: rel_residual,
            converged: true,
        };
    }

    // Shadow residual
    let r0 = r.clone();

    let mut rho = inner_product(&r0, &r);
    let mut p = r.clone();
    let mut u = r.clone();

    for iter in 0..config.max_iterations {
        let v = operator.apply(&p);

        let sigma = inner_product(&r0, &v);
        if sigma.abs() < 1e-300 {
            return CgsSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }

        let alpha = rho / sigma;

        // q = u - alpha * v
        let q = &u - &(&v * alpha);

        let u_plus_q = &u + &q;
        let w = operator.apply(&u_plus_q);

        axpy(alpha, &u_plus_q, &mut x);
        axpy(-alpha, &w, &mut r);

        rel_residual = vector_norm(&r) / scale;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "CGS iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual
            );
        }

        if rel_residual < config.tolerance {
            return CgsSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        let rho_new = inner_product(&r0, &r);
        if rho.abs() < 1e-300 {
            return CgsSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }

        let beta = rho_new / rho;
        rho = rho_new;

        // u = r + beta * q
        u = &r + &(&q * beta);

        // p = u + beta * (q + beta * p)
        let q_plus_beta_p = &q + &(&p * beta);
        p = &u + &(&q_plus_beta_p * beta);
    }

    CgsSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}
