//! BiCGSTAB (Bi-Conjugate Gradient Stabilized) solver
//!
//! BiCGSTAB is a Krylov subspace method for non-symmetric systems with
//! short recurrences, so its memory use does not grow like GMRES between restarts.

use crate::blas_helpers::{inner_product, residual_scale, vector_norm};
use crate::traits::LinearOperator;
use ndarray::Array1;

/// BiCGSTAB solver configuration
#[derive(Debug, Clone)]
pub struct BiCgstabConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: f64,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for BiCgstabConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
            print_interval: 0,
        }
    }
}

/// BiCGSTAB solver result
#[derive(Debug)]
pub struct BiCgstabSolution {
    /// Solution vector
    pub x: Array1<f64>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the BiCGSTAB method
pub fn bicgstab<A>(operator: &A, b: &Array1<f64>, config: &BiCgstabConfig) -> BiCgstabSolution
where
    A: LinearOperator,
{
    bicgstab_with_guess(operator, b, None, config)
}

/// Solve Ax = b using BiCGSTAB starting from `x0`
pub fn bicgstab_with_guess<A>(
    operator: &A,
    b: &Array1<f64>,
    x0: Option<&Array1<f64>>,
    config: &BiCgstabConfig,
) -> BiCgstabSolution
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
        return BiCgstabSolution {
            x,
            iterations: 0,
            residual: rel_residual,
            converged: true,
        };
    }

    // Shadow residual
    let r0 = r.clone();

    let mut rho = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;

    let mut p: Array1<f64> = Array1::zeros(n);
    let mut v: Array1<f64> = Array1::zeros(n);

    for iter in 0..config.max_iterations {
        let rho_new = inner_product(&r0, &r);

        // Check for breakdown
        if rho_new.abs() < 1e-300 {
            return BiCgstabSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }

        let beta = (rho_new / rho) * (alpha / omega);
        rho = rho_new;

        // p = r + beta * (p - omega * v)
        p = &r + &((&p - &(&v * omega)) * beta);

        v = operator.apply(&p);

        let r0v = inner_product(&r0, &v);
        if r0v.abs() < 1e-300 {
            return BiCgstabSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }

        alpha = rho / r0v;

        // s = r - alpha * v
        let s = &r - &(&v * alpha);

        // Check for early convergence
        let s_residual = vector_norm(&s) / scale;
        if s_residual < config.tolerance {
            x.scaled_add(alpha, &p);
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: s_residual,
                converged: true,
            };
        }

        let t = operator.apply(&s);

        // omega = (t, s) / (t, t)
        let tt = inner_product(&t, &t);
        if tt.abs() < 1e-300 {
            return BiCgstabSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }
        omega = inner_product(&t, &s) / tt;

        // x = x + alpha * p + omega * s
        x.scaled_add(alpha, &p);
        x.scaled_add(omega, &s);

        // r = s - omega * t
        r = &s - &(&t * omega);

        rel_residual = vector_norm(&r) / scale;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "BiCGSTAB iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual
            );
        }

        if rel_residual < config.tolerance {
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        // Check for stagnation
        if omega.abs() < 1e-300 {
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }
    }

    BiCgstabSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}
