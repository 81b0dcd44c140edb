//! GMRES (Generalized Minimal Residual) solver
//!
//! Implementation of the restarted GMRES algorithm based on Saad & Schultz (1986).
//!
//! GMRES is the general-purpose choice once convection makes the assembled
//! matrix non-symmetric. It minimizes the residual in a Krylov subspace and has
//! smooth, monotonic convergence behavior. Preconditioning is applied on the
//! right, so the monitored residual is the true residual of `Ax = b`.

use crate::blas_helpers::{axpy, inner_product, residual_scale, vector_norm};
use crate::traits::{IdentityPreconditioner, LinearOperator, Preconditioner};
use ndarray::{Array1, Array2};

/// GMRES solver configuration
#[derive(Debug, Clone)]
pub struct GmresConfig {
    /// Maximum number of outer iterations (restarts)
    pub max_iterations: usize,
    /// Restart parameter (number of inner iterations before restart)
    pub restart: usize,
    /// Relative tolerance for convergence
    pub tolerance: f64,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for GmresConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            restart: 30,
            tolerance: 1e-10,
            print_interval: 0,
        }
    }
}

/// GMRES solver result
#[derive(Debug)]
pub struct GmresSolution {
    /// Solution vector
    pub x: Array1<f64>,
    /// Total number of matrix-vector products
    pub iterations: usize,
    /// Number of restarts performed
    pub restarts: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the restarted GMRES method
///
/// # Arguments
/// * `operator` - Linear operator representing A
/// * `b` - Right-hand side vector
/// * `config` - Solver configuration
///
/// # Returns
/// Solution struct containing x, iteration count, and convergence info
pub fn gmres<A>(operator: &A, b: &Array1<f64>, config: &GmresConfig) -> GmresSolution
where
    A: LinearOperator,
{
    gmres_preconditioned_with_guess(operator, &IdentityPreconditioner, b, None, config)
}

/// Solve Ax = b using GMRES with an initial guess
pub fn gmres_with_guess<A>(
    operator: &A,
    b: &Array1<f64>,
    x0: Option<&Array1<f64>>,
    config: &GmresConfig,
) -> GmresSolution
where
    A: LinearOperator,
{
    gmres_preconditioned_with_guess(operator, &IdentityPreconditioner, b, x0, config)
}

/// GMRES solver with preconditioner
pub fn gmres_preconditioned<A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<f64>,
    config: &GmresConfig,
) -> GmresSolution
where
    A: LinearOperator,
    P: Preconditioner,
{
    gmres_preconditioned_with_guess(operator, precond, b, None, config)
}

/// GMRES solver with right preconditioner and initial guess
///
/// Solves `A M⁻¹ y = b - A x0` and recovers `x = x0 + M⁻¹ y`.
pub fn gmres_preconditioned_with_guess<A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<f64>,
    x0: Option<&Array1<f64>>,
    config: &GmresConfig,
) -> GmresSolution
where
    A: LinearOperator,
    P: Preconditioner,
{
    let n = b.len();
    let m = config.restart.max(1);

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => Array1::zeros(n),
    };

    let scale = residual_scale(b);
    let mut total_iterations = 0;
    let mut restarts = 0;

    for _outer in 0..config.max_iterations {
        let r = b - &operator.apply(&x);
        let beta = vector_norm(&r);

        let rel_residual = beta / scale;
        if rel_residual < config.tolerance {
            return GmresSolution {
                x,
                iterations: total_iterations,
                restarts,
                residual: rel_residual,
                converged: true,
            };
        }

        // Krylov basis
        let mut v: Vec<Array1<f64>> = Vec::with_capacity(m + 1);
        v.push(&r / beta);

        // Upper Hessenberg matrix and Givens rotations
        let mut h: Array2<f64> = Array2::zeros((m + 1, m));
        let mut cs: Vec<f64> = Vec::with_capacity(m);
        let mut sn: Vec<f64> = Vec::with_capacity(m);

        // Right-hand side of the least squares problem
        let mut g: Array1<f64> = Array1::zeros(m + 1);
        g[0] = beta;

        let mut inner_steps = m;

        for j in 0..m {
            total_iterations += 1;

            // w = A * M⁻¹ * v_j
            let mut w = operator.apply(&precond.apply(&v[j]));

            // Modified Gram-Schmidt orthogonalization
            for i in 0..=j {
                h[[i, j]] = inner_product(&v[i], &w);
                axpy(-h[[i, j]], &v[i], &mut w);
            }

            let w_norm = vector_norm(&w);
            h[[j + 1, j]] = w_norm;

            // Happy breakdown: the Krylov space already contains the solution
            let breakdown = w_norm < 1e-14 * beta;
            if !breakdown {
                v.push(&w / w_norm);
            }

            // Apply previous Givens rotations to the new column of H
            for i in 0..j {
                let temp = cs[i] * h[[i, j]] + sn[i] * h[[i + 1, j]];
                h[[i + 1, j]] = -sn[i] * h[[i, j]] + cs[i] * h[[i + 1, j]];
                h[[i, j]] = temp;
            }

            let (c, s) = givens_rotation(h[[j, j]], h[[j + 1, j]]);
            cs.push(c);
            sn.push(s);

            h[[j, j]] = c * h[[j, j]] + s * h[[j + 1, j]];
            h[[j + 1, j]] = 0.0;

            g[j + 1] = -s * g[j];
            g[j] *= c;

            let rel_residual = g[j + 1].abs() / scale;

            if config.print_interval > 0 && total_iterations % config.print_interval == 0 {
                log::info!(
                    "GMRES iteration {} (restart {}): relative residual = {:.6e}",
                    total_iterations,
                    restarts,
                    rel_residual
                );
            }

            if rel_residual < config.tolerance || breakdown {
                inner_steps = j + 1;
                break;
            }
        }

        // x = x + M⁻¹ (V y)
        let y = solve_upper_triangular(&h, &g, inner_steps);
        let mut update = Array1::zeros(n);
        for (i, &yi) in y.iter().enumerate() {
            axpy(yi, &v[i], &mut update);
        }
        x += &precond.apply(&update);

        // The next pass re-checks the true residual before restarting
        restarts += 1;
    }

    let residual = vector_norm(&(b - &operator.apply(&x))) / scale;
    GmresSolution {
        x,
        iterations: total_iterations,
        restarts,
        converged: residual < config.tolerance,
        residual,
    }
}

/// Compute Givens rotation coefficients
#[inline]
fn givens_rotation(a: f64, b: f64) -> (f64, f64) {
    if b.abs() < 1e-300 {
        return (1.0, 0.0);
    }
    if a.abs() < 1e-300 {
        return (0.0, b.signum());
    }
    let r = a.hypot(b);
    (a / r, b / r)
}

/// Solve upper triangular system Hy = g
fn solve_upper_triangular(h: &Array2<f64>, g: &Array1<f64>, k: usize) -> Vec<f64> {
    let mut y = vec![0.0; k];

    for i in (0..k).rev() {
        let mut sum = g[i];
        for j in (i + 1)..k {
            sum -= h[[i, j]] * y[j];
        }
        if h[[i, i]].abs() > 1e-300 {
            y[i] = sum / h[[i, i]];
        }
    }

    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioners::IluPreconditioner;
    use crate::sparse::CsrMatrix;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn convection_diffusion(n: usize, peclet: f64) -> CsrMatrix {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0 + peclet));
            if i > 0 {
                triplets.push((i, i - 1, -1.0 - peclet));
            }
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, triplets)
    }

    #[test]
    fn test_gmres_simple() {
        let dense = array![[4.0, 1.0], [1.0, 3.0]];
        let a = CsrMatrix::from_dense(&dense, 1e-15);
        let b = array![1.0, 2.0];

        let config = GmresConfig {
            max_iterations: 100,
            restart: 10,
            tolerance: 1e-10,
            print_interval: 0,
        };

        let solution = gmres(&a, &b, &config);
        assert!(solution.converged, "GMRES should converge");

        let error = vector_norm(&(&a.matvec(&solution.x) - &b));
        assert_relative_eq!(error, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_gmres_identity() {
        let n = 5;
        let id = CsrMatrix::identity(n);
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let solution = gmres(&id, &b, &GmresConfig {
            restart: 50,
            tolerance: 1e-12,
            ..Default::default()
        });

        assert!(solution.converged);
        assert!(solution.iterations <= 2);
        assert!(vector_norm(&(&solution.x - &b)) < 1e-10);
    }

    #[test]
    fn test_gmres_restarted_nonsymmetric() {
        let n = 40;
        let a = convection_diffusion(n, 5.0);
        let b = Array1::from_elem(n, 1.0);

        let config = GmresConfig {
            max_iterations: 200,
            restart: 5,
            tolerance: 1e-10,
            print_interval: 0,
        };
        let solution = gmres(&a, &b, &config);
        assert!(solution.converged);
        assert!(vector_norm(&(&a.matvec(&solution.x) - &b)) < 1e-8);
    }

    #[test]
    fn test_gmres_ilu_with_guess() {
        let n = 40;
        let a = convection_diffusion(n, 20.0);
        let x_exact = Array1::from_iter((0..n).map(|i| (i as f64 * 0.3).sin()));
        let b = a.matvec(&x_exact);
        let guess = Array1::from_elem(n, 0.1);

        let precond = IluPreconditioner::from_csr(&a);
        let solution =
            gmres_preconditioned_with_guess(&a, &precond, &b, Some(&guess), &GmresConfig::default());
        assert!(solution.converged);
        for (xi, ei) in solution.x.iter().zip(x_exact.iter()) {
            assert_relative_eq!(*xi, *ei, epsilon = 1e-8);
        }
    }
}
