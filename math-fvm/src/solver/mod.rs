//! Linear solvers for assembled finite-volume systems
//!
//! The controller never picks a solver itself: it receives a
//! [`LinearSolver`] per call. [`SolverConfig`] is the stock implementation,
//! dispatching to the sparse solvers of the `math-fvm-solvers` crate.
//!
//! # Solver Types
//!
//! - **Auto**: PCG for symmetric matrices, GMRES+ILU otherwise
//! - **Lu**: dense LU factorization (small problems and reference solutions)
//! - **Pcg** / **Cg**: conjugate gradient with and without Jacobi scaling
//! - **Cgs** / **BiCgstab** / **Gmres** / **GmresIlu**: non-symmetric systems,
//!   as produced by convection terms

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use solvers::{
    BiCgstabConfig, CgConfig, CgsConfig, CsrMatrix, DiagonalPreconditioner, GmresConfig, LuError,
    IluPreconditioner, bicgstab_with_guess, cgs_with_guess, gmres_preconditioned_with_guess,
    gmres_with_guess, lu_solve, pcg,
};
use std::time::Instant;
use thiserror::Error;

/// Relative tolerance used by [`SolverType::Auto`] to detect symmetry
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Solves `A x = b` for an assembled system
pub trait LinearSolver {
    /// Solve starting from `guess` (ignored by direct solvers)
    fn solve(
        &self,
        matrix: &CsrMatrix,
        rhs: &Array1<f64>,
        guess: &Array1<f64>,
    ) -> Result<Solution, SolverError>;
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Solver type to use
    pub solver_type: SolverType,
    /// Iteration budget for iterative solvers
    pub max_iterations: usize,
    /// Relative residual tolerance `‖b − Ax‖ / ‖b‖`
    pub tolerance: f64,
    /// GMRES restart length
    pub restart: usize,
    /// Verbosity level (0 = quiet, 1 = summary, 2+ = per-iteration)
    pub verbosity: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            solver_type: SolverType::Auto,
            max_iterations: 1000,
            tolerance: 1e-12,
            restart: 50,
            verbosity: 0,
        }
    }
}

/// Type of solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverType {
    /// PCG if the matrix is symmetric, GMRES+ILU otherwise
    #[default]
    Auto,
    /// Direct LU factorization on the dense matrix
    Lu,
    /// Conjugate gradient with Jacobi preconditioning
    Pcg,
    /// Unpreconditioned conjugate gradient
    Cg,
    /// Conjugate gradient squared
    Cgs,
    /// BiCGSTAB
    BiCgstab,
    /// Restarted GMRES without preconditioning
    Gmres,
    /// Restarted GMRES with ILU(0) preconditioning
    GmresIlu,
}

/// Solution result from the solver
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution vector
    pub values: Array1<f64>,
    /// Number of iterations (0 for direct solver)
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether the solver converged
    pub converged: bool,
}

/// Solver errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("Solver failed to converge after {0} iterations (residual: {1})")]
    ConvergenceFailure(usize, f64),
    #[error("Direct solver failed: singular matrix")]
    SingularMatrix,
    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<LuError> for SolverError {
    fn from(err: LuError) -> Self {
        match err {
            LuError::SingularMatrix { .. } => SolverError::SingularMatrix,
            LuError::DimensionMismatch { expected, got } => SolverError::DimensionMismatch {
                expected,
                actual: got,
            },
        }
    }
}

impl SolverConfig {
    /// Jacobi-preconditioned conjugate gradient
    pub fn pcg(tolerance: f64, max_iterations: usize) -> Self {
        Self::with_type(SolverType::Pcg, tolerance, max_iterations)
    }

    pub fn cgs(tolerance: f64, max_iterations: usize) -> Self {
        Self::with_type(SolverType::Cgs, tolerance, max_iterations)
    }

    pub fn bicgstab(tolerance: f64, max_iterations: usize) -> Self {
        Self::with_type(SolverType::BiCgstab, tolerance, max_iterations)
    }

    /// GMRES with ILU(0)
    pub fn gmres(tolerance: f64, max_iterations: usize) -> Self {
        Self::with_type(SolverType::GmresIlu, tolerance, max_iterations)
    }

    pub fn lu() -> Self {
        Self {
            solver_type: SolverType::Lu,
            ..Default::default()
        }
    }

    fn with_type(solver_type: SolverType, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            solver_type,
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    fn print_interval(&self) -> usize {
        if self.verbosity > 1 { 1 } else { 0 }
    }

    /// Resolve [`SolverType::Auto`] for `matrix`
    pub fn effective_type(&self, matrix: &CsrMatrix) -> SolverType {
        match self.solver_type {
            SolverType::Auto if matrix.is_symmetric(SYMMETRY_TOLERANCE) => SolverType::Pcg,
            SolverType::Auto => SolverType::GmresIlu,
            other => other,
        }
    }
}

impl LinearSolver for SolverConfig {
    fn solve(
        &self,
        matrix: &CsrMatrix,
        rhs: &Array1<f64>,
        guess: &Array1<f64>,
    ) -> Result<Solution, SolverError> {
        let n = matrix.num_rows;
        if matrix.num_cols != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                actual: matrix.num_cols,
            });
        }
        for len in [rhs.len(), guess.len()] {
            if len != n {
                return Err(SolverError::DimensionMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }

        let solver_type = self.effective_type(matrix);
        if self.verbosity > 0 {
            log::info!(
                "[FVM] System: {} unknowns, {} nnz, solver {:?}",
                n,
                matrix.nnz(),
                solver_type
            );
        }

        let start = Instant::now();
        let result = match solver_type {
            SolverType::Lu => solve_lu(matrix, rhs),
            SolverType::Pcg => solve_cg(matrix, rhs, guess, self, true),
            SolverType::Cg => solve_cg(matrix, rhs, guess, self, false),
            SolverType::Cgs => solve_cgs(matrix, rhs, guess, self),
            SolverType::BiCgstab => solve_bicgstab(matrix, rhs, guess, self),
            SolverType::Gmres => solve_gmres(matrix, rhs, guess, self, false),
            SolverType::GmresIlu | SolverType::Auto => solve_gmres(matrix, rhs, guess, self, true),
        };

        if self.verbosity > 0 {
            match &result {
                Ok(sol) => log::info!(
                    "[FVM] Solve: {} iters, residual {:.2e}, time {:.1}ms",
                    sol.iterations,
                    sol.residual,
                    start.elapsed().as_secs_f64() * 1000.0
                ),
                Err(err) => log::info!("[FVM] Solve failed: {err}"),
            }
        }

        result
    }
}

/// Turn an iterative result into a solution or a convergence failure
fn finish(
    x: Array1<f64>,
    iterations: usize,
    residual: f64,
    converged: bool,
) -> Result<Solution, SolverError> {
    if !converged || !x.iter().all(|v| v.is_finite()) {
        return Err(SolverError::ConvergenceFailure(iterations, residual));
    }
    Ok(Solution {
        values: x,
        iterations,
        residual,
        converged,
    })
}

fn solve_lu(matrix: &CsrMatrix, rhs: &Array1<f64>) -> Result<Solution, SolverError> {
    // Dense conversion: only suitable for small problems
    let dense = matrix.to_dense();
    let x = lu_solve(&dense, rhs)?;
    if !x.iter().all(|v| v.is_finite()) {
        return Err(SolverError::SingularMatrix);
    }

    let r = rhs - &matrix.matvec(&x);
    let residual = solvers::blas_helpers::vector_norm(&r) / solvers::blas_helpers::residual_scale(rhs);

    Ok(Solution {
        values: x,
        iterations: 0,
        residual,
        converged: true,
    })
}

fn solve_cg(
    matrix: &CsrMatrix,
    rhs: &Array1<f64>,
    guess: &Array1<f64>,
    config: &SolverConfig,
    jacobi: bool,
) -> Result<Solution, SolverError> {
    let cg_config = CgConfig {
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
        print_interval: config.print_interval(),
    };
    let result = if jacobi {
        let precond = DiagonalPreconditioner::from_csr(matrix);
        pcg(matrix, &precond, rhs, Some(guess), &cg_config)
    } else {
        pcg(
            matrix,
            &solvers::IdentityPreconditioner,
            rhs,
            Some(guess),
            &cg_config,
        )
    };
    finish(result.x, result.iterations, result.residual, result.converged)
}

fn solve_cgs(
    matrix: &CsrMatrix,
    rhs: &Array1<f64>,
    guess: &Array1<f64>,
    config: &SolverConfig,
) -> Result<Solution, SolverError> {
    let cgs_config = CgsConfig {
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
        print_interval: config.print_interval(),
    };
    let result = cgs_with_guess(matrix, rhs, Some(guess), &cgs_config);
    finish(result.x, result.iterations, result.residual, result.converged)
}

fn solve_bicgstab(
    matrix: &CsrMatrix,
    rhs: &Array1<f64>,
    guess: &Array1<f64>,
    config: &SolverConfig,
) -> Result<Solution, SolverError> {
    let bicgstab_config = BiCgstabConfig {
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
        print_interval: config.print_interval(),
    };
    let result = bicgstab_with_guess(matrix, rhs, Some(guess), &bicgstab_config);
    finish(result.x, result.iterations, result.residual, result.converged)
}

/// GMRES with or without ILU(0)
///
/// ILU(0) needs a non-zero diagonal; rows produced by a finite-volume
/// assembly always have one.
fn solve_gmres(
    matrix: &CsrMatrix,
    rhs: &Array1<f64>,
    guess: &Array1<f64>,
    config: &SolverConfig,
    ilu: bool,
) -> Result<Solution, SolverError> {
    let gmres_config = GmresConfig {
        max_iterations: config.max_iterations,
        restart: config.restart,
        tolerance: config.tolerance,
        print_interval: config.print_interval(),
    };
    let result = if ilu {
        let precond = IluPreconditioner::from_csr(matrix);
        gmres_preconditioned_with_guess(matrix, &precond, rhs, Some(guess), &gmres_config)
    } else {
        gmres_with_guess(matrix, rhs, Some(guess), &gmres_config)
    };
    finish(result.x, result.iterations, result.residual, result.converged)
}
