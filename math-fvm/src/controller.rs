//! Solve and sweep entry points
//!
//! Both assemble the equation once and call the linear solver once. `sweep`
//! also reports the residual of the current values against the freshly
//! assembled system, so that a caller can repeat it at fixed `dt` until the
//! coefficients stop moving:
//!
//! ```
//! use fvm::{BoundaryConditions, FvMesh, MeshRef, SolverConfig, Term, Variable};
//! use std::sync::Arc;
//!
//! let mesh = Arc::new(FvMesh::grid_1d(10, 0.1)?);
//! let phi = Variable::cell_scalar("phi", mesh.clone() as MeshRef, 0.0);
//! let mut bcs = BoundaryConditions::new();
//! bcs.add_fixed_value(mesh.faces_left(), 1.0);
//! bcs.add_fixed_value(mesh.faces_right(), 0.0);
//!
//! // ∇·((1 + φ)∇φ) = 0
//! let eq = Term::diffusion(1.0 + &phi);
//! let solver = SolverConfig::default();
//! for _ in 0..50 {
//!     if eq.sweep(&phi, &bcs, 1.0, &solver)? < 1e-10 {
//!         break;
//!     }
//! }
//! # Ok::<(), fvm::FvmError>(())
//! ```
//!
//! The loop, and any coupling between several fields, stays with the caller.

use crate::assembly::{Assembler, LinearSystem};
use crate::boundary::BoundaryConditions;
use crate::equation::Equation;
use crate::error::Result;
use crate::field::Variable;
use crate::solver::{LinearSolver, SolverConfig};
use crate::term::Term;

/// Everything a solve needs besides the equation and the unknown
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub boundary_conditions: BoundaryConditions,
    /// Time step, only read by transient terms
    pub dt: f64,
    pub solver: SolverConfig,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            boundary_conditions: BoundaryConditions::new(),
            dt: 1.0,
            solver: SolverConfig::default(),
        }
    }
}

impl SolveOptions {
    pub fn new(boundary_conditions: BoundaryConditions) -> Self {
        Self {
            boundary_conditions,
            ..Default::default()
        }
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

impl Equation {
    /// Assemble, solve once and write the result into `var`
    pub fn solve(
        &self,
        var: &Variable,
        bcs: &BoundaryConditions,
        dt: f64,
        solver: &dyn LinearSolver,
    ) -> Result<()> {
        self.sweep(var, bcs, dt, solver).map(|_| ())
    }

    /// Like [`solve`](Self::solve), returning `‖M φ − r‖₂` for the values
    /// `var` held before the update
    pub fn sweep(
        &self,
        var: &Variable,
        bcs: &BoundaryConditions,
        dt: f64,
        solver: &dyn LinearSolver,
    ) -> Result<f64> {
        let system = Assembler::new(var, bcs, dt)?.assemble(self)?;
        apply(&system, var, solver)
    }

    pub fn solve_with(&self, var: &Variable, options: &SolveOptions) -> Result<()> {
        self.solve(var, &options.boundary_conditions, options.dt, &options.solver)
    }

    pub fn sweep_with(&self, var: &Variable, options: &SolveOptions) -> Result<f64> {
        self.sweep(var, &options.boundary_conditions, options.dt, &options.solver)
    }
}

impl Term {
    /// Solve the one-term equation `self = 0`
    pub fn solve(
        &self,
        var: &Variable,
        bcs: &BoundaryConditions,
        dt: f64,
        solver: &dyn LinearSolver,
    ) -> Result<()> {
        Equation::from(self.clone()).solve(var, bcs, dt, solver)
    }

    /// Sweep the one-term equation `self = 0`
    pub fn sweep(
        &self,
        var: &Variable,
        bcs: &BoundaryConditions,
        dt: f64,
        solver: &dyn LinearSolver,
    ) -> Result<f64> {
        Equation::from(self.clone()).sweep(var, bcs, dt, solver)
    }
}

/// Solve `system` from the current values and store the solution
///
/// `var` is only written once the solver has succeeded.
fn apply(system: &LinearSystem, var: &Variable, solver: &dyn LinearSolver) -> Result<f64> {
    let current = var.values();
    let residual = system.residual(&current);
    let solution = solver.solve(&system.matrix, &system.rhs, &current)?;
    log::debug!(
        "'{}': residual {:.3e}, {} solver iterations",
        var.name(),
        residual,
        solution.iterations
    );
    var.set_values(&solution.values)?;
    Ok(residual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FvmError;
    use crate::mesh::{FvMesh, MeshRef};
    use crate::solver::SolverError;
    use approx::assert_relative_eq;
    use ndarray::Array1;
    use std::sync::Arc;

    fn setup(n: usize) -> (Arc<FvMesh>, Variable, BoundaryConditions) {
        let mesh = Arc::new(FvMesh::grid_1d(n, 1.0).unwrap());
        let phi = Variable::cell_scalar("phi", mesh.clone() as MeshRef, 0.0);
        let mut bcs = BoundaryConditions::new();
        bcs.add_fixed_value(mesh.faces_left(), 0.0);
        bcs.add_fixed_value(mesh.faces_right(), 1.0);
        (mesh, phi, bcs)
    }

    #[test]
    fn test_term_solve() {
        let (_, phi, bcs) = setup(4);
        Term::diffusion(1.0)
            .solve(&phi, &bcs, 1.0, &SolverConfig::lu())
            .unwrap();
        let values = phi.values();
        for (i, v) in values.iter().enumerate() {
            assert_relative_eq!(*v, (i as f64 + 0.5) / 4.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sweep_residual_vanishes_at_solution() {
        let (_, phi, bcs) = setup(6);
        let eq = Equation::from(Term::diffusion(1.0));
        let options = SolveOptions::new(bcs).with_solver(SolverConfig::pcg(1e-12, 100));
        let first = eq.sweep_with(&phi, &options).unwrap();
        let second = eq.sweep_with(&phi, &options).unwrap();
        // First residual is ‖r‖ at φ = 0: only the right boundary row is non-zero
        assert_relative_eq!(first, 2.0, epsilon = 1e-12);
        assert!(second < 1e-10);
    }

    /// Solver that always fails
    struct Failing;

    impl LinearSolver for Failing {
        fn solve(
            &self,
            _matrix: &solvers::CsrMatrix,
            _rhs: &Array1<f64>,
            _guess: &Array1<f64>,
        ) -> std::result::Result<crate::solver::Solution, SolverError> {
            Err(SolverError::ConvergenceFailure(7, 0.5))
        }
    }

    #[test]
    fn test_solver_failure_leaves_variable_untouched() {
        let (_, phi, bcs) = setup(3);
        phi.set_value(0.25);
        let err = Term::diffusion(1.0)
            .solve(&phi, &bcs, 1.0, &Failing)
            .unwrap_err();
        assert!(err.is_solver_failure());
        assert!(matches!(
            err,
            FvmError::Solver(SolverError::ConvergenceFailure(7, _))
        ));
        assert!(phi.values().iter().all(|&v| v == 0.25));
    }

    #[test]
    fn test_configuration_error_precedes_solve() {
        let (mesh, phi, mut bcs) = setup(3);
        bcs.add_fixed_flux(mesh.faces_left(), 1.0);
        let err = Term::diffusion(1.0)
            .solve(&phi, &bcs, 1.0, &Failing)
            .unwrap_err();
        assert!(err.is_configuration_error());
        assert!(matches!(err, FvmError::BoundaryConflict { .. }));
    }

    #[test]
    fn test_default_options() {
        let options = SolveOptions::default().with_dt(0.5);
        assert_eq!(options.dt, 0.5);
        assert!(options.boundary_conditions.is_empty());
    }
}
