//! Finite-volume term algebra and assembly engine
//!
//! This crate discretizes scalar conservation equations on finite-volume
//! meshes. Equations are written as sums of terms, assembled into sparse
//! linear systems and solved with the solvers of the `math-fvm-solvers` crate.
//!
//! # Features
//!
//! - **Lazy field expressions**: coefficients follow the variables they read
//! - **Terms**: transient, diffusion, convection, implicit and explicit sources
//! - **Convection schemes**: power-law, exponential, hybrid, central, upwind
//! - **Boundary conditions**: fixed value and fixed flux on named face sets
//! - **Solve and sweep**: one-shot solves and residual-reporting sweeps for
//!   nonlinear problems
//!
//! # Example
//!
//! ```
//! use fvm::{BoundaryConditions, FvMesh, MeshRef, SolverConfig, Term, Variable};
//! use std::sync::Arc;
//!
//! // Steady diffusion between φ = 0 and φ = 1
//! let mesh = Arc::new(FvMesh::grid_1d(50, 1.0)?);
//! let phi = Variable::cell_scalar("phi", mesh.clone() as MeshRef, 0.0);
//!
//! let mut bcs = BoundaryConditions::new();
//! bcs.add_fixed_value(mesh.faces_left(), 0.0);
//! bcs.add_fixed_value(mesh.faces_right(), 1.0);
//!
//! Term::diffusion(1.0).solve(&phi, &bcs, 1.0, &SolverConfig::default())?;
//! assert!((phi.values()[0] - 0.01).abs() < 1e-8);
//! # Ok::<(), fvm::FvmError>(())
//! ```

pub mod assembly;
pub mod boundary;
pub mod config;
pub mod controller;
pub mod equation;
pub mod error;
pub mod field;
pub mod mesh;
pub mod solver;
pub mod term;

pub use assembly::{Assembler, LinearSystem, assemble};
pub use boundary::{BoundaryCondition, BoundaryConditions, BoundaryKind};
pub use config::{CaseConfig, CaseResult};
pub use controller::SolveOptions;
pub use equation::Equation;
pub use error::{FvmError, Result};
pub use field::{Expr, FieldValue, Location, Variable};
pub use mesh::{FvMesh, Mesh, MeshRef};
pub use solver::{LinearSolver, SolverConfig, SolverError, SolverType};
pub use term::{ConvectionScheme, Discretization, Term};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
