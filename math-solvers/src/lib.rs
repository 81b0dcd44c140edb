//! Sparse linear solvers for finite-volume systems
//!
//! This crate provides a collection of iterative and direct solvers for real
//! linear systems, along with a CSR matrix representation and preconditioners.
//!
//! # Features
//!
//! - **Iterative Solvers**: GMRES, BiCGSTAB, CGS, CG/PCG
//! - **Direct Solvers**: LU decomposition with partial pivoting
//! - **Preconditioners**: Jacobi, ILU(0)
//! - **Sparse Matrices**: CSR format built from (row, col, value) triplets
//!
//! # Example
//!
//! ```
//! use math_fvm_solvers::{CsrMatrix, DiagonalPreconditioner, CgConfig, pcg};
//! use ndarray::array;
//!
//! let matrix = CsrMatrix::from_triplets(
//!     2,
//!     2,
//!     vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)],
//! );
//! let rhs = array![1.0, 2.0];
//!
//! let precond = DiagonalPreconditioner::from_csr(&matrix);
//! let solution = pcg(&matrix, &precond, &rhs, None, &CgConfig::default());
//! assert!(solution.converged);
//! ```

pub mod blas_helpers;
pub mod direct;
pub mod iterative;
pub mod preconditioners;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use sparse::CsrMatrix;
pub use traits::{LinearOperator, Preconditioner};

// Re-export iterative solvers
pub use iterative::{
    BiCgstabConfig, BiCgstabSolution, CgConfig, CgSolution, CgsConfig, CgsSolution, GmresConfig,
    GmresSolution, bicgstab, bicgstab_with_guess, cg, cgs, cgs_with_guess, gmres,
    gmres_preconditioned, gmres_preconditioned_with_guess, gmres_with_guess, pcg,
};

// Re-export direct solvers
pub use direct::{LuError, LuFactorization, lu_factorize, lu_solve};

// Re-export preconditioners
pub use preconditioners::{DiagonalPreconditioner, IdentityPreconditioner, IluPreconditioner};
