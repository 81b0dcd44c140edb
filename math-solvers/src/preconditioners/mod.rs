//! Preconditioners for iterative solvers
//!
//! Preconditioners approximate A^(-1) to accelerate convergence of iterative methods.
//!
//! # Available Preconditioners
//!
//! - **DiagonalPreconditioner** (Jacobi): Simple diagonal scaling, fully parallel
//! - **IluPreconditioner**: Sequential ILU(0), best convergence on convection-dominated rows

mod diagonal;
mod ilu;

pub use diagonal::DiagonalPreconditioner;
pub use ilu::IluPreconditioner;

// Re-export IdentityPreconditioner from traits
pub use crate::traits::IdentityPreconditioner;
