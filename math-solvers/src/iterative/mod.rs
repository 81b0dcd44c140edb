//! Iterative solvers for linear systems
//!
//! This module provides Krylov subspace methods for solving large sparse systems:
//! - [`gmres`]: GMRES(m) with restart - best for general non-symmetric systems
//! - [`bicgstab`]: BiCGSTAB - good alternative to GMRES
//! - [`cgs`]: CGS - faster but less stable than BiCGSTAB
//! - [`cg`] / [`pcg`]: Conjugate Gradient - for symmetric definite systems
//!
//! Every solver has a `*_with_guess` form so that repeated sweeps can start
//! from the current field value.

mod bicgstab;
mod cg;
mod cgs;
mod gmres;

pub use bicgstab::{BiCgstabConfig, BiCgstabSolution, bicgstab, bicgstab_with_guess};
pub use cg::{CgConfig, CgSolution, cg, pcg};
pub use cgs::{CgsConfig, CgsSolution, cgs, cgs_with_guess};
pub use gmres::{
    GmresConfig, GmresSolution, gmres, gmres_preconditioned, gmres_preconditioned_with_guess,
    gmres_with_guess,
};
