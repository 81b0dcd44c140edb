//! Error types for the finite-volume engine
//!
//! Configuration errors are raised while evaluating coefficients and resolving
//! boundary conditions, before any linear solve is attempted. Linear-solve
//! failures are wrapped in [`FvmError::Solver`] so callers can tell the two
//! apart and pick their own recovery (smaller `dt`, another solver, abort).

use crate::field::Location;
use crate::solver::SolverError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FvmError>;

/// Errors reported by assembly, evaluation and the solve/sweep controller
#[derive(Debug, Error)]
pub enum FvmError {
    #[error("Operands live on different meshes")]
    MeshMismatch,
    #[error("Location mismatch: expected {expected:?} values, found {found:?} values")]
    LocationMismatch { expected: Location, found: Location },
    #[error("Rank mismatch: expected {expected} component(s), found {found}")]
    RankMismatch { expected: usize, found: usize },
    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("Variable '{name}' has no old value; create it with `with_history()`")]
    MissingOldValue { name: String },
    #[error("{scheme:?} convection requires a companion diffusion term")]
    MissingCompanionDiffusion { scheme: crate::term::ConvectionScheme },
    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("Face {face} is claimed by more than one boundary condition")]
    BoundaryConflict { face: usize },
    #[error("Face {face} is an interior face and cannot carry a boundary condition")]
    NotBoundaryFace { face: usize },
    #[error("Face index {face} out of range (mesh has {num_faces} faces)")]
    FaceOutOfRange { face: usize, num_faces: usize },
    #[error("Unknown face set '{0}'")]
    UnknownFaceSet(String),
    #[error("Differential operator '{0}' needs a mesh-located operand")]
    UnanchoredOperand(&'static str),
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("Case error: {0}")]
    Case(String),
}

impl FvmError {
    /// True for errors caused by an inconsistent problem setup
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, FvmError::Solver(_) | FvmError::Case(_))
    }

    /// True when the linear solver itself failed
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, FvmError::Solver(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let config = FvmError::MissingOldValue {
            name: "phi".to_string(),
        };
        assert!(config.is_configuration_error());
        assert!(!config.is_solver_failure());

        let solver = FvmError::from(SolverError::ConvergenceFailure(10, 1e-2));
        assert!(solver.is_solver_failure());
        assert!(!solver.is_configuration_error());
    }

    #[test]
    fn test_error_messages() {
        let err = FvmError::BoundaryConflict { face: 3 };
        assert_eq!(
            err.to_string(),
            "Face 3 is claimed by more than one boundary condition"
        );
        let err = FvmError::InvalidTimeStep(-1.0);
        assert!(err.to_string().contains("-1"));
    }
}
