//! Field values: variables, lazy expressions and differential operators
//!
//! A [`Variable`] owns cell or face data on a mesh. An [`Expr`] is a lazily
//! evaluated tree over variables, constants and mesh geometry, so a
//! coefficient built once reflects the current values of its dependencies
//! every time it is evaluated. Evaluation yields a [`FieldValue`].

mod expr;
pub(crate) mod operators;
mod value;
mod variable;

pub use expr::{BinaryOp, CompareOp, Expr, Interpolation, UnaryOp};
pub use operators::{divergence, face_gradient, face_interpolate, gradient};
pub use value::{FieldValue, LocatedValue};
pub use variable::Variable;

use serde::{Deserialize, Serialize};

/// Where the values of a field live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// One value per cell
    Cell,
    /// One value per face
    Face,
}

impl Location {
    /// Number of elements of this location on a mesh
    pub fn count(self, mesh: &dyn crate::mesh::Mesh) -> usize {
        match self {
            Location::Cell => mesh.num_cells(),
            Location::Face => mesh.num_faces(),
        }
    }
}
