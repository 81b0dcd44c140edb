//! Mesh adapter
//!
//! The engine never builds geometry itself. It reads topology and geometry
//! through the [`Mesh`] trait, so any pre-built mesh can be plugged in.
//! [`FvMesh`] is an explicit-storage implementation with structured-grid
//! constructors for callers and tests.
//!
//! Conventions:
//! - every face has exactly one owner cell and at most one neighbour;
//! - a face without neighbour is a boundary face;
//! - face normals are unit vectors pointing from owner to neighbour, or
//!   outward on boundary faces;
//! - every boundary face belongs to exactly one named face set.

mod grid;

pub use grid::{FvMesh, MeshParts};

use crate::error::{FvmError, Result};
use std::fmt;
use std::sync::Arc;

/// Shared, immutable mesh handle
pub type MeshRef = Arc<dyn Mesh>;

/// Read-only finite-volume mesh
///
/// Vectors are returned as `[f64; 3]`; only the first [`Mesh::dim`]
/// components are meaningful.
pub trait Mesh: fmt::Debug + Send + Sync {
    /// Spatial dimension (1, 2 or 3)
    fn dim(&self) -> usize;

    /// Number of cells
    fn num_cells(&self) -> usize;

    /// Number of faces
    fn num_faces(&self) -> usize;

    /// Owner cell of a face
    fn owner(&self, face: usize) -> usize;

    /// Neighbour cell of a face, `None` on boundary faces
    fn neighbour(&self, face: usize) -> Option<usize>;

    /// Cell volume
    fn cell_volume(&self, cell: usize) -> f64;

    /// Cell centroid
    fn cell_center(&self, cell: usize) -> [f64; 3];

    /// Face area
    fn face_area(&self, face: usize) -> f64;

    /// Unit face normal
    fn face_normal(&self, face: usize) -> [f64; 3];

    /// Face centroid
    fn face_center(&self, face: usize) -> [f64; 3];

    /// Distance from the owner centre to the face (d_Pf)
    fn owner_distance(&self, face: usize) -> f64;

    /// Distance from the face to the neighbour centre (d_fN)
    fn neighbour_distance(&self, face: usize) -> Option<f64>;

    /// Faces of a named set
    fn face_set(&self, name: &str) -> Option<&[usize]>;

    /// Names of all face sets
    fn face_set_names(&self) -> Vec<String>;

    /// True if the face has no neighbour
    fn is_boundary(&self, face: usize) -> bool {
        self.neighbour(face).is_none()
    }

    /// Centre-to-centre distance across a face (d_PN)
    ///
    /// On boundary faces this is the owner-to-face distance.
    fn cell_distance(&self, face: usize) -> f64 {
        self.owner_distance(face) + self.neighbour_distance(face).unwrap_or(0.0)
    }

    /// Interpolation weight of the neighbour, `d_Pf / d_PN` (0 on boundary faces)
    fn neighbour_weight(&self, face: usize) -> f64 {
        match self.neighbour_distance(face) {
            Some(d_fn) => {
                let d_pf = self.owner_distance(face);
                d_pf / (d_pf + d_fn)
            }
            None => 0.0,
        }
    }

    /// All boundary faces, in index order
    fn boundary_faces(&self) -> Vec<usize> {
        (0..self.num_faces())
            .filter(|&f| self.is_boundary(f))
            .collect()
    }

    /// Faces of a named set, failing on an unknown name
    fn faces(&self, name: &str) -> Result<&[usize]> {
        self.face_set(name)
            .ok_or_else(|| FvmError::UnknownFaceSet(name.to_string()))
    }
}

/// True if both handles point at the same mesh
pub fn same_mesh(a: &MeshRef, b: &MeshRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Dot product of the first `dim` components
pub(crate) fn dot(dim: usize, a: &[f64; 3], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).take(dim).map(|(x, y)| x * y).sum()
}
