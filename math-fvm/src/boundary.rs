//! Boundary conditions
//!
//! A condition pairs a set of boundary faces with a constraint kind and a
//! value expression. Conditions are read-only inputs to solve and sweep:
//! before assembly they are resolved into one optional constraint per face,
//! which is where conflicts and misplaced faces are caught.
//!
//! - **FixedValue**: φ = g on the face
//! - **FixedFlux**: the outward normal flux density through the face is g
//!
//! Boundary faces without a condition carry no flux.

use crate::error::{FvmError, Result};
use crate::field::{Expr, FieldValue, Location};
use crate::mesh::{Mesh, MeshRef, same_mesh};
use serde::{Deserialize, Serialize};

/// Constraint kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    FixedValue,
    FixedFlux,
}

/// A (faces, kind, value) triple
#[derive(Debug, Clone)]
pub struct BoundaryCondition {
    faces: Vec<usize>,
    kind: BoundaryKind,
    value: Expr,
}

impl BoundaryCondition {
    pub fn new(faces: impl Into<Vec<usize>>, kind: BoundaryKind, value: impl Into<Expr>) -> Self {
        Self {
            faces: faces.into(),
            kind,
            value: value.into(),
        }
    }

    /// Dirichlet condition: φ = value
    pub fn fixed_value(faces: impl Into<Vec<usize>>, value: impl Into<Expr>) -> Self {
        Self::new(faces, BoundaryKind::FixedValue, value)
    }

    /// Prescribed outward normal flux density
    pub fn fixed_flux(faces: impl Into<Vec<usize>>, value: impl Into<Expr>) -> Self {
        Self::new(faces, BoundaryKind::FixedFlux, value)
    }

    /// Condition on a named face set of `mesh`
    pub fn on_set(
        mesh: &dyn Mesh,
        name: &str,
        kind: BoundaryKind,
        value: impl Into<Expr>,
    ) -> Result<Self> {
        Ok(Self::new(mesh.faces(name)?, kind, value))
    }

    pub fn faces(&self) -> &[usize] {
        &self.faces
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }
}

/// Per-face constraint after resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceConstraint {
    FixedValue(f64),
    FixedFlux(f64),
}

/// One optional constraint per mesh face
#[derive(Debug, Clone)]
pub struct ResolvedBoundary {
    constraints: Vec<Option<FaceConstraint>>,
}

impl ResolvedBoundary {
    /// No constraint on any face
    pub fn empty(num_faces: usize) -> Self {
        Self {
            constraints: vec![None; num_faces],
        }
    }

    pub fn get(&self, face: usize) -> Option<FaceConstraint> {
        self.constraints.get(face).copied().flatten()
    }

    pub fn fixed_value(&self, face: usize) -> Option<f64> {
        match self.get(face) {
            Some(FaceConstraint::FixedValue(v)) => Some(v),
            _ => None,
        }
    }

    pub fn fixed_flux(&self, face: usize) -> Option<f64> {
        match self.get(face) {
            Some(FaceConstraint::FixedFlux(v)) => Some(v),
            _ => None,
        }
    }

    /// Constrained faces in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, FaceConstraint)> + '_ {
        self.constraints
            .iter()
            .enumerate()
            .filter_map(|(f, c)| c.map(|c| (f, c)))
    }
}

/// Collection of boundary conditions for one solve
#[derive(Debug, Clone, Default)]
pub struct BoundaryConditions {
    conditions: Vec<BoundaryCondition>,
}

impl BoundaryConditions {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Builder form of [`push`](Self::push)
    pub fn with(mut self, condition: BoundaryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: BoundaryCondition) {
        self.conditions.push(condition);
    }

    /// Add a FixedValue condition
    pub fn add_fixed_value(&mut self, faces: impl Into<Vec<usize>>, value: impl Into<Expr>) {
        self.push(BoundaryCondition::fixed_value(faces, value));
    }

    /// Add a FixedFlux condition
    pub fn add_fixed_flux(&mut self, faces: impl Into<Vec<usize>>, value: impl Into<Expr>) {
        self.push(BoundaryCondition::fixed_flux(faces, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryCondition> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate every condition and build the per-face table
    ///
    /// Fails on faces out of range, interior faces, faces claimed twice and
    /// values that are not scalar uniform or face-located on `mesh`.
    pub fn resolve(&self, mesh: &MeshRef) -> Result<ResolvedBoundary> {
        let num_faces = mesh.num_faces();
        let mut resolved = ResolvedBoundary::empty(num_faces);

        for condition in &self.conditions {
            let value = condition.value.evaluate()?;
            check_value(&value, mesh)?;

            for &face in &condition.faces {
                if face >= num_faces {
                    return Err(FvmError::FaceOutOfRange { face, num_faces });
                }
                if !mesh.is_boundary(face) {
                    return Err(FvmError::NotBoundaryFace { face });
                }
                if resolved.constraints[face].is_some() {
                    return Err(FvmError::BoundaryConflict { face });
                }
                let v = value.get(face, 0);
                resolved.constraints[face] = Some(match condition.kind {
                    BoundaryKind::FixedValue => FaceConstraint::FixedValue(v),
                    BoundaryKind::FixedFlux => FaceConstraint::FixedFlux(v),
                });
            }
        }

        Ok(resolved)
    }
}

fn check_value(value: &FieldValue, mesh: &MeshRef) -> Result<()> {
    if value.components() != 1 {
        return Err(FvmError::RankMismatch {
            expected: 1,
            found: value.components(),
        });
    }
    if let Some(located) = value.located() {
        if !same_mesh(&located.mesh, mesh) {
            return Err(FvmError::MeshMismatch);
        }
        if located.location != Location::Face {
            return Err(FvmError::LocationMismatch {
                expected: Location::Face,
                found: located.location,
            });
        }
    }
    Ok(())
}
