//! Evaluated field values with broadcasting

use super::Location;
use crate::error::{FvmError, Result};
use crate::mesh::{MeshRef, same_mesh};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Values attached to the cells or faces of a mesh
///
/// Stored as a `(len, components)` array: one row per element.
#[derive(Debug, Clone)]
pub struct LocatedValue {
    pub mesh: MeshRef,
    pub location: Location,
    pub values: Array2<f64>,
}

impl LocatedValue {
    pub fn new(mesh: MeshRef, location: Location, values: Array2<f64>) -> Self {
        Self {
            mesh,
            location,
            values,
        }
    }

    /// Single-component values from a vector
    pub fn from_scalars(mesh: MeshRef, location: Location, values: Array1<f64>) -> Self {
        Self::new(mesh, location, values.insert_axis(Axis(1)))
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Number of components per element
    pub fn components(&self) -> usize {
        self.values.ncols()
    }

    /// First component of element `i`
    pub fn scalar(&self, i: usize) -> f64 {
        self.values[[i, 0]]
    }

    /// All components of element `i`
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// First component of every element
    pub fn scalars(&self) -> Array1<f64> {
        self.values.column(0).to_owned()
    }

    fn check_compatible(&self, other: &LocatedValue) -> Result<()> {
        if !same_mesh(&self.mesh, &other.mesh) {
            return Err(FvmError::MeshMismatch);
        }
        if self.location != other.location {
            return Err(FvmError::LocationMismatch {
                expected: self.location,
                found: other.location,
            });
        }
        Ok(())
    }
}

/// Result of evaluating an [`Expr`](super::Expr)
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Same value everywhere, one entry per component
    Uniform(Vec<f64>),
    /// One value per cell or face
    Located(LocatedValue),
}

/// Column to read when broadcasting a single component against several
fn broadcast_col(cols: usize, c: usize) -> usize {
    if cols == 1 { 0 } else { c }
}

fn result_components(a: usize, b: usize) -> Result<usize> {
    if a == b || b == 1 {
        Ok(a)
    } else if a == 1 {
        Ok(b)
    } else {
        Err(FvmError::RankMismatch {
            expected: a,
            found: b,
        })
    }
}

impl FieldValue {
    /// Uniform scalar
    pub fn scalar(value: f64) -> Self {
        FieldValue::Uniform(vec![value])
    }

    /// Number of components per element
    pub fn components(&self) -> usize {
        match self {
            FieldValue::Uniform(v) => v.len(),
            FieldValue::Located(l) => l.components(),
        }
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self, FieldValue::Uniform(_))
    }

    /// The located payload, if any
    pub fn located(&self) -> Option<&LocatedValue> {
        match self {
            FieldValue::Uniform(_) => None,
            FieldValue::Located(l) => Some(l),
        }
    }

    /// Component `c` of element `i`, broadcasting single-component values
    pub fn get(&self, i: usize, c: usize) -> f64 {
        match self {
            FieldValue::Uniform(v) => v[broadcast_col(v.len(), c)],
            FieldValue::Located(l) => l.values[[i, broadcast_col(l.components(), c)]],
        }
    }

    /// Apply `f` to every value
    pub fn map(&self, f: impl Fn(f64) -> f64) -> FieldValue {
        match self {
            FieldValue::Uniform(v) => FieldValue::Uniform(v.iter().map(|&x| f(x)).collect()),
            FieldValue::Located(l) => FieldValue::Located(LocatedValue::new(
                l.mesh.clone(),
                l.location,
                l.values.mapv(f),
            )),
        }
    }

    /// Combine two values elementwise with broadcasting
    ///
    /// Uniform values combine with anything, single-component values scale
    /// multi-component ones, located operands must share mesh and location.
    pub fn zip_with(&self, other: &FieldValue, f: impl Fn(f64, f64) -> f64) -> Result<FieldValue> {
        let comps = result_components(self.components(), other.components())?;
        match (self, other) {
            (FieldValue::Uniform(_), FieldValue::Uniform(_)) => Ok(FieldValue::Uniform(
                (0..comps).map(|c| f(self.get(0, c), other.get(0, c))).collect(),
            )),
            (FieldValue::Located(a), FieldValue::Located(b)) => {
                a.check_compatible(b)?;
                Ok(self.zip_located(a, other, comps, f))
            }
            (FieldValue::Located(a), FieldValue::Uniform(_)) => {
                Ok(self.zip_located(a, other, comps, f))
            }
            (FieldValue::Uniform(_), FieldValue::Located(b)) => {
                Ok(self.zip_located(b, other, comps, f))
            }
        }
    }

    fn zip_located(
        &self,
        anchor: &LocatedValue,
        other: &FieldValue,
        comps: usize,
        f: impl Fn(f64, f64) -> f64,
    ) -> FieldValue {
        let values = Array2::from_shape_fn((anchor.len(), comps), |(i, c)| {
            f(self.get(i, c), other.get(i, c))
        });
        FieldValue::Located(LocatedValue::new(anchor.mesh.clone(), anchor.location, values))
    }

    /// Inner product over components
    pub fn dot(&self, other: &FieldValue) -> Result<FieldValue> {
        if self.components() != other.components() {
            return Err(FvmError::RankMismatch {
                expected: self.components(),
                found: other.components(),
            });
        }
        let comps = self.components();
        let product = self.zip_with(other, |a, b| a * b)?;
        Ok(match product {
            FieldValue::Uniform(v) => FieldValue::Uniform(vec![v.iter().sum()]),
            FieldValue::Located(l) => {
                let sums = Array1::from_iter((0..l.len()).map(|i| {
                    (0..comps).map(|c| l.values[[i, c]]).sum::<f64>()
                }));
                FieldValue::Located(LocatedValue::from_scalars(l.mesh, l.location, sums))
            }
        })
    }

    /// Extract one component
    pub fn component(&self, index: usize) -> Result<FieldValue> {
        if index >= self.components() {
            return Err(FvmError::RankMismatch {
                expected: index + 1,
                found: self.components(),
            });
        }
        Ok(match self {
            FieldValue::Uniform(v) => FieldValue::scalar(v[index]),
            FieldValue::Located(l) => FieldValue::Located(LocatedValue::from_scalars(
                l.mesh.clone(),
                l.location,
                l.values.column(index).to_owned(),
            )),
        })
    }

    /// Broadcast to a full `(len, components)` array on `mesh` at `location`
    pub fn expand(
        &self,
        mesh: &MeshRef,
        location: Location,
        components: usize,
    ) -> Result<Array2<f64>> {
        let own = self.components();
        if own != components && own != 1 {
            return Err(FvmError::RankMismatch {
                expected: components,
                found: own,
            });
        }
        if let FieldValue::Located(l) = self {
            if !same_mesh(&l.mesh, mesh) {
                return Err(FvmError::MeshMismatch);
            }
            if l.location != location {
                return Err(FvmError::LocationMismatch {
                    expected: location,
                    found: l.location,
                });
            }
        }
        let n = location.count(mesh.as_ref());
        Ok(Array2::from_shape_fn((n, components), |(i, c)| self.get(i, c)))
    }

    /// Broadcast a single-component value to one entry per element
    pub fn expand_scalar(&self, mesh: &MeshRef, location: Location) -> Result<Array1<f64>> {
        if self.components() != 1 {
            return Err(FvmError::RankMismatch {
                expected: 1,
                found: self.components(),
            });
        }
        Ok(self.expand(mesh, location, 1)?.column(0).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FvMesh;
    use ndarray::array;
    use std::sync::Arc;

    fn mesh(n: usize) -> MeshRef {
        Arc::new(FvMesh::grid_1d(n, 1.0).unwrap())
    }

    fn cells(mesh: &MeshRef, values: Array1<f64>) -> FieldValue {
        FieldValue::Located(LocatedValue::from_scalars(mesh.clone(), Location::Cell, values))
    }

    #[test]
    fn test_uniform_broadcasts_over_located() {
        let m = mesh(3);
        let a = cells(&m, array![1.0, 2.0, 3.0]);
        let sum = a.zip_with(&FieldValue::scalar(10.0), |x, y| x + y).unwrap();
        let l = sum.located().unwrap();
        assert_eq!(l.scalars(), array![11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_scalar_scales_vector() {
        let v = FieldValue::Uniform(vec![1.0, -2.0]);
        let scaled = FieldValue::scalar(3.0).zip_with(&v, |a, b| a * b).unwrap();
        match scaled {
            FieldValue::Uniform(v) => assert_eq!(v, vec![3.0, -6.0]),
            _ => panic!("expected uniform"),
        }
    }

    #[test]
    fn test_rank_mismatch() {
        let a = FieldValue::Uniform(vec![1.0, 2.0]);
        let b = FieldValue::Uniform(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            a.zip_with(&b, |x, y| x + y),
            Err(FvmError::RankMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_mesh_and_location_mismatch() {
        let m1 = mesh(3);
        let m2 = mesh(3);
        let a = cells(&m1, array![1.0, 2.0, 3.0]);
        let b = cells(&m2, array![1.0, 2.0, 3.0]);
        assert!(matches!(
            a.zip_with(&b, |x, y| x + y),
            Err(FvmError::MeshMismatch)
        ));

        let faces = FieldValue::Located(LocatedValue::from_scalars(
            m1.clone(),
            Location::Face,
            array![0.0, 0.0, 0.0, 0.0],
        ));
        assert!(matches!(
            a.zip_with(&faces, |x, y| x + y),
            Err(FvmError::LocationMismatch { .. })
        ));
    }

    #[test]
    fn test_dot_and_component() {
        let m = mesh(2);
        let v = FieldValue::Located(LocatedValue::new(
            m.clone(),
            Location::Cell,
            array![[1.0, 2.0], [3.0, 4.0]],
        ));
        let d = v.dot(&FieldValue::Uniform(vec![1.0, 1.0])).unwrap();
        assert_eq!(d.located().unwrap().scalars(), array![3.0, 7.0]);

        let c = v.component(1).unwrap();
        assert_eq!(c.located().unwrap().scalars(), array![2.0, 4.0]);
        assert!(v.component(2).is_err());
    }

    #[test]
    fn test_expand() {
        let m = mesh(3);
        let e = FieldValue::scalar(2.5).expand_scalar(&m, Location::Face).unwrap();
        assert_eq!(e, array![2.5, 2.5, 2.5, 2.5]);

        let other = mesh(3);
        let a = cells(&m, array![1.0, 2.0, 3.0]);
        assert!(matches!(
            a.expand_scalar(&other, Location::Cell),
            Err(FvmError::MeshMismatch)
        ));
        assert!(matches!(
            a.expand_scalar(&m, Location::Face),
            Err(FvmError::LocationMismatch { .. })
        ));
    }
}
