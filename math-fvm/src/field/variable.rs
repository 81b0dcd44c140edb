//! Solution variables with optional time history

use super::{Expr, FieldValue, Location};
use crate::error::{FvmError, Result};
use crate::mesh::{MeshRef, same_mesh};
use ndarray::{Array1, Array2};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct VariableData {
    name: String,
    mesh: MeshRef,
    location: Location,
    value: Array2<f64>,
    old: Option<Array2<f64>>,
}

/// Named field on the cells or faces of a mesh
///
/// `Variable` is a cheap handle: clones share the same storage, which is how
/// expressions see the current values at evaluation time. Handles are
/// single-threaded (`Rc<RefCell<_>>`), so a variable can never be written by
/// two threads during an assembly.
///
/// The old snapshot exists only for variables created with
/// [`Variable::with_history`], and only [`Variable::update_old`] writes it.
#[derive(Clone)]
pub struct Variable {
    inner: Rc<RefCell<VariableData>>,
}

impl Variable {
    /// Create a variable with every component set to `value`
    pub fn new(
        name: impl Into<String>,
        mesh: MeshRef,
        location: Location,
        components: usize,
        value: f64,
    ) -> Self {
        let n = location.count(mesh.as_ref());
        let data = VariableData {
            name: name.into(),
            mesh,
            location,
            value: Array2::from_elem((n, components.max(1)), value),
            old: None,
        };
        Self {
            inner: Rc::new(RefCell::new(data)),
        }
    }

    /// Scalar cell variable
    pub fn cell_scalar(name: impl Into<String>, mesh: MeshRef, value: f64) -> Self {
        Self::new(name, mesh, Location::Cell, 1, value)
    }

    /// Scalar face variable
    pub fn face_scalar(name: impl Into<String>, mesh: MeshRef, value: f64) -> Self {
        Self::new(name, mesh, Location::Face, 1, value)
    }

    /// Vector cell variable, uniform initial value
    pub fn cell_vector(name: impl Into<String>, mesh: MeshRef, value: &[f64]) -> Self {
        let var = Self::new(name, mesh, Location::Cell, value.len(), 0.0);
        var.fill_rows(value);
        var
    }

    /// Vector face variable, uniform initial value
    pub fn face_vector(name: impl Into<String>, mesh: MeshRef, value: &[f64]) -> Self {
        let var = Self::new(name, mesh, Location::Face, value.len(), 0.0);
        var.fill_rows(value);
        var
    }

    fn fill_rows(&self, value: &[f64]) {
        let mut data = self.inner.borrow_mut();
        for mut row in data.value.rows_mut() {
            for (dst, &src) in row.iter_mut().zip(value) {
                *dst = src;
            }
        }
    }

    /// Keep an old snapshot, initialised to the current values
    pub fn with_history(self) -> Self {
        {
            let mut data = self.inner.borrow_mut();
            if data.old.is_none() {
                data.old = Some(data.value.clone());
            }
        }
        self
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn mesh(&self) -> MeshRef {
        self.inner.borrow().mesh.clone()
    }

    pub fn location(&self) -> Location {
        self.inner.borrow().location
    }

    /// Number of components per element
    pub fn components(&self) -> usize {
        self.inner.borrow().value.ncols()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.borrow().value.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_history(&self) -> bool {
        self.inner.borrow().old.is_some()
    }

    /// True if both handles share storage
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy of the current values, `(len, components)`
    pub fn array(&self) -> Array2<f64> {
        self.inner.borrow().value.clone()
    }

    /// First component of the current values
    pub fn values(&self) -> Array1<f64> {
        self.inner.borrow().value.column(0).to_owned()
    }

    /// Copy of the old snapshot, if the variable keeps history
    pub fn old_array(&self) -> Option<Array2<f64>> {
        self.inner.borrow().old.clone()
    }

    /// First component of the old snapshot
    pub fn old_values(&self) -> Option<Array1<f64>> {
        self.inner
            .borrow()
            .old
            .as_ref()
            .map(|old| old.column(0).to_owned())
    }

    /// Copy current into old
    ///
    /// A variable without history has nothing to update; the call is a no-op.
    pub fn update_old(&self) {
        let mut data = self.inner.borrow_mut();
        let data = &mut *data;
        match data.old.as_mut() {
            Some(old) => old.assign(&data.value),
            None => log::debug!("update_old on '{}' without history ignored", data.name),
        }
    }

    /// Set every component of every element
    pub fn set_value(&self, value: f64) {
        self.inner.borrow_mut().value.fill(value);
    }

    /// Set every component of the elements where `mask` is non-zero
    pub fn set_value_where(&self, value: f64, mask: &Expr) -> Result<()> {
        let mask = mask.evaluate()?;
        let (mesh, location) = (self.mesh(), self.location());
        let mask = mask.expand_scalar(&mesh, location)?;
        let mut data = self.inner.borrow_mut();
        for (mut row, &m) in data.value.rows_mut().into_iter().zip(mask.iter()) {
            if m != 0.0 {
                row.fill(value);
            }
        }
        Ok(())
    }

    /// Replace the values of a single-component variable
    pub fn set_values(&self, values: &Array1<f64>) -> Result<()> {
        let mut data = self.inner.borrow_mut();
        if data.value.ncols() != 1 {
            return Err(FvmError::RankMismatch {
                expected: data.value.ncols(),
                found: 1,
            });
        }
        if values.len() != data.value.nrows() {
            return Err(FvmError::ShapeMismatch {
                expected: data.value.nrows(),
                actual: values.len(),
            });
        }
        data.value.column_mut(0).assign(values);
        Ok(())
    }

    /// Replace all values, `(len, components)`
    pub fn set_array(&self, values: &Array2<f64>) -> Result<()> {
        let mut data = self.inner.borrow_mut();
        if values.dim() != data.value.dim() {
            return Err(FvmError::ShapeMismatch {
                expected: data.value.len(),
                actual: values.len(),
            });
        }
        data.value.assign(values);
        Ok(())
    }

    /// Evaluate an expression into the variable
    ///
    /// The expression may read this variable; it is evaluated before any
    /// value is written.
    pub fn set_from(&self, expr: &Expr) -> Result<()> {
        let value = expr.evaluate()?;
        let (mesh, location, comps) = (self.mesh(), self.location(), self.components());
        let expanded = value.expand(&mesh, location, comps)?;
        self.inner.borrow_mut().value.assign(&expanded);
        Ok(())
    }

    /// Current values as a [`FieldValue`]
    pub fn field_value(&self) -> FieldValue {
        let data = self.inner.borrow();
        FieldValue::Located(super::LocatedValue::new(
            data.mesh.clone(),
            data.location,
            data.value.clone(),
        ))
    }

    /// Old snapshot as a [`FieldValue`]
    pub fn old_field_value(&self) -> Result<FieldValue> {
        let data = self.inner.borrow();
        match &data.old {
            Some(old) => Ok(FieldValue::Located(super::LocatedValue::new(
                data.mesh.clone(),
                data.location,
                old.clone(),
            ))),
            None => Err(FvmError::MissingOldValue {
                name: data.name.clone(),
            }),
        }
    }

    /// True if the variable lives on `mesh`
    pub fn is_on(&self, mesh: &MeshRef) -> bool {
        same_mesh(&self.inner.borrow().mesh, mesh)
    }

    /// Lazy reference to the current values
    pub fn expr(&self) -> Expr {
        Expr::from(self)
    }

    /// Lazy reference to the old snapshot
    pub fn old(&self) -> Expr {
        Expr::old(self)
    }

    pub fn grad(&self) -> Expr {
        self.expr().grad()
    }

    pub fn face_grad(&self) -> Expr {
        self.expr().face_grad()
    }

    pub fn arithmetic_face_value(&self) -> Expr {
        self.expr().arithmetic_face_value()
    }

    pub fn harmonic_face_value(&self) -> Expr {
        self.expr().harmonic_face_value()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("Variable")
            .field("name", &data.name)
            .field("location", &data.location)
            .field("shape", &data.value.dim())
            .field("history", &data.old.is_some())
            .finish()
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

    #[test]
    fn test_clones_share_storage() {
        let phi = Variable::cell_scalar("phi", mesh(3), 0.0);
        let alias = phi.clone();
        alias.set_value(2.0);
        assert_eq!(phi.values(), array![2.0, 2.0, 2.0]);
        assert!(phi.ptr_eq(&alias));
    }

    #[test]
    fn test_update_old_round_trip() {
        let phi = Variable::cell_scalar("phi", mesh(4), 1.0).with_history();
        phi.set_values(&array![1.0, 2.0, 3.0, 4.0]).unwrap();
        let before = phi.array();
        phi.update_old();
        assert_eq!(phi.old_array().unwrap(), before);

        phi.set_value(0.0);
        assert_eq!(phi.old_values().unwrap(), array![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_update_old_without_history_is_noop() {
        let phi = Variable::cell_scalar("phi", mesh(2), 1.0);
        phi.update_old();
        assert!(!phi.has_history());
        assert!(matches!(
            phi.old_field_value(),
            Err(FvmError::MissingOldValue { .. })
        ));
    }

    #[test]
    fn test_set_value_where() {
        let m = mesh(4);
        let phi = Variable::cell_scalar("phi", m.clone(), 0.0);
        let x = Expr::cell_centers(&m).component(0);
        phi.set_value_where(1.0, &x.gt(2.0)).unwrap();
        assert_eq!(phi.values(), array![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_set_values_shape_check() {
        let phi = Variable::cell_scalar("phi", mesh(3), 0.0);
        assert!(matches!(
            phi.set_values(&array![1.0, 2.0]),
            Err(FvmError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_set_from_reads_itself() {
        let phi = Variable::cell_scalar("phi", mesh(2), 3.0);
        phi.set_from(&(&phi * 2.0 + 1.0)).unwrap();
        assert_eq!(phi.values(), array![7.0, 7.0]);
    }

    #[test]
    fn test_vector_variable() {
        let u = Variable::face_vector("u", mesh(2), &[1.0, -1.0]);
        assert_eq!(u.components(), 2);
        assert_eq!(u.len(), 3);
        assert_eq!(u.array().row(1).to_vec(), vec![1.0, -1.0]);
    }
}
