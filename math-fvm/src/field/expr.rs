//! Lazily evaluated field expressions
//!
//! An [`Expr`] records how to compute a field, not its values. Evaluating it
//! reads the current state of every variable it references, so a coefficient
//! such as `1.0 + &phi * &phi` follows `phi` from sweep to sweep.
//!
//! Comparisons return 0/1 masks, which is how piecewise coefficients are
//! built without branching: `&s * s.expr().lt(0.0)` keeps only the
//! negative part of `s`.

use super::operators::{divergence, face_gradient, face_interpolate, gradient};
use super::{FieldValue, LocatedValue, Location, Variable};
use crate::boundary::BoundaryConditions;
use crate::error::{FvmError, Result};
use crate::mesh::MeshRef;
use ndarray::Array2;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

/// Elementwise single-operand functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Exp,
    Ln,
    Sin,
    Cos,
    Tanh,
}

impl UnaryOp {
    fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Abs => x.abs(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Ln => x.ln(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tanh => x.tanh(),
        }
    }
}

/// Elementwise two-operand functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Max,
    Min,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
            BinaryOp::Max => a.max(b),
            BinaryOp::Min => a.min(b),
        }
    }
}

/// Comparisons producing 0/1 masks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, a: f64, b: f64) -> bool {
        match self {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }
}

/// Cell-to-face interpolation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Distance-weighted arithmetic mean
    Arithmetic,
    /// Distance-weighted harmonic mean, for diffusivities that jump across faces
    Harmonic,
}

#[derive(Debug)]
enum Node {
    Constant(f64),
    Vector(Vec<f64>),
    Variable(Variable),
    Old(Variable),
    CellCenters(MeshRef),
    FaceCenters(MeshRef),
    CellVolumes(MeshRef),
    FaceAreas(MeshRef),
    FaceNormals(MeshRef),
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Dot(Expr, Expr),
    Component(Expr, usize),
    Compare(CompareOp, Expr, Expr),
    FaceValue(Interpolation, Expr, Option<BoundaryConditions>),
    Grad(Expr, Option<BoundaryConditions>),
    FaceGrad(Expr, Option<BoundaryConditions>),
    Divergence(Expr),
}

/// Lazy field expression
///
/// Cloning is cheap: sub-trees are shared.
#[derive(Debug, Clone)]
pub struct Expr(Rc<Node>);

impl Expr {
    fn node(node: Node) -> Self {
        Expr(Rc::new(node))
    }

    /// Uniform scalar
    pub fn constant(value: f64) -> Self {
        Self::node(Node::Constant(value))
    }

    /// Uniform vector
    pub fn vector(components: &[f64]) -> Self {
        Self::node(Node::Vector(components.to_vec()))
    }

    /// Old snapshot of a variable
    pub fn old(var: &Variable) -> Self {
        Self::node(Node::Old(var.clone()))
    }

    /// Cell centroids, `dim` components
    pub fn cell_centers(mesh: &MeshRef) -> Self {
        Self::node(Node::CellCenters(mesh.clone()))
    }

    /// Face centroids, `dim` components
    pub fn face_centers(mesh: &MeshRef) -> Self {
        Self::node(Node::FaceCenters(mesh.clone()))
    }

    pub fn cell_volumes(mesh: &MeshRef) -> Self {
        Self::node(Node::CellVolumes(mesh.clone()))
    }

    pub fn face_areas(mesh: &MeshRef) -> Self {
        Self::node(Node::FaceAreas(mesh.clone()))
    }

    /// Unit face normals, `dim` components
    pub fn face_normals(mesh: &MeshRef) -> Self {
        Self::node(Node::FaceNormals(mesh.clone()))
    }

    pub fn unary(op: UnaryOp, operand: impl Into<Expr>) -> Self {
        Self::node(Node::Unary(op, operand.into()))
    }

    pub fn binary(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::node(Node::Binary(op, lhs.into(), rhs.into()))
    }

    fn compare(self, op: CompareOp, rhs: impl Into<Expr>) -> Self {
        Self::node(Node::Compare(op, self, rhs.into()))
    }

    pub fn abs(self) -> Self {
        Self::unary(UnaryOp::Abs, self)
    }

    pub fn sqrt(self) -> Self {
        Self::unary(UnaryOp::Sqrt, self)
    }

    pub fn exp(self) -> Self {
        Self::unary(UnaryOp::Exp, self)
    }

    pub fn ln(self) -> Self {
        Self::unary(UnaryOp::Ln, self)
    }

    pub fn sin(self) -> Self {
        Self::unary(UnaryOp::Sin, self)
    }

    pub fn cos(self) -> Self {
        Self::unary(UnaryOp::Cos, self)
    }

    pub fn tanh(self) -> Self {
        Self::unary(UnaryOp::Tanh, self)
    }

    pub fn powf(self, exponent: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Pow, self, exponent)
    }

    /// Elementwise maximum
    pub fn max(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Max, self, other)
    }

    /// Elementwise minimum
    pub fn min(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Min, self, other)
    }

    /// Inner product over components
    pub fn dot(self, other: impl Into<Expr>) -> Self {
        Self::node(Node::Dot(self, other.into()))
    }

    /// One component of a vector field
    pub fn component(self, index: usize) -> Self {
        Self::node(Node::Component(self, index))
    }

    /// Mask: 1 where `self < rhs`
    pub fn lt(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Lt, rhs)
    }

    /// Mask: 1 where `self <= rhs`
    pub fn le(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Le, rhs)
    }

    /// Mask: 1 where `self > rhs`
    pub fn gt(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Gt, rhs)
    }

    /// Mask: 1 where `self >= rhs`
    pub fn ge(self, rhs: impl Into<Expr>) -> Self {
        self.compare(CompareOp::Ge, rhs)
    }

    pub fn arithmetic_face_value(self) -> Self {
        Self::node(Node::FaceValue(Interpolation::Arithmetic, self, None))
    }

    pub fn harmonic_face_value(self) -> Self {
        Self::node(Node::FaceValue(Interpolation::Harmonic, self, None))
    }

    /// Face interpolation taking FixedValue conditions on boundary faces
    pub fn face_value_with(self, kind: Interpolation, bcs: &BoundaryConditions) -> Self {
        Self::node(Node::FaceValue(kind, self, Some(bcs.clone())))
    }

    /// Green–Gauss cell gradient
    pub fn grad(self) -> Self {
        Self::node(Node::Grad(self, None))
    }

    /// Green–Gauss cell gradient using FixedValue boundary values
    pub fn grad_with(self, bcs: &BoundaryConditions) -> Self {
        Self::node(Node::Grad(self, Some(bcs.clone())))
    }

    /// Two-point normal gradient on faces
    pub fn face_grad(self) -> Self {
        Self::node(Node::FaceGrad(self, None))
    }

    /// Two-point normal gradient, one-sided to FixedValue boundary values
    pub fn face_grad_with(self, bcs: &BoundaryConditions) -> Self {
        Self::node(Node::FaceGrad(self, Some(bcs.clone())))
    }

    /// Divergence of a face field
    pub fn divergence(self) -> Self {
        Self::node(Node::Divergence(self))
    }

    /// Uniform scalar value, if the expression is a plain constant
    pub fn as_constant(&self) -> Option<f64> {
        match &*self.0 {
            Node::Constant(v) => Some(*v),
            _ => None,
        }
    }

    /// Evaluate against the current state of every referenced variable
    pub fn evaluate(&self) -> Result<FieldValue> {
        match &*self.0 {
            Node::Constant(v) => Ok(FieldValue::scalar(*v)),
            Node::Vector(v) => Ok(FieldValue::Uniform(v.clone())),
            Node::Variable(var) => Ok(var.field_value()),
            Node::Old(var) => var.old_field_value(),
            Node::CellCenters(mesh) => Ok(geometry(mesh, Location::Cell, mesh.dim(), |i, c| {
                mesh.cell_center(i)[c]
            })),
            Node::FaceCenters(mesh) => Ok(geometry(mesh, Location::Face, mesh.dim(), |i, c| {
                mesh.face_center(i)[c]
            })),
            Node::CellVolumes(mesh) => Ok(geometry(mesh, Location::Cell, 1, |i, _| {
                mesh.cell_volume(i)
            })),
            Node::FaceAreas(mesh) => Ok(geometry(mesh, Location::Face, 1, |i, _| {
                mesh.face_area(i)
            })),
            Node::FaceNormals(mesh) => Ok(geometry(mesh, Location::Face, mesh.dim(), |i, c| {
                mesh.face_normal(i)[c]
            })),
            Node::Unary(op, e) => Ok(e.evaluate()?.map(|x| op.apply(x))),
            Node::Binary(op, a, b) => a.evaluate()?.zip_with(&b.evaluate()?, |x, y| op.apply(x, y)),
            Node::Dot(a, b) => a.evaluate()?.dot(&b.evaluate()?),
            Node::Component(e, index) => e.evaluate()?.component(*index),
            Node::Compare(op, a, b) => a.evaluate()?.zip_with(&b.evaluate()?, |x, y| {
                if op.holds(x, y) { 1.0 } else { 0.0 }
            }),
            Node::FaceValue(kind, e, bcs) => {
                let value = anchored(e.evaluate()?, "face value")?;
                face_interpolate(&value, *kind, bcs.as_ref())
            }
            Node::Grad(e, bcs) => gradient(&anchored(e.evaluate()?, "grad")?, bcs.as_ref()),
            Node::FaceGrad(e, bcs) => {
                face_gradient(&anchored(e.evaluate()?, "face_grad")?, bcs.as_ref())
            }
            Node::Divergence(e) => divergence(&anchored(e.evaluate()?, "divergence")?),
        }
    }
}

fn geometry(
    mesh: &MeshRef,
    location: Location,
    comps: usize,
    f: impl Fn(usize, usize) -> f64,
) -> FieldValue {
    let n = location.count(mesh.as_ref());
    let values = Array2::from_shape_fn((n, comps), |(i, c)| f(i, c));
    FieldValue::Located(LocatedValue::new(mesh.clone(), location, values))
}

fn anchored(value: FieldValue, operator: &'static str) -> Result<LocatedValue> {
    match value {
        FieldValue::Located(l) => Ok(l),
        FieldValue::Uniform(_) => Err(FvmError::UnanchoredOperand(operator)),
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<&Variable> for Expr {
    fn from(var: &Variable) -> Self {
        Expr::node(Node::Variable(var.clone()))
    }
}

impl From<Variable> for Expr {
    fn from(var: Variable) -> Self {
        Expr::node(Node::Variable(var))
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! impl_arith {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<&Variable> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Variable) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<Expr> for &Variable {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<&Variable> for &Variable {
            type Output = Expr;
            fn $method(self, rhs: &Variable) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<f64> for &Variable {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl $trait<&Variable> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Variable) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

impl_arith!(Add, add, BinaryOp::Add);
impl_arith!(Sub, sub, BinaryOp::Sub);
impl_arith!(Mul, mul, BinaryOp::Mul);
impl_arith!(Div, div, BinaryOp::Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl Neg for &Variable {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}
