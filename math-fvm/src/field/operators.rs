//! Interpolation and differential operators on located values
//!
//! Boundary faces have no neighbour, so they fall back to the owner value
//! unless a FixedValue condition is supplied.

use super::{FieldValue, Interpolation, LocatedValue, Location};
use crate::boundary::{BoundaryConditions, ResolvedBoundary};
use crate::error::{FvmError, Result};
use crate::mesh::Mesh;
use ndarray::{Array1, Array2, Axis};

fn require_location(value: &LocatedValue, expected: Location) -> Result<()> {
    if value.location != expected {
        return Err(FvmError::LocationMismatch {
            expected,
            found: value.location,
        });
    }
    Ok(())
}

fn require_scalar(value: &LocatedValue) -> Result<()> {
    if value.components() != 1 {
        return Err(FvmError::RankMismatch {
            expected: 1,
            found: value.components(),
        });
    }
    Ok(())
}

fn resolve(
    value: &LocatedValue,
    bcs: Option<&BoundaryConditions>,
) -> Result<Option<ResolvedBoundary>> {
    bcs.map(|b| b.resolve(&value.mesh)).transpose()
}

/// Distance-weighted harmonic mean, 0 where both sides vanish
pub(crate) fn harmonic_mean(owner: f64, neighbour: f64, alpha: f64) -> f64 {
    let den = (1.0 - alpha) * neighbour + alpha * owner;
    if den == 0.0 {
        0.0
    } else {
        owner * neighbour / den
    }
}

/// Interpolate one face from owner and neighbour values
pub(crate) fn interpolate(kind: Interpolation, owner: f64, neighbour: f64, alpha: f64) -> f64 {
    match kind {
        Interpolation::Arithmetic => (1.0 - alpha) * owner + alpha * neighbour,
        Interpolation::Harmonic => harmonic_mean(owner, neighbour, alpha),
    }
}

/// Scalar face values of a cell field, boundary faces from FixedValue or owner
pub(crate) fn scalar_face_values(
    mesh: &dyn Mesh,
    cells: &Array1<f64>,
    kind: Interpolation,
    boundary: Option<&ResolvedBoundary>,
) -> Array1<f64> {
    Array1::from_iter((0..mesh.num_faces()).map(|f| {
        let p = mesh.owner(f);
        match mesh.neighbour(f) {
            Some(n) => interpolate(kind, cells[p], cells[n], mesh.neighbour_weight(f)),
            None => boundary
                .and_then(|b| b.fixed_value(f))
                .unwrap_or(cells[p]),
        }
    }))
}

/// Interpolate a cell field to faces
///
/// FixedValue conditions apply to single-component fields only.
pub fn face_interpolate(
    value: &LocatedValue,
    kind: Interpolation,
    bcs: Option<&BoundaryConditions>,
) -> Result<FieldValue> {
    require_location(value, Location::Cell)?;
    let boundary = resolve(value, bcs)?;
    let mesh = value.mesh.as_ref();
    let comps = value.components();

    let values = if comps == 1 {
        scalar_face_values(mesh, &value.scalars(), kind, boundary.as_ref()).insert_axis(Axis(1))
    } else {
        Array2::from_shape_fn((mesh.num_faces(), comps), |(f, c)| {
            let p = mesh.owner(f);
            match mesh.neighbour(f) {
                Some(n) => interpolate(
                    kind,
                    value.values[[p, c]],
                    value.values[[n, c]],
                    mesh.neighbour_weight(f),
                ),
                None => value.values[[p, c]],
            }
        })
    };

    Ok(FieldValue::Located(LocatedValue::new(
        value.mesh.clone(),
        Location::Face,
        values,
    )))
}

/// Green–Gauss gradient of a scalar cell field
///
/// `grad φ_P = (1/V_P) Σ_f φ_f n_f A_f`, with face values from arithmetic
/// interpolation.
pub fn gradient(value: &LocatedValue, bcs: Option<&BoundaryConditions>) -> Result<FieldValue> {
    require_location(value, Location::Cell)?;
    require_scalar(value)?;
    let boundary = resolve(value, bcs)?;
    let mesh = value.mesh.as_ref();
    let dim = mesh.dim();

    let phi_f = scalar_face_values(
        mesh,
        &value.scalars(),
        Interpolation::Arithmetic,
        boundary.as_ref(),
    );
    let mut grad = Array2::zeros((mesh.num_cells(), dim));
    for f in 0..mesh.num_faces() {
        let n = mesh.face_normal(f);
        let scale = phi_f[f] * mesh.face_area(f);
        let p = mesh.owner(f);
        for c in 0..dim {
            grad[[p, c]] += scale * n[c];
        }
        if let Some(nb) = mesh.neighbour(f) {
            for c in 0..dim {
                grad[[nb, c]] -= scale * n[c];
            }
        }
    }
    for (cell, mut row) in grad.rows_mut().into_iter().enumerate() {
        row /= mesh.cell_volume(cell);
    }

    Ok(FieldValue::Located(LocatedValue::new(
        value.mesh.clone(),
        Location::Cell,
        grad,
    )))
}

/// Two-point normal gradient of a scalar cell field on faces
///
/// Interior faces get `(φN − φP)/d_PN · n`. Boundary faces get the one-sided
/// difference to a FixedValue condition, or zero.
pub fn face_gradient(
    value: &LocatedValue,
    bcs: Option<&BoundaryConditions>,
) -> Result<FieldValue> {
    require_location(value, Location::Cell)?;
    require_scalar(value)?;
    let boundary = resolve(value, bcs)?;
    let mesh = value.mesh.as_ref();
    let dim = mesh.dim();

    let mut out = Array2::zeros((mesh.num_faces(), dim));
    for f in 0..mesh.num_faces() {
        let p = mesh.owner(f);
        let normal_grad = match mesh.neighbour(f) {
            Some(nb) => (value.scalar(nb) - value.scalar(p)) / mesh.cell_distance(f),
            None => match boundary.as_ref().and_then(|b| b.fixed_value(f)) {
                Some(phi_b) => (phi_b - value.scalar(p)) / mesh.owner_distance(f),
                None => 0.0,
            },
        };
        let n = mesh.face_normal(f);
        for c in 0..dim {
            out[[f, c]] = normal_grad * n[c];
        }
    }

    Ok(FieldValue::Located(LocatedValue::new(
        value.mesh.clone(),
        Location::Face,
        out,
    )))
}

/// Divergence of a face field
///
/// A field with `dim` components contributes `(v·n) A`; on 1-D meshes that
/// includes single-component fields. Otherwise a scalar field is read as a
/// normal flux density and contributes `v A`. Fluxes count positive leaving
/// the owner.
pub fn divergence(value: &LocatedValue) -> Result<FieldValue> {
    require_location(value, Location::Face)?;
    let mesh = value.mesh.as_ref();
    let dim = mesh.dim();
    let comps = value.components();
    if comps != 1 && comps != dim {
        return Err(FvmError::RankMismatch {
            expected: dim,
            found: comps,
        });
    }

    let mut div = Array1::zeros(mesh.num_cells());
    for f in 0..mesh.num_faces() {
        let density = if comps == dim {
            let n = mesh.face_normal(f);
            (0..dim).map(|c| n[c] * value.values[[f, c]]).sum()
        } else {
            value.scalar(f)
        };
        let flux = density * mesh.face_area(f);
        div[mesh.owner(f)] += flux;
        if let Some(nb) = mesh.neighbour(f) {
            div[nb] -= flux;
        }
    }
    for (cell, d) in div.iter_mut().enumerate() {
        *d /= mesh.cell_volume(cell);
    }

    Ok(FieldValue::Located(LocatedValue::from_scalars(
        value.mesh.clone(),
        Location::Cell,
        div,
    )))
}
