//! Assembly of equations into sparse linear systems
//!
//! Assembly runs in two phases:
//!
//! 1. **Prepare**: every coefficient is evaluated once, checked against the
//!    unknown's mesh, and turned into per-cell or per-face arrays. Boundary
//!    conditions are resolved into one constraint per face. All configuration
//!    errors surface here, before anything is written.
//! 2. **Stamp**: each prepared term writes its face and cell contributions as
//!    `(row, col, value)` triplets and right-hand-side updates. Explicit terms
//!    multiply by the current values instead of entering the matrix.
//!
//! Every term contributes `T(φ) = Mφ − r`; an equation with signs `s_k`
//! assembles `Σ s_k M_k φ = Σ s_k r_k`.

use crate::boundary::{BoundaryConditions, FaceConstraint, ResolvedBoundary};
use crate::equation::Equation;
use crate::error::{FvmError, Result};
use crate::field::operators::scalar_face_values;
use crate::field::{FieldValue, Interpolation, LocatedValue, Location, Variable, face_interpolate};
use crate::mesh::{MeshRef, dot, same_mesh};
use crate::term::{ConvectionScheme, Discretization, Term};
use ndarray::Array1;
use solvers::CsrMatrix;
use solvers::blas_helpers::vector_norm;

/// Sparse matrix and right-hand side of one assembly
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub matrix: CsrMatrix,
    pub rhs: Array1<f64>,
}

impl LinearSystem {
    /// Number of unknowns
    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    /// `‖M x − r‖₂`
    pub fn residual(&self, x: &Array1<f64>) -> f64 {
        vector_norm(&(&self.matrix.matvec(x) - &self.rhs))
    }
}

/// Assemble `equation` for `var`
pub fn assemble(
    equation: &Equation,
    var: &Variable,
    bcs: &BoundaryConditions,
    dt: f64,
) -> Result<LinearSystem> {
    Assembler::new(var, bcs, dt)?.assemble(equation)
}

/// Assembly context for one unknown
///
/// Holds the resolved boundary table so that several equations for the
/// same variable and conditions can be assembled without resolving again.
#[derive(Debug)]
pub struct Assembler<'a> {
    var: &'a Variable,
    mesh: MeshRef,
    boundary: ResolvedBoundary,
    dt: f64,
}

/// Contribution of one term after coefficient evaluation
#[derive(Debug)]
enum Contribution {
    /// `c_P V_P / dt` and the old values
    Transient {
        weight: Array1<f64>,
        old: Array1<f64>,
    },
    /// Face conductance `Γ_f A_f / d`
    Diffusion {
        conductance: Array1<f64>,
        mode: Discretization,
    },
    /// Face volumetric flux and companion conductance
    Convection {
        flux: Array1<f64>,
        conductance: Array1<f64>,
        scheme: ConvectionScheme,
        mode: Discretization,
    },
    /// `c_P V_P`
    Source {
        weight: Array1<f64>,
        mode: Discretization,
    },
}

#[derive(Debug)]
struct PreparedTerm {
    sign: f64,
    contribution: Contribution,
}

/// Coefficient snapshot of a whole equation
#[derive(Debug)]
struct Prepared {
    phi: Array1<f64>,
    terms: Vec<PreparedTerm>,
    /// Sign of the term owning FixedFlux conditions
    flux_sign: Option<f64>,
}

impl<'a> Assembler<'a> {
    /// Check the unknown and resolve boundary conditions
    pub fn new(var: &'a Variable, bcs: &BoundaryConditions, dt: f64) -> Result<Self> {
        if var.location() != Location::Cell {
            return Err(FvmError::LocationMismatch {
                expected: Location::Cell,
                found: var.location(),
            });
        }
        if var.components() != 1 {
            return Err(FvmError::RankMismatch {
                expected: 1,
                found: var.components(),
            });
        }
        let mesh = var.mesh();
        let boundary = bcs.resolve(&mesh)?;
        Ok(Self {
            var,
            mesh,
            boundary,
            dt,
        })
    }

    /// Resolved boundary constraints
    pub fn boundary(&self) -> &ResolvedBoundary {
        &self.boundary
    }

    /// Build the linear system of `equation`
    pub fn assemble(&self, equation: &Equation) -> Result<LinearSystem> {
        let prepared = self.prepare(equation)?;
        let system = self.stamp(&prepared);
        log::debug!(
            "Assembled '{}': {} terms, {} unknowns, {} nnz",
            self.var.name(),
            prepared.terms.len(),
            system.size(),
            system.matrix.nnz()
        );
        Ok(system)
    }

    fn prepare(&self, equation: &Equation) -> Result<Prepared> {
        if equation.is_transient() && (!self.dt.is_finite() || self.dt <= 0.0) {
            return Err(FvmError::InvalidTimeStep(self.dt));
        }

        let mut terms = Vec::with_capacity(equation.len());
        let mut diffusion_sign = None;
        let mut convection_sign = None;

        for (term, sign) in equation.terms() {
            let contribution = self.prepare_term(term)?;
            match contribution {
                Contribution::Diffusion { .. } => {
                    diffusion_sign.get_or_insert(sign);
                }
                Contribution::Convection { .. } => {
                    convection_sign.get_or_insert(sign);
                }
                _ => {}
            }
            terms.push(PreparedTerm { sign, contribution });
        }

        let flux_sign = diffusion_sign.or(convection_sign);
        let has_flux_conditions = self
            .boundary
            .iter()
            .any(|(_, c)| matches!(c, FaceConstraint::FixedFlux(_)));
        if has_flux_conditions && flux_sign.is_none() {
            log::warn!(
                "FixedFlux conditions on '{}' ignored: equation has no flux term",
                self.var.name()
            );
        }

        Ok(Prepared {
            phi: self.var.values(),
            terms,
            flux_sign,
        })
    }

    fn prepare_term(&self, term: &Term) -> Result<Contribution> {
        let mesh = &self.mesh;
        match term {
            Term::Transient { coeff } => {
                let old = self
                    .var
                    .old_values()
                    .ok_or_else(|| FvmError::MissingOldValue {
                        name: self.var.name(),
                    })?;
                let c = coeff.evaluate()?.expand_scalar(mesh, Location::Cell)?;
                let weight = Array1::from_iter(
                    c.iter()
                        .enumerate()
                        .map(|(p, c)| c * mesh.cell_volume(p) / self.dt),
                );
                Ok(Contribution::Transient { weight, old })
            }
            Term::Diffusion { coeff, mode } => Ok(Contribution::Diffusion {
                conductance: self.conductance(&coeff.evaluate()?)?,
                mode: *mode,
            }),
            Term::Convection {
                coeff,
                scheme,
                mode,
                diffusion,
            } => {
                let conductance = match diffusion.as_deref() {
                    Some(Term::Diffusion { coeff: gamma, .. }) => {
                        self.conductance(&gamma.evaluate()?)?
                    }
                    None if !scheme.needs_diffusion() => Array1::zeros(mesh.num_faces()),
                    _ => return Err(FvmError::MissingCompanionDiffusion { scheme: *scheme }),
                };
                Ok(Contribution::Convection {
                    flux: self.face_fluxes(&coeff.evaluate()?)?,
                    conductance,
                    scheme: *scheme,
                    mode: *mode,
                })
            }
            Term::Source { coeff, mode } => {
                let c = coeff.evaluate()?.expand_scalar(mesh, Location::Cell)?;
                let weight = Array1::from_iter(
                    c.iter()
                        .enumerate()
                        .map(|(p, c)| c * mesh.cell_volume(p)),
                );
                Ok(Contribution::Source {
                    weight,
                    mode: *mode,
                })
            }
        }
    }

    fn check_mesh(&self, located: &LocatedValue) -> Result<()> {
        if same_mesh(&located.mesh, &self.mesh) {
            Ok(())
        } else {
            Err(FvmError::MeshMismatch)
        }
    }

    /// Face diffusivity `Γ_f`: harmonic mean of a cell field, face values
    /// directly, or the constant
    fn face_diffusivity(&self, gamma: &FieldValue) -> Result<Array1<f64>> {
        if gamma.components() != 1 {
            return Err(FvmError::RankMismatch {
                expected: 1,
                found: gamma.components(),
            });
        }
        match gamma {
            FieldValue::Uniform(v) => Ok(Array1::from_elem(self.mesh.num_faces(), v[0])),
            FieldValue::Located(l) => {
                self.check_mesh(l)?;
                Ok(match l.location {
                    Location::Cell => scalar_face_values(
                        self.mesh.as_ref(),
                        &l.scalars(),
                        Interpolation::Harmonic,
                        None,
                    ),
                    Location::Face => l.scalars(),
                })
            }
        }
    }

    /// `Γ_f A_f / d_PN` inside, `Γ_f A_f / d_Pf` on boundary faces
    fn conductance(&self, gamma: &FieldValue) -> Result<Array1<f64>> {
        let mesh = self.mesh.as_ref();
        let gamma_f = self.face_diffusivity(gamma)?;
        Ok(Array1::from_iter((0..mesh.num_faces()).map(|f| {
            gamma_f[f] * mesh.face_area(f) / mesh.cell_distance(f)
        })))
    }

    /// Volumetric flux `F = (u_f·n_f) A_f` through every face
    fn face_fluxes(&self, velocity: &FieldValue) -> Result<Array1<f64>> {
        let mesh = self.mesh.as_ref();
        let dim = mesh.dim();
        let comps = velocity.components();

        let normal_velocity: Array1<f64> = if comps == dim {
            let faces = match velocity {
                FieldValue::Uniform(_) => velocity.clone(),
                FieldValue::Located(l) => {
                    self.check_mesh(l)?;
                    match l.location {
                        Location::Cell => face_interpolate(l, Interpolation::Arithmetic, None)?,
                        Location::Face => velocity.clone(),
                    }
                }
            };
            Array1::from_iter((0..mesh.num_faces()).map(|f| {
                let u: Vec<f64> = (0..dim).map(|c| faces.get(f, c)).collect();
                dot(dim, &mesh.face_normal(f), &u)
            }))
        } else {
            match velocity {
                FieldValue::Located(l) if comps == 1 && l.location == Location::Face => {
                    self.check_mesh(l)?;
                    l.scalars()
                }
                _ => {
                    return Err(FvmError::RankMismatch {
                        expected: dim,
                        found: comps,
                    });
                }
            }
        };

        Ok(Array1::from_iter(
            normal_velocity
                .iter()
                .enumerate()
                .map(|(f, un)| un * mesh.face_area(f)),
        ))
    }

    fn stamp(&self, prepared: &Prepared) -> LinearSystem {
        let n = self.mesh.num_cells();
        let mut stamp = Stamp::new(n, &prepared.phi);

        for term in &prepared.terms {
            stamp.sign = term.sign;
            match &term.contribution {
                Contribution::Transient { weight, old } => {
                    for p in 0..n {
                        stamp.coefficient(Discretization::Implicit, p, p, weight[p]);
                        stamp.constant(p, -weight[p] * old[p]);
                    }
                }
                Contribution::Diffusion { conductance, mode } => {
                    self.stamp_diffusion(&mut stamp, conductance, *mode);
                }
                Contribution::Convection {
                    flux,
                    conductance,
                    scheme,
                    mode,
                } => {
                    self.stamp_convection(&mut stamp, flux, conductance, *scheme, *mode);
                }
                Contribution::Source { weight, mode } => {
                    for p in 0..n {
                        match mode {
                            Discretization::Implicit => {
                                stamp.coefficient(Discretization::Implicit, p, p, weight[p])
                            }
                            Discretization::Explicit => stamp.constant(p, weight[p]),
                        }
                    }
                }
            }
        }

        if let Some(sign) = prepared.flux_sign {
            stamp.sign = sign;
            for (f, constraint) in self.boundary.iter() {
                if let FaceConstraint::FixedFlux(g) = constraint {
                    stamp.constant(self.mesh.owner(f), g * self.mesh.face_area(f));
                }
            }
        }

        stamp.finish()
    }

    fn stamp_diffusion(&self, stamp: &mut Stamp, conductance: &Array1<f64>, mode: Discretization) {
        let mesh = self.mesh.as_ref();
        for f in 0..mesh.num_faces() {
            let a = conductance[f];
            let p = mesh.owner(f);
            match mesh.neighbour(f) {
                Some(nb) => {
                    stamp.coefficient(mode, p, p, -a);
                    stamp.coefficient(mode, p, nb, a);
                    stamp.coefficient(mode, nb, nb, -a);
                    stamp.coefficient(mode, nb, p, a);
                }
                None => {
                    if let Some(phi_b) = self.boundary.fixed_value(f) {
                        stamp.coefficient(mode, p, p, -a);
                        stamp.constant(p, a * phi_b);
                    }
                }
            }
        }
    }

    fn stamp_convection(
        &self,
        stamp: &mut Stamp,
        flux: &Array1<f64>,
        conductance: &Array1<f64>,
        scheme: ConvectionScheme,
        mode: Discretization,
    ) {
        let mesh = self.mesh.as_ref();
        for f in 0..mesh.num_faces() {
            let p = mesh.owner(f);
            let (diag, off) = scheme.owner_row(flux[f], conductance[f]);
            match mesh.neighbour(f) {
                Some(nb) => {
                    stamp.coefficient(mode, p, p, diag);
                    stamp.coefficient(mode, p, nb, off);
                    let (diag, off) = scheme.owner_row(-flux[f], conductance[f]);
                    stamp.coefficient(mode, nb, nb, diag);
                    stamp.coefficient(mode, nb, p, off);
                }
                None => {
                    if let Some(phi_b) = self.boundary.fixed_value(f) {
                        stamp.coefficient(mode, p, p, diag);
                        stamp.constant(p, off * phi_b);
                    }
                }
            }
        }
    }
}

/// Triplet and right-hand-side accumulator
struct Stamp<'p> {
    triplets: Vec<(usize, usize, f64)>,
    rhs: Array1<f64>,
    phi: &'p Array1<f64>,
    /// Sign of the term being stamped
    sign: f64,
}

impl<'p> Stamp<'p> {
    fn new(n: usize, phi: &'p Array1<f64>) -> Self {
        // Structural diagonal, ILU(0) relies on it
        let triplets = (0..n).map(|p| (p, p, 0.0)).collect();
        Self {
            triplets,
            rhs: Array1::zeros(n),
            phi,
            sign: 1.0,
        }
    }

    /// `value · φ_col` in row `row`: a matrix entry, or evaluated into `r`
    fn coefficient(&mut self, mode: Discretization, row: usize, col: usize, value: f64) {
        let v = self.sign * value;
        match mode {
            Discretization::Implicit => self.triplets.push((row, col, v)),
            Discretization::Explicit => self.rhs[row] -= v * self.phi[col],
        }
    }

    /// Constant `value` in row `row`
    fn constant(&mut self, row: usize, value: f64) {
        self.rhs[row] -= self.sign * value;
    }

    fn finish(self) -> LinearSystem {
        let n = self.rhs.len();
        LinearSystem {
            matrix: CsrMatrix::from_triplets(n, n, self.triplets),
            rhs: self.rhs,
        }
    }
}
