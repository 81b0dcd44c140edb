//! Terms of the operator algebra
//!
//! Each term is one physical effect with a coefficient expression:
//!
//! - **Transient**: `c ∂φ/∂t`
//! - **Diffusion**: `∇·(Γ∇φ)`
//! - **Convection**: `∇·(uφ)`, weighted by a [`ConvectionScheme`]
//! - **Source**: `c φ` (implicit) or `c` (explicit)
//!
//! Terms are immutable values. Adding, subtracting or equating them builds an
//! [`Equation`](crate::equation::Equation).
//!
//! Implicit source coefficients on the transient side must be non-negative to
//! keep the matrix diagonally dominant. The engine does not clamp or check
//! this; mask the coefficient (`&s * s.expr().lt(0.0)`) where it matters.

mod convection;

pub use convection::{ConvectionScheme, FaceCoefficients};

use crate::field::{Expr, Variable};
use serde::{Deserialize, Serialize};

/// Whether a term's contribution is written into the matrix or evaluated
/// from current values into the right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discretization {
    #[default]
    Implicit,
    Explicit,
}

/// One discretized physical effect
#[derive(Debug, Clone)]
pub enum Term {
    Transient {
        coeff: Expr,
    },
    Diffusion {
        coeff: Expr,
        mode: Discretization,
    },
    Convection {
        coeff: Expr,
        scheme: ConvectionScheme,
        mode: Discretization,
        diffusion: Option<Box<Term>>,
    },
    Source {
        coeff: Expr,
        mode: Discretization,
    },
}

impl Term {
    /// `c ∂φ/∂t`, always implicit in φ_new
    pub fn transient(coeff: impl Into<Expr>) -> Self {
        Term::Transient {
            coeff: coeff.into(),
        }
    }

    /// Implicit `∇·(Γ∇φ)`
    pub fn diffusion(coeff: impl Into<Expr>) -> Self {
        Term::Diffusion {
            coeff: coeff.into(),
            mode: Discretization::Implicit,
        }
    }

    /// Explicit `∇·(Γ∇φ)`, evaluated from current values
    pub fn explicit_diffusion(coeff: impl Into<Expr>) -> Self {
        Term::Diffusion {
            coeff: coeff.into(),
            mode: Discretization::Explicit,
        }
    }

    /// Implicit `∇·(uφ)` without companion diffusion
    ///
    /// Only [`ConvectionScheme::Upwind`] and [`ConvectionScheme::Central`]
    /// assemble without a companion; attach one with
    /// [`with_diffusion`](Self::with_diffusion) for the other schemes.
    pub fn convection(velocity: impl Into<Expr>, scheme: ConvectionScheme) -> Self {
        Term::Convection {
            coeff: velocity.into(),
            scheme,
            mode: Discretization::Implicit,
            diffusion: None,
        }
    }

    /// Power-law convection using the conductance of `diffusion`
    pub fn power_law_convection(velocity: impl Into<Expr>, diffusion: &Term) -> Self {
        Self::convection(velocity, ConvectionScheme::PowerLaw).with_diffusion(diffusion)
    }

    /// Exponential convection using the conductance of `diffusion`
    pub fn exponential_convection(velocity: impl Into<Expr>, diffusion: &Term) -> Self {
        Self::convection(velocity, ConvectionScheme::Exponential).with_diffusion(diffusion)
    }

    /// Implicit source `c φ`
    pub fn implicit_source(coeff: impl Into<Expr>) -> Self {
        Term::Source {
            coeff: coeff.into(),
            mode: Discretization::Implicit,
        }
    }

    /// Explicit source `c`
    pub fn source(coeff: impl Into<Expr>) -> Self {
        Term::Source {
            coeff: coeff.into(),
            mode: Discretization::Explicit,
        }
    }

    /// Attach a companion term to a convection term
    ///
    /// Other terms are returned unchanged.
    pub fn with_diffusion(self, companion: &Term) -> Self {
        match self {
            Term::Convection {
                coeff,
                scheme,
                mode,
                ..
            } => Term::Convection {
                coeff,
                scheme,
                mode,
                diffusion: Some(Box::new(companion.clone())),
            },
            other => other,
        }
    }

    /// Switch to explicit discretization (transient terms stay implicit)
    pub fn explicit(self) -> Self {
        self.with_mode(Discretization::Explicit)
    }

    fn with_mode(self, new_mode: Discretization) -> Self {
        match self {
            Term::Diffusion { coeff, .. } => Term::Diffusion {
                coeff,
                mode: new_mode,
            },
            Term::Convection {
                coeff,
                scheme,
                diffusion,
                ..
            } => Term::Convection {
                coeff,
                scheme,
                mode: new_mode,
                diffusion,
            },
            Term::Source { coeff, .. } => Term::Source {
                coeff,
                mode: new_mode,
            },
            transient @ Term::Transient { .. } => transient,
        }
    }

    pub fn coefficient(&self) -> &Expr {
        match self {
            Term::Transient { coeff }
            | Term::Diffusion { coeff, .. }
            | Term::Convection { coeff, .. }
            | Term::Source { coeff, .. } => coeff,
        }
    }

    pub fn mode(&self) -> Discretization {
        match self {
            Term::Transient { .. } => Discretization::Implicit,
            Term::Diffusion { mode, .. }
            | Term::Convection { mode, .. }
            | Term::Source { mode, .. } => *mode,
        }
    }

    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Term::Transient { .. } => "transient",
            Term::Diffusion { .. } => "diffusion",
            Term::Convection { .. } => "convection",
            Term::Source { .. } => "source",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Term::Transient { .. })
    }
}

impl From<Expr> for Term {
    fn from(coeff: Expr) -> Self {
        Term::source(coeff)
    }
}

impl From<f64> for Term {
    fn from(coeff: f64) -> Self {
        Term::source(coeff)
    }
}

impl From<&Variable> for Term {
    fn from(var: &Variable) -> Self {
        Term::source(var)
    }
}
