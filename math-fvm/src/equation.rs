//! Equations as signed sums of terms
//!
//! ```
//! use fvm::{Equation, Term};
//!
//! // ∂φ/∂t = ∇·∇φ + 1
//! let eq = Term::transient(1.0).equals(Term::diffusion(1.0) + 1.0);
//! assert_eq!(eq.len(), 3);
//! ```

use crate::field::{Expr, Variable};
use crate::term::Term;
use std::ops::{Add, Neg, Sub};

/// Ordered list of `(term, sign)` pairs, implicitly equated to zero
#[derive(Debug, Clone, Default)]
pub struct Equation {
    terms: Vec<(Term, f64)>,
}

impl Equation {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Append `term` with a positive sign
    pub fn add_term(mut self, term: impl Into<Equation>) -> Self {
        self.terms.extend(term.into().terms);
        self
    }

    /// Append `term` with its sign flipped
    pub fn subtract(mut self, term: impl Into<Equation>) -> Self {
        self.terms
            .extend(term.into().terms.into_iter().map(|(t, s)| (t, -s)));
        self
    }

    /// `self == rhs`, stored as `self − rhs = 0`
    pub fn equals(self, rhs: impl Into<Equation>) -> Self {
        self.subtract(rhs)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Term, f64)> {
        self.terms.iter().map(|(t, s)| (t, *s))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True if any term is a transient term
    pub fn is_transient(&self) -> bool {
        self.terms.iter().any(|(t, _)| t.is_transient())
    }
}

impl Term {
    /// `self == rhs`
    pub fn equals(self, rhs: impl Into<Equation>) -> Equation {
        Equation::from(self).equals(rhs)
    }
}

impl From<Term> for Equation {
    fn from(term: Term) -> Self {
        Self {
            terms: vec![(term, 1.0)],
        }
    }
}

impl From<Expr> for Equation {
    fn from(coeff: Expr) -> Self {
        Term::from(coeff).into()
    }
}

impl From<f64> for Equation {
    fn from(coeff: f64) -> Self {
        Term::from(coeff).into()
    }
}

impl From<&Variable> for Equation {
    fn from(var: &Variable) -> Self {
        Term::from(var).into()
    }
}

impl<T: Into<Equation>> Add<T> for Equation {
    type Output = Equation;
    fn add(self, rhs: T) -> Equation {
        self.add_term(rhs)
    }
}

impl<T: Into<Equation>> Sub<T> for Equation {
    type Output = Equation;
    fn sub(self, rhs: T) -> Equation {
        self.subtract(rhs)
    }
}

impl<T: Into<Equation>> Add<T> for Term {
    type Output = Equation;
    fn add(self, rhs: T) -> Equation {
        Equation::from(self).add_term(rhs)
    }
}

impl<T: Into<Equation>> Sub<T> for Term {
    type Output = Equation;
    fn sub(self, rhs: T) -> Equation {
        Equation::from(self).subtract(rhs)
    }
}

impl Neg for Equation {
    type Output = Equation;
    fn neg(self) -> Equation {
        Equation::new().subtract(self)
    }
}

impl Neg for Term {
    type Output = Equation;
    fn neg(self) -> Equation {
        -Equation::from(self)
    }
}

// Sources on the left of a term: `1.0 + Term::diffusion(1.0)`
macro_rules! impl_source_lhs {
    ($lhs:ty) => {
        impl Add<Term> for $lhs {
            type Output = Equation;
            fn add(self, rhs: Term) -> Equation {
                Equation::from(self).add_term(rhs)
            }
        }

        impl Sub<Term> for $lhs {
            type Output = Equation;
            fn sub(self, rhs: Term) -> Equation {
                Equation::from(self).subtract(rhs)
            }
        }

        impl Add<Equation> for $lhs {
            type Output = Equation;
            fn add(self, rhs: Equation) -> Equation {
                Equation::from(self).add_term(rhs)
            }
        }

        impl Sub<Equation> for $lhs {
            type Output = Equation;
            fn sub(self, rhs: Equation) -> Equation {
                Equation::from(self).subtract(rhs)
            }
        }
    };
}

impl_source_lhs!(f64);
impl_source_lhs!(Expr);
impl_source_lhs!(&Variable);
