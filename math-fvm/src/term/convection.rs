//! Convection weighting schemes
//!
//! A face with volumetric flux `F` and diffusive conductance `D` has Péclet
//! number `Pe = F/D`. Each scheme is a weighting function `A(|Pe|)` that
//! blends central and upwind differencing.

use serde::{Deserialize, Serialize};

/// Below this |Pe| the exponential weighting uses its series expansion
const EXPONENTIAL_SERIES_LIMIT: f64 = 1e-8;

/// Convection-diffusion face weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvectionScheme {
    /// `max(0, (1 − 0.1|Pe|)^5)`: bounded and positive for every Pe
    #[default]
    PowerLaw,
    /// `|Pe| / (e^|Pe| − 1)`: exact for steady 1-D advection-diffusion
    Exponential,
    /// `max(0, 1 − |Pe|/2)`
    Hybrid,
    /// `1 − |Pe|/2`: unbounded for |Pe| > 2
    Central,
    /// `1`: first-order upwind, diffusion handled by the diffusion term alone
    Upwind,
}

/// Combined convection-diffusion coefficients of one face
///
/// `neighbour` is the weight of the neighbour value in the owner's balance,
/// `owner` the weight of the owner value in the neighbour's balance:
///
/// - `owner = D·A(Pe) + max(F, 0)`
/// - `neighbour = D·A(Pe) + max(−F, 0)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCoefficients {
    pub owner: f64,
    pub neighbour: f64,
}

impl ConvectionScheme {
    /// Weighting function `A(|Pe|)`
    pub fn weight(self, peclet: f64) -> f64 {
        let pe = peclet.abs();
        match self {
            ConvectionScheme::PowerLaw => (1.0 - 0.1 * pe).max(0.0).powi(5),
            ConvectionScheme::Exponential => {
                if pe < EXPONENTIAL_SERIES_LIMIT {
                    1.0 - 0.5 * pe
                } else {
                    pe / pe.exp_m1()
                }
            }
            ConvectionScheme::Hybrid => (1.0 - 0.5 * pe).max(0.0),
            ConvectionScheme::Central => 1.0 - 0.5 * pe,
            ConvectionScheme::Upwind => 1.0,
        }
    }

    /// True if the scheme reads a companion diffusion conductance
    pub fn needs_diffusion(self) -> bool {
        matches!(
            self,
            ConvectionScheme::PowerLaw | ConvectionScheme::Exponential | ConvectionScheme::Hybrid
        )
    }

    /// `D·A(F/D)`, zero when there is no diffusive conductance
    ///
    /// Central weighting is linear in `|Pe|`, so `D·A = D − |F|/2` holds for
    /// every `D`, including zero.
    fn weighted_conductance(self, flux: f64, conductance: f64) -> f64 {
        match self {
            ConvectionScheme::Central => conductance - 0.5 * flux.abs(),
            _ if conductance == 0.0 => 0.0,
            _ => conductance * self.weight(flux / conductance),
        }
    }

    /// Patankar coefficients for flux `F` and conductance `D`
    pub fn face_coefficients(self, flux: f64, conductance: f64) -> FaceCoefficients {
        let da = self.weighted_conductance(flux, conductance);
        FaceCoefficients {
            owner: da + flux.max(0.0),
            neighbour: da + (-flux).max(0.0),
        }
    }

    /// Convection-only matrix entries of the owner row: `(diagonal, off-diagonal)`
    ///
    /// These are the Patankar coefficients with the companion diffusion
    /// `D(φP − φN)` removed, since the diffusion term contributes it itself.
    /// The neighbour row uses the same formula with `-flux`.
    pub(crate) fn owner_row(self, flux: f64, conductance: f64) -> (f64, f64) {
        if self == ConvectionScheme::Central {
            return (0.5 * flux, 0.5 * flux);
        }
        let da = self.weighted_conductance(flux, conductance);
        let diag = da - conductance + flux.max(0.0);
        let off = conductance - da - (-flux).max(0.0);
        (diag, off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCHEMES: [ConvectionScheme; 5] = [
        ConvectionScheme::PowerLaw,
        ConvectionScheme::Exponential,
        ConvectionScheme::Hybrid,
        ConvectionScheme::Central,
        ConvectionScheme::Upwind,
    ];

    #[test]
    fn test_weight_is_one_at_zero_peclet() {
        for scheme in SCHEMES {
            assert_relative_eq!(scheme.weight(0.0), 1.0);
        }
    }

    #[test]
    fn test_weight_vanishes_for_large_peclet() {
        for scheme in [
            ConvectionScheme::PowerLaw,
            ConvectionScheme::Exponential,
            ConvectionScheme::Hybrid,
        ] {
            assert!(scheme.weight(1e3) < 1e-12, "{scheme:?}");
            assert!(scheme.weight(-1e3) < 1e-12, "{scheme:?}");
        }
        assert_eq!(ConvectionScheme::PowerLaw.weight(10.0), 0.0);
    }

    #[test]
    fn test_power_law_values() {
        let s = ConvectionScheme::PowerLaw;
        assert_relative_eq!(s.weight(1.0), 0.9_f64.powi(5));
        assert_relative_eq!(s.weight(-5.0), 0.5_f64.powi(5));
    }

    #[test]
    fn test_exponential_matches_series_near_zero() {
        let s = ConvectionScheme::Exponential;
        assert_relative_eq!(s.weight(1e-9), 1.0, epsilon = 1e-8);
        assert_relative_eq!(s.weight(1e-6), 1.0 - 0.5e-6, epsilon = 1e-12);
        assert_relative_eq!(s.weight(2.0), 2.0 / (2.0_f64.exp() - 1.0));
    }

    #[test]
    fn test_patankar_coefficients_are_non_negative() {
        let d = 1.0;
        for scheme in [
            ConvectionScheme::PowerLaw,
            ConvectionScheme::Exponential,
            ConvectionScheme::Hybrid,
            ConvectionScheme::Upwind,
        ] {
            for pe in [0.0, 1.0, 10.0, 100.0, -100.0] {
                let c = scheme.face_coefficients(pe * d, d);
                assert!(c.owner >= 0.0, "{scheme:?} Pe = {pe}");
                assert!(c.neighbour >= 0.0, "{scheme:?} Pe = {pe}");
            }
        }
    }

    #[test]
    fn test_zero_conductance_is_pure_upwind() {
        for scheme in SCHEMES.into_iter().filter(|s| *s != ConvectionScheme::Central) {
            let (diag, off) = scheme.owner_row(2.0, 0.0);
            assert_eq!((diag, off), (2.0, 0.0));
            let (diag, off) = scheme.owner_row(-2.0, 0.0);
            assert_eq!((diag, off), (0.0, -2.0));
        }
    }

    #[test]
    fn test_central_owner_row_is_average() {
        // A = 1 − |Pe|/2 turns D(A−1) + max(F,0) into F/2 for either sign of F
        let (diag, off) = ConvectionScheme::Central.owner_row(0.4, 1.0);
        assert_relative_eq!(diag, 0.2, epsilon = 1e-15);
        assert_relative_eq!(off, 0.2, epsilon = 1e-15);
        let (diag, off) = ConvectionScheme::Central.owner_row(-0.4, 1.0);
        assert_relative_eq!(diag, -0.2, epsilon = 1e-15);
        assert_relative_eq!(off, -0.2, epsilon = 1e-15);
    }

    #[test]
    fn test_central_without_conductance_stays_central() {
        assert_eq!(ConvectionScheme::Central.owner_row(2.0, 0.0), (1.0, 1.0));
        assert_eq!(ConvectionScheme::Central.owner_row(-2.0, 0.0), (-1.0, -1.0));

        let c = ConvectionScheme::Central.face_coefficients(2.0, 0.0);
        assert_relative_eq!(c.owner, 1.0);
        assert_relative_eq!(c.neighbour, -1.0);
    }
}
