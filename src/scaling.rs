//! # Scaling factors
//!
//! Every term of a quantity, and the quantity as a whole, is
//! multiplied by a scaling factor. A factor is given either as
//! a float literal or as the (case insensitive) name of a
//! constant derived from the parameters of the case:
//!
//! | token | value |
//! |-------|-------|
//! | `pr` | Pr |
//! | `ra` | Ra |
//! | `rapr`, `prra` | Ra Pr |
//! | `dt` | dt |
//! | `sqrtra` | √Ra |
//! | `re` | √Ra / Pr |
//! | `invdt`, `-invdt` | ±1 / dt |
//! | `invdt2`, `-invdt2` | ±1 / dt² |
//! | `invre`, `-invre` | ±Pr / √Ra |
//! | `invsqrtra`, `-invsqrtra` | ±1 / √Ra |
use crate::case::GridCase;
use crate::errors::{Location, PostError, Result};
use std::fmt;
use std::str::FromStr;

/// Named constant derived from the case parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedScaling {
    /// Prandtl number
    Pr,
    /// Rayleigh number
    Ra,
    /// Ra * Pr
    RaPr,
    /// Time step
    Dt,
    /// sqrt(Ra)
    SqrtRa,
    /// Reynolds number sqrt(Ra) / Pr
    Re,
    /// 1 / dt
    InvDt,
    /// -1 / dt
    MinusInvDt,
    /// 1 / dt^2
    InvDt2,
    /// -1 / dt^2
    MinusInvDt2,
    /// Pr / sqrt(Ra)
    InvRe,
    /// -Pr / sqrt(Ra)
    MinusInvRe,
    /// 1 / sqrt(Ra)
    InvSqrtRa,
    /// -1 / sqrt(Ra)
    MinusInvSqrtRa,
}

impl NamedScaling {
    /// Value for the given case
    pub fn value(self, case: &GridCase) -> f64 {
        let sqrt_ra = case.ra.sqrt();
        match self {
            Self::Pr => case.pr,
            Self::Ra => case.ra,
            Self::RaPr => case.ra * case.pr,
            Self::Dt => case.dt,
            Self::SqrtRa => sqrt_ra,
            Self::Re => sqrt_ra / case.pr,
            Self::InvDt => 1. / case.dt,
            Self::MinusInvDt => -1. / case.dt,
            Self::InvDt2 => 1. / (case.dt * case.dt),
            Self::MinusInvDt2 => -1. / (case.dt * case.dt),
            Self::InvRe => case.pr / sqrt_ra,
            Self::MinusInvRe => -case.pr / sqrt_ra,
            Self::InvSqrtRa => 1. / sqrt_ra,
            Self::MinusInvSqrtRa => -1. / sqrt_ra,
        }
    }

    /// Canonical (lower case) token
    pub fn token(self) -> &'static str {
        match self {
            Self::Pr => "pr",
            Self::Ra => "ra",
            Self::RaPr => "rapr",
            Self::Dt => "dt",
            Self::SqrtRa => "sqrtra",
            Self::Re => "re",
            Self::InvDt => "invdt",
            Self::MinusInvDt => "-invdt",
            Self::InvDt2 => "invdt2",
            Self::MinusInvDt2 => "-invdt2",
            Self::InvRe => "invre",
            Self::MinusInvRe => "-invre",
            Self::InvSqrtRa => "invsqrtra",
            Self::MinusInvSqrtRa => "-invsqrtra",
        }
    }
}

impl FromStr for NamedScaling {
    type Err = PostError;

    fn from_str(token: &str) -> Result<Self> {
        let named = match token.to_lowercase().as_str() {
            "pr" => Self::Pr,
            "ra" => Self::Ra,
            "rapr" | "prra" => Self::RaPr,
            "dt" => Self::Dt,
            "sqrtra" => Self::SqrtRa,
            "re" => Self::Re,
            "invdt" => Self::InvDt,
            "-invdt" => Self::MinusInvDt,
            "invdt2" => Self::InvDt2,
            "-invdt2" => Self::MinusInvDt2,
            "invre" => Self::InvRe,
            "-invre" => Self::MinusInvRe,
            "invsqrtra" => Self::InvSqrtRa,
            "-invsqrtra" => Self::MinusInvSqrtRa,
            _ => {
                return Err(PostError::UnknownScalingToken {
                    token: token.to_string(),
                    location: Location::default(),
                })
            }
        };
        Ok(named)
    }
}

/// Scaling factor of a term or of a whole quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// Float literal
    Literal(f64),
    /// Constant derived from the case
    Named(NamedScaling),
}

impl Scaling {
    /// Numeric value for the given case
    pub fn value(&self, case: &GridCase) -> f64 {
        match self {
            Scaling::Literal(v) => *v,
            Scaling::Named(n) => n.value(case),
        }
    }
}

impl FromStr for Scaling {
    type Err = PostError;

    /// A float literal takes precedence over the named constants
    fn from_str(token: &str) -> Result<Self> {
        match token.parse::<f64>() {
            Ok(v) => Ok(Scaling::Literal(v)),
            Err(_) => Ok(Scaling::Named(token.parse()?)),
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scaling::Literal(v) => write!(f, "{}", v),
            Scaling::Named(n) => write!(f, "{}", n.token()),
        }
    }
}

/// Resolve scaling token to its value for the given case
///
/// # Errors
/// `UnknownScalingToken` when the token is neither a float
/// nor a known constant.
///
/// # Example
/// ```
/// use ndarray::array;
/// use rustpost::{resolve, GridCase};
/// let case = GridCase::new(2, 2, 0.5, 1e4, 2.0, "data", array![0., 1.]).unwrap();
/// assert_eq!(resolve(&case, "invdt2").unwrap(), 4.0);
/// assert_eq!(resolve(&case, "-invre").unwrap(), -0.02);
/// assert_eq!(resolve(&case, "1.5").unwrap(), 1.5);
/// assert!(resolve(&case, "bogus").is_err());
/// ```
pub fn resolve(case: &GridCase, token: &str) -> Result<f64> {
    Ok(token.parse::<Scaling>()?.value(case))
}
