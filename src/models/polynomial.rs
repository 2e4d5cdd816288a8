//! Polynomials of degree 0 through 20.
//!
//! One constructor covers the whole family; `pol{N}` names index a static
//! table so every polynomial can hand out a `&'static str` name.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::models::model::{Model, check_arity};

/// Highest polynomial degree provided by the library.
pub const MAX_POLY_DEGREE: usize = 20;

const POLY_NAMES: [&str; MAX_POLY_DEGREE + 1] = [
    "pol0", "pol1", "pol2", "pol3", "pol4", "pol5", "pol6", "pol7", "pol8", "pol9", "pol10", "pol11",
    "pol12", "pol13", "pol14", "pol15", "pol16", "pol17", "pol18", "pol19", "pol20",
];

/// `y = Σ params[i] · xⁱ` for `i` in `0..=degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Polynomial {
    degree: usize,
}

/// Build the polynomial model of the given degree.
pub fn make_polynomial(degree: usize) -> Result<Polynomial> {
    if degree > MAX_POLY_DEGREE {
        return Err(FitError::UnsupportedDegree {
            degree,
            max: MAX_POLY_DEGREE,
        });
    }
    Ok(Polynomial { degree })
}

impl Polynomial {
    pub fn degree(self) -> usize {
        self.degree
    }

    pub fn param_count(self) -> usize {
        self.degree + 1
    }

    pub fn name(self) -> &'static str {
        POLY_NAMES[self.degree]
    }

    /// Look up `pol{N}` by its exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        POLY_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|degree| Polynomial { degree })
    }

    /// Every supported degree, lowest first.
    pub fn all() -> impl Iterator<Item = Polynomial> {
        (0..=MAX_POLY_DEGREE).map(|degree| Polynomial { degree })
    }

    pub(crate) fn evaluate(self, params: &[f64], x: f64) -> Result<f64> {
        check_arity(self.name(), params, self.param_count())?;
        // Horner, highest coefficient first.
        Ok(params.iter().rev().fold(0.0, |acc, &c| acc * x + c))
    }
}

impl TryFrom<usize> for Polynomial {
    type Error = FitError;

    fn try_from(degree: usize) -> Result<Self> {
        make_polynomial(degree)
    }
}

impl From<Polynomial> for usize {
    fn from(p: Polynomial) -> usize {
        p.degree
    }
}

impl Model for Polynomial {
    fn name(&self) -> &str {
        Polynomial::name(*self)
    }

    fn eval(&self, params: &[f64], x: f64) -> Result<f64> {
        self.evaluate(params, x)
    }
}
