//! Default-parameter estimation.
//!
//! Starting points are looked up by model name in an [`Estimators`] table.
//! The built-in table knows the peaked and exponential shapes of the library;
//! anything else falls back to [`generic_defaults`], which probes how many
//! parameters the model takes and fills them with the (upper) median x value.
//!
//! Callers can register their own estimator for any model name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FitError, Result};
use crate::math::stats::{argmax, diff, mean, median, min_max, std_dev};
use crate::models::{Model, ModelKind};

/// Longest parameter vector the generic fallback will try.
pub const MAX_PROBE_PARAMS: usize = 20;

/// Multiple of mean(y) a point must exceed to count towards the Crystal Ball width.
const CB_PEAK_FACTOR: f64 = 1.8;
const CB_ALPHA: f64 = 0.5;
const CB_N: f64 = 2.0;

const POW_LAW_BASE: f64 = 2.6;
const POW_LAW_EXPONENT: f64 = -0.15;

/// Something that can produce starting parameters from data.
pub trait Estimate: Send + Sync {
    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>>;
}

impl<F> Estimate for F
where
    F: Fn(&[f64], &[f64]) -> Result<Vec<f64>> + Send + Sync,
{
    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        self(x, y)
    }
}

/// Closed-form heuristics for the built-in shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// `[max(y), x at peak, std(x)]`.
    Gaussian,
    /// `[mean(x), mean(diff(y) / x[1..])]`.
    Exponential,
    /// `[max(y), 0.5, 2, x at peak, width]`.
    CrystalBall,
    /// `[0.5, 2, x at peak, width]`.
    CrystalBallNorm,
    /// Fixed `[2.6, -0.15]`.
    PowerLaw,
}

impl Heuristic {
    fn model_name(self) -> &'static str {
        match self {
            Heuristic::Gaussian => ModelKind::Gaus.name(),
            Heuristic::Exponential => ModelKind::Expo.name(),
            Heuristic::CrystalBall => ModelKind::CrystalBall.name(),
            Heuristic::CrystalBallNorm => ModelKind::CrystalBallNorm.name(),
            Heuristic::PowerLaw => ModelKind::PowLaw.name(),
        }
    }

    fn fail(self, reason: &str) -> FitError {
        FitError::Estimate {
            model: self.model_name().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Peak height and the x where it occurs.
    fn peak(self, x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
        let i = argmax(y).ok_or_else(|| self.fail("no finite y values"))?;
        Ok((y[i], x[i]))
    }

    /// Fraction of points above `1.8 · mean(y)`, scaled by the x span.
    fn peak_width(self, x: &[f64], y: &[f64]) -> Result<f64> {
        let y_mean = mean(y).ok_or_else(|| self.fail("no data"))?;
        let (x_min, x_max) = min_max(x).ok_or_else(|| self.fail("no data"))?;
        let above = y.iter().filter(|&&v| v > CB_PEAK_FACTOR * y_mean).count();
        Ok(above as f64 / y.len() as f64 * (x_max - x_min))
    }
}

impl Estimate for Heuristic {
    fn estimate(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        let h = *self;
        match h {
            Heuristic::Gaussian => {
                let (amplitude, center) = h.peak(x, y)?;
                let width = std_dev(x).ok_or_else(|| h.fail("no data"))?;
                Ok(vec![amplitude, center, width])
            }
            Heuristic::Exponential => {
                let constant = mean(x).ok_or_else(|| h.fail("no data"))?;
                let ratios: Vec<f64> = diff(y).iter().zip(&x[1..]).map(|(dy, xi)| dy / xi).collect();
                let slope = mean(&ratios).ok_or_else(|| h.fail("needs at least two points"))?;
                Ok(vec![constant, slope])
            }
            Heuristic::CrystalBall => {
                let (amplitude, center) = h.peak(x, y)?;
                let width = h.peak_width(x, y)?;
                Ok(vec![amplitude, CB_ALPHA, CB_N, center, width])
            }
            Heuristic::CrystalBallNorm => {
                let (_, center) = h.peak(x, y)?;
                let width = h.peak_width(x, y)?;
                Ok(vec![CB_ALPHA, CB_N, center, width])
            }
            Heuristic::PowerLaw => Ok(vec![POW_LAW_BASE, POW_LAW_EXPONENT]),
        }
    }
}

/// Model name → estimator.
#[derive(Clone)]
pub struct Estimators {
    table: HashMap<String, Arc<dyn Estimate>>,
}

impl Estimators {
    /// A table with no entries: every model uses the generic fallback.
    pub fn empty() -> Self {
        Self { table: HashMap::new() }
    }

    /// Heuristics for `gaus`, `expo`, `crystal_ball`, `crystal_ball_norm`, `pow_law`.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for h in [
            Heuristic::Gaussian,
            Heuristic::Exponential,
            Heuristic::CrystalBall,
            Heuristic::CrystalBallNorm,
            Heuristic::PowerLaw,
        ] {
            table.register(h.model_name(), h);
        }
        table
    }

    /// Add or replace the estimator for `model`.
    pub fn register(&mut self, model: impl Into<String>, estimator: impl Estimate + 'static) -> &mut Self {
        self.table.insert(model.into(), Arc::new(estimator));
        self
    }

    pub fn with(mut self, model: impl Into<String>, estimator: impl Estimate + 'static) -> Self {
        self.register(model, estimator);
        self
    }

    pub fn remove(&mut self, model: &str) -> bool {
        self.table.remove(model).is_some()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.table.contains_key(model)
    }

    /// Starting parameters for `model` on the given data.
    pub fn estimate(&self, x: &[f64], y: &[f64], model: &dyn Model) -> Result<Vec<f64>> {
        if x.len() != y.len() {
            return Err(FitError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        match self.table.get(model.name()) {
            Some(estimator) => estimator.estimate(x, y),
            None => generic_defaults(x, model),
        }
    }
}

impl Default for Estimators {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Estimators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Estimators").field("models", &names).finish()
    }
}

/// Starting parameters from the built-in table.
pub fn estimate(x: &[f64], y: &[f64], model: &dyn Model) -> Result<Vec<f64>> {
    Estimators::builtin().estimate(x, y, model)
}

/// `n` copies of median(x), where `n` is found by [`probe_arity`].
pub fn generic_defaults(x: &[f64], model: &dyn Model) -> Result<Vec<f64>> {
    let n = probe_arity(model)?;
    let fill = median(x).ok_or(FitError::NoData)?;
    Ok(vec![fill; n])
}

/// Smallest parameter count `model` accepts.
///
/// Lengths `0..=MAX_PROBE_PARAMS` are tried with the trial vector
/// `[0, 1, …, len-1]` at `x = 0`; the first call that does not error wins.
/// Every probe failing yields `ArityProbeExhausted` with the last error.
pub fn probe_arity(model: &dyn Model) -> Result<usize> {
    let mut last = None;
    for len in 0..=MAX_PROBE_PARAMS {
        let trial: Vec<f64> = (0..len).map(|i| i as f64).collect();
        match model.eval(&trial, 0.0) {
            Ok(_) => return Ok(len),
            Err(e) => last = Some(Box::new(e)),
        }
    }
    Err(FitError::ArityProbeExhausted {
        model: model.name().to_string(),
        limit: MAX_PROBE_PARAMS,
        last,
    })
}
