//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed around in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use serde::{Deserialize, Serialize};

/// Default iteration cap handed to the solver.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Number of curve samples produced per fitted data point.
pub const CURVE_OVERSAMPLING: usize = 10;

/// How much the fit reports about itself through the `log` facade.
///
/// Warnings (iteration limit, non-finite objective) are emitted at every level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Warnings only.
    #[default]
    Silent,
    /// The formatted fit report at `info` level once the fit finishes.
    Summary,
    /// `Summary` plus one `debug` line per solver iteration.
    Iterations,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Summary,
            _ => Verbosity::Iterations,
        }
    }
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose { Verbosity::Summary } else { Verbosity::Silent }
    }
}

/// Open interval `(lo, hi)` used to restrict which points take part in a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataRange {
    pub lo: f64,
    pub hi: f64,
}

impl DataRange {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Strict on both ends: boundary points are excluded.
    pub fn contains(&self, x: f64) -> bool {
        self.lo < x && x < self.hi
    }
}

impl From<(f64, f64)> for DataRange {
    fn from((lo, hi): (f64, f64)) -> Self {
        Self { lo, hi }
    }
}

/// Options accepted by `fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Starting parameters. When `None` the estimator table picks them.
    pub default_pars: Option<Vec<f64>>,
    /// Only points with `lo < x < hi` are fitted.
    pub data_range: Option<DataRange>,
    /// Per-point weights on the squared residuals (one per y value).
    pub weights: Option<Vec<f64>>,
    pub verbosity: Verbosity,
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            default_pars: None,
            data_range: None,
            weights: None,
            verbosity: Verbosity::Silent,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl FitOptions {
    pub fn with_default_pars(mut self, pars: impl Into<Vec<f64>>) -> Self {
        self.default_pars = Some(pars.into());
        self
    }

    pub fn with_data_range(mut self, range: impl Into<DataRange>) -> Self {
        self.data_range = Some(range.into());
        self
    }

    pub fn with_weights(mut self, weights: impl Into<Vec<f64>>) -> Self {
        self.weights = Some(weights.into());
        self
    }

    pub fn with_verbosity(mut self, verbosity: impl Into<Verbosity>) -> Self {
        self.verbosity = verbosity.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Observations after preprocessing: equal-length x, y and optional weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Samples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

impl Samples {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A densely sampled fitted curve, ready to plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl FitCurve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Why the solver stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Relative reduction in the sum of squares fell below tolerance.
    SumOfSquaresConvergence,
    /// Relative parameter step fell below tolerance.
    ParameterConvergence,
    /// The residuals vanished (noise-free data).
    ExactFit,
    /// The damping parameter blew up without finding a better point.
    Stalled,
    /// The iteration cap was reached; the result is not reliable.
    IterationLimit,
    /// The objective was not finite at the starting point.
    NonFinite,
}

impl StopReason {
    pub fn description(self) -> &'static str {
        match self {
            StopReason::SumOfSquaresConvergence => "Sum of squares convergence",
            StopReason::ParameterConvergence => "Parameter convergence",
            StopReason::ExactFit => "Residuals vanished",
            StopReason::Stalled => "No further improvement possible",
            StopReason::IterationLimit => "Iteration limit reached",
            StopReason::NonFinite => "Non-finite objective at starting point",
        }
    }

    pub fn is_converged(self) -> bool {
        matches!(
            self,
            StopReason::SumOfSquaresConvergence | StopReason::ParameterConvergence | StopReason::ExactFit
        )
    }
}

/// Everything a single `fit` call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Name of the fitted model (e.g. `gaus`, `pol3`).
    pub model: String,
    /// Fitted model over `linspace(min(x), max(x), 10 * n)`.
    pub curve: FitCurve,
    pub coefficients: Vec<f64>,
    /// One-sigma standard errors, same order as `coefficients`.
    pub errors: Vec<f64>,
    /// Weighted sum of squared residuals at the solution.
    pub chi_square: f64,
    /// `chi_square / (n - p)` (or `chi_square` when `n == p`).
    pub residual_variance: f64,
    /// Unscaled parameter covariance `(JᵀWJ)⁻¹`, row-major.
    pub covariance: Vec<Vec<f64>>,
    pub stop_reason: StopReason,
    pub iterations: usize,
    /// Number of points that took part in the fit (after range restriction).
    pub n_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_level() {
        assert_eq!(Verbosity::from(0u8), Verbosity::Silent);
        assert_eq!(Verbosity::from(1u8), Verbosity::Summary);
        assert_eq!(Verbosity::from(2u8), Verbosity::Iterations);
        assert_eq!(Verbosity::from(true), Verbosity::Summary);
        assert!(Verbosity::Iterations > Verbosity::Summary);
    }

    #[test]
    fn data_range_excludes_bounds() {
        let r = DataRange::new(1.0, 3.0);
        assert!(!r.contains(1.0));
        assert!(r.contains(2.0));
        assert!(!r.contains(3.0));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: FitOptions = serde_json::from_str(r#"{"data_range": {"lo": 0.0, "hi": 5.0}}"#).unwrap();
        assert_eq!(opts.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(opts.verbosity, Verbosity::Silent);
        assert_eq!(opts.data_range, Some(DataRange::new(0.0, 5.0)));
        assert!(opts.default_pars.is_none());
    }
}
