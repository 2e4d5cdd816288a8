//! The fit orchestrator.
//!
//! Given a model and raw `(x, y)` arrays we:
//! - correct histogram bin edges and apply the optional data range
//! - pick starting parameters (explicit, or from the estimator table)
//! - run the least squares solver
//! - resample the fitted model on a dense grid for plotting
//!
//! Non-convergence is not an error: it is logged and reported through
//! `FitResult::stop_reason`.

use crate::domain::{CURVE_OVERSAMPLING, FitCurve, FitOptions, FitResult, StopReason, Verbosity};
use crate::error::{FitError, Result};
use crate::fit::estimate::Estimators;
use crate::fit::prepare::prepare_samples;
use crate::math::lm::{LeastSquaresSolver, LevenbergMarquardt, Problem};
use crate::math::stats::{linspace, min_max};
use crate::models::Model;
use crate::report::format_fit_report;

/// Estimator table plus solver, reusable across fits.
#[derive(Debug, Clone, Default)]
pub struct Fitter<S = LevenbergMarquardt> {
    estimators: Estimators,
    solver: S,
}

impl Fitter {
    /// Built-in estimators with the default Levenberg–Marquardt solver.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: LeastSquaresSolver> Fitter<S> {
    pub fn with_solver<T: LeastSquaresSolver>(self, solver: T) -> Fitter<T> {
        Fitter {
            estimators: self.estimators,
            solver,
        }
    }

    pub fn with_estimators(mut self, estimators: Estimators) -> Self {
        self.estimators = estimators;
        self
    }

    pub fn estimators(&self) -> &Estimators {
        &self.estimators
    }

    pub fn estimators_mut(&mut self) -> &mut Estimators {
        &mut self.estimators
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Fit `model` to `(x, y)`.
    ///
    /// `x` may have one more element than `y`, in which case it is treated as
    /// histogram bin edges.
    pub fn fit(&self, model: &dyn Model, x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
        let samples = prepare_samples(x, y, opts.weights.as_deref(), opts.data_range)?;

        let beta0 = match &opts.default_pars {
            Some(pars) => pars.clone(),
            None => self.estimators.estimate(&samples.x, &samples.y, model)?,
        };
        if samples.len() < beta0.len() {
            return Err(FitError::Underdetermined {
                n: samples.len(),
                p: beta0.len(),
            });
        }

        let problem = Problem::new(model, &samples.x, &samples.y)
            .with_weights(samples.weights.as_deref())
            .with_trace(opts.verbosity >= Verbosity::Iterations);
        let out = self.solver.solve(&problem, &beta0, opts.max_iterations)?;

        match out.stop_reason {
            StopReason::IterationLimit => log::warn!(
                "{}: iteration limit ({}) reached, result not reliable",
                model.name(),
                opts.max_iterations
            ),
            StopReason::NonFinite => log::warn!(
                "{}: objective is not finite at the starting parameters {:?}",
                model.name(),
                beta0
            ),
            _ => {}
        }

        let (x_min, x_max) = min_max(&samples.x).ok_or(FitError::NoData)?;
        let curve = resample_curve(model, &out.beta, x_min, x_max, samples.len() * CURVE_OVERSAMPLING)?;

        let result = FitResult {
            model: model.name().to_string(),
            curve,
            coefficients: out.beta,
            errors: out.sd_beta,
            chi_square: out.sum_square,
            residual_variance: out.res_var,
            covariance: out.cov_beta,
            stop_reason: out.stop_reason,
            iterations: out.iterations,
            n_points: samples.len(),
        };

        if opts.verbosity >= Verbosity::Summary {
            log::info!("\n{}", format_fit_report(&result));
        }

        Ok(result)
    }
}

/// Fit with the built-in estimators and the default solver.
///
/// ```
/// use fit_curves::{FitOptions, ModelKind, fit};
///
/// let x = [0.0, 1.0, 2.0, 3.0, 4.0];
/// let y = [1.0, 3.0, 5.0, 7.0, 9.0];
/// let result = fit(&ModelKind::Line, &x, &y, &FitOptions::default()).unwrap();
/// assert!((result.coefficients[0] - 1.0).abs() < 1e-8);
/// assert!((result.coefficients[1] - 2.0).abs() < 1e-8);
/// assert_eq!(result.curve.len(), 50);
/// ```
pub fn fit(model: &dyn Model, x: &[f64], y: &[f64], opts: &FitOptions) -> Result<FitResult> {
    Fitter::new().fit(model, x, y, opts)
}

/// Evaluate `model` on `n` evenly spaced points over `[x_min, x_max]`.
pub fn resample_curve(model: &dyn Model, params: &[f64], x_min: f64, x_max: f64, n: usize) -> Result<FitCurve> {
    let x = linspace(x_min, x_max, n);
    let y = model.eval_many(params, &x)?;
    Ok(FitCurve { x, y })
}
