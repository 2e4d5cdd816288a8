//! Levenberg–Marquardt least squares.
//!
//! This is the solver behind [`LeastSquaresSolver`]: orthogonal distance
//! regression restricted to its ordinary least squares mode (no errors in x),
//! so the objective is
//!
//! ```text
//! minimize Σ w_i (y_i - f(β, x_i))²
//! ```
//!
//! Each iteration:
//! - builds the weighted Jacobian by central finite differences
//! - solves the damped Gauss–Newton step through `math::ols`
//! - accepts the step if the objective does not increase, else raises the damping
//!
//! Standard errors follow the ODRPACK convention:
//! `sd_β = sqrt(diag((JᵀWJ)⁻¹) · χ² / (n - p))`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::StopReason;
use crate::error::{FitError, Result};
use crate::math::ols::{normal_covariance, solve_damped};
use crate::models::Model;

/// A least squares problem: model, observations and optional weights.
#[derive(Clone, Copy)]
pub struct Problem<'a> {
    pub model: &'a dyn Model,
    pub x: &'a [f64],
    pub y: &'a [f64],
    /// Multiplies each squared residual.
    pub weights: Option<&'a [f64]>,
    /// Emit one `debug` log line per iteration.
    pub trace: bool,
}

impl<'a> Problem<'a> {
    pub fn new(model: &'a dyn Model, x: &'a [f64], y: &'a [f64]) -> Self {
        Self {
            model,
            x,
            y,
            weights: None,
            trace: false,
        }
    }

    pub fn with_weights(mut self, weights: Option<&'a [f64]>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn sqrt_weight(&self, i: usize) -> f64 {
        self.weights.map(|w| w[i].sqrt()).unwrap_or(1.0)
    }

    /// Weighted residuals `√w_i (y_i - f(β, x_i))`.
    fn residuals(&self, beta: &DVector<f64>) -> Result<DVector<f64>> {
        let params = beta.as_slice();
        let mut r = DVector::<f64>::zeros(self.len());
        for i in 0..self.len() {
            let fit = self.model.eval(params, self.x[i])?;
            r[i] = self.sqrt_weight(i) * (self.y[i] - fit);
        }
        Ok(r)
    }

    /// Weighted model Jacobian `√w_i ∂f(β, x_i)/∂β_j` by central differences.
    fn jacobian(&self, beta: &DVector<f64>, rel_step: f64) -> Result<DMatrix<f64>> {
        let n = self.len();
        let p = beta.len();
        let mut jac = DMatrix::<f64>::zeros(n, p);
        let mut plus = beta.clone();
        let mut minus = beta.clone();

        for j in 0..p {
            let h = rel_step * beta[j].abs().max(1.0);
            plus[j] = beta[j] + h;
            minus[j] = beta[j] - h;
            for i in 0..n {
                let f_plus = self.model.eval(plus.as_slice(), self.x[i])?;
                let f_minus = self.model.eval(minus.as_slice(), self.x[i])?;
                jac[(i, j)] = self.sqrt_weight(i) * (f_plus - f_minus) / (2.0 * h);
            }
            plus[j] = beta[j];
            minus[j] = beta[j];
        }

        Ok(jac)
    }

    /// `Σ w_i y_i²`, the scale against which an exact fit is judged.
    fn weighted_signal(&self) -> f64 {
        (0..self.len())
            .map(|i| {
                let v = self.sqrt_weight(i) * self.y[i];
                v * v
            })
            .sum()
    }
}

/// What the solver hands back to the fitter.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub beta: Vec<f64>,
    pub sd_beta: Vec<f64>,
    /// Unscaled `(JᵀWJ)⁻¹`.
    pub cov_beta: Vec<Vec<f64>>,
    /// Weighted sum of squared residuals.
    pub sum_square: f64,
    pub res_var: f64,
    pub stop_reason: StopReason,
    pub iterations: usize,
}

/// The solver boundary used by the fitter.
pub trait LeastSquaresSolver {
    fn solve(&self, problem: &Problem<'_>, beta0: &[f64], max_iterations: usize) -> Result<SolverOutput>;
}

/// Solver tolerances and damping schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Relative sum-of-squares reduction that counts as converged.
    pub sum_square_tol: f64,
    /// Relative parameter step that counts as converged.
    pub param_tol: f64,
    /// `χ² ≤ exact_fit_tol · Σ w y²` counts as a vanishing residual.
    pub exact_fit_tol: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// Damping beyond this means no downhill step exists.
    pub max_lambda: f64,
    /// Finite-difference step, relative to `max(|β_j|, 1)`.
    pub diff_step: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            // ODRPACK defaults: sqrt(eps) and eps^(2/3).
            sum_square_tol: f64::EPSILON.sqrt(),
            param_tol: f64::EPSILON.powf(2.0 / 3.0),
            exact_fit_tol: 1e-28,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e16,
            diff_step: f64::EPSILON.cbrt(),
        }
    }
}

/// Damped Gauss–Newton with Marquardt diagonal scaling.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    pub config: LmConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: LmConfig) -> Self {
        Self { config }
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn solve(&self, problem: &Problem<'_>, beta0: &[f64], max_iterations: usize) -> Result<SolverOutput> {
        let cfg = &self.config;
        if let Some(w) = problem.weights {
            if w.len() != problem.y.len() {
                return Err(FitError::WeightLengthMismatch {
                    weights: w.len(),
                    y: problem.y.len(),
                });
            }
        }
        if problem.x.len() != problem.y.len() {
            return Err(FitError::LengthMismatch {
                x: problem.x.len(),
                y: problem.y.len(),
            });
        }

        let mut beta = DVector::from_column_slice(beta0);
        let mut r = problem.residuals(&beta)?;
        let mut chi2 = r.norm_squared();

        if !chi2.is_finite() {
            let p = beta.len();
            return Ok(SolverOutput {
                beta: beta0.to_vec(),
                sd_beta: vec![f64::NAN; p],
                cov_beta: vec![vec![f64::NAN; p]; p],
                sum_square: chi2,
                res_var: f64::NAN,
                stop_reason: StopReason::NonFinite,
                iterations: 0,
            });
        }

        let exact_threshold = cfg.exact_fit_tol * problem.weighted_signal().max(1.0);
        let mut lambda = cfg.initial_lambda;
        let mut scale = DVector::<f64>::zeros(beta.len());
        let mut iterations = 0;
        let mut stop = if chi2 <= exact_threshold {
            Some(StopReason::ExactFit)
        } else {
            None
        };

        while stop.is_none() && iterations < max_iterations {
            iterations += 1;
            let jac = problem.jacobian(&beta, cfg.diff_step)?;

            // Marquardt scaling: running max of the Jacobian column norms.
            for (j, col) in jac.column_iter().enumerate() {
                let norm = col.norm();
                scale[j] = scale[j].max(if norm > 0.0 { norm } else { 1.0 });
            }

            loop {
                let Some(delta) = solve_damped(&jac, &r, lambda, &scale) else {
                    lambda *= cfg.lambda_up;
                    if lambda > cfg.max_lambda {
                        stop = Some(StopReason::Stalled);
                        break;
                    }
                    continue;
                };

                let step_small = delta.norm() <= cfg.param_tol * (beta.norm() + cfg.param_tol);
                let candidate = &beta + &delta;
                let r_new = problem.residuals(&candidate)?;
                let chi2_new = r_new.norm_squared();

                if chi2_new.is_finite() && chi2_new <= chi2 {
                    let reduction = if chi2 > 0.0 { (chi2 - chi2_new) / chi2 } else { 0.0 };
                    beta = candidate;
                    r = r_new;
                    chi2 = chi2_new;
                    lambda = (lambda * cfg.lambda_down).max(f64::MIN_POSITIVE);

                    if problem.trace {
                        log::debug!(
                            "{}: iter {iterations}: chi2={chi2:.6e} lambda={lambda:.3e} beta={:?}",
                            problem.model.name(),
                            beta.as_slice()
                        );
                    }

                    if chi2 <= exact_threshold {
                        stop = Some(StopReason::ExactFit);
                    } else if reduction <= cfg.sum_square_tol {
                        stop = Some(StopReason::SumOfSquaresConvergence);
                    } else if step_small {
                        stop = Some(StopReason::ParameterConvergence);
                    }
                    break;
                }

                if step_small {
                    stop = Some(StopReason::ParameterConvergence);
                    break;
                }
                lambda *= cfg.lambda_up;
                if lambda > cfg.max_lambda {
                    stop = Some(StopReason::Stalled);
                    break;
                }
            }
        }

        let stop_reason = stop.unwrap_or(StopReason::IterationLimit);
        finish(problem, beta, chi2, stop_reason, iterations, cfg.diff_step)
    }
}

fn finish(
    problem: &Problem<'_>,
    beta: DVector<f64>,
    chi2: f64,
    stop_reason: StopReason,
    iterations: usize,
    diff_step: f64,
) -> Result<SolverOutput> {
    let n = problem.len();
    let p = beta.len();
    let jac = problem.jacobian(&beta, diff_step)?;
    let cov = normal_covariance(&jac)?;

    let dof = n.saturating_sub(p);
    let res_var = if dof > 0 { chi2 / dof as f64 } else { chi2 };

    let sd_beta = (0..p).map(|j| (cov[(j, j)] * res_var).sqrt()).collect();
    let cov_beta = (0..p).map(|i| (0..p).map(|j| cov[(i, j)]).collect()).collect();

    Ok(SolverOutput {
        beta: beta.iter().copied().collect(),
        sd_beta,
        cov_beta,
        sum_square: chi2,
        res_var,
        stop_reason,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;
    use approx::assert_abs_diff_eq;

    #[test]
    fn straight_line_is_exact() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 5.0, 7.0, 9.0];
        let model = ModelKind::Line;
        let problem = Problem::new(&model, &x, &y);

        let out = LevenbergMarquardt::default().solve(&problem, &[0.0, 0.0], 200).unwrap();
        assert_abs_diff_eq!(out.beta[0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(out.beta[1], 2.0, epsilon = 1e-8);
        assert!(out.sum_square < 1e-16);
        assert!(out.stop_reason.is_converged());
    }

    #[test]
    fn weights_pull_the_fit_toward_heavy_points() {
        // Constant model against two clusters; the heavy cluster should win.
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 0.0, 10.0, 10.0];
        let w = [100.0, 100.0, 1.0, 1.0];
        let model = ModelKind::from_name("pol0").unwrap();
        let problem = Problem::new(&model, &x, &y).with_weights(Some(&w));

        let out = LevenbergMarquardt::default().solve(&problem, &[5.0], 200).unwrap();
        // Weighted mean: (0*200 + 10*2) / 202.
        assert_abs_diff_eq!(out.beta[0], 20.0 / 202.0, epsilon = 1e-8);
    }

    #[test]
    fn zero_iterations_reports_iteration_limit() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 2.0, 4.0];
        let model = ModelKind::Line;
        let problem = Problem::new(&model, &x, &y);

        let out = LevenbergMarquardt::default().solve(&problem, &[0.0, 0.0], 0).unwrap();
        assert_eq!(out.stop_reason, StopReason::IterationLimit);
        assert_eq!(out.iterations, 0);
        assert_eq!(out.beta, vec![0.0, 0.0]);
    }

    #[test]
    fn non_finite_start_stops_immediately() {
        let x = [-1.0, 0.0, 1.0];
        let y = [1.0, 1.0, 1.0];
        let model = ModelKind::PowLaw;
        let problem = Problem::new(&model, &x, &y);

        let out = LevenbergMarquardt::default().solve(&problem, &[1.0, 0.5], 50).unwrap();
        assert_eq!(out.stop_reason, StopReason::NonFinite);
        assert!(out.sd_beta.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn wrong_starting_arity_propagates() {
        let x = [0.0, 1.0];
        let y = [0.0, 1.0];
        let model = ModelKind::Line;
        let problem = Problem::new(&model, &x, &y);

        let err = LevenbergMarquardt::default().solve(&problem, &[0.0], 10).unwrap_err();
        assert!(matches!(err, FitError::InvalidArity { .. }));
    }

    #[test]
    fn standard_errors_match_ordinary_least_squares() {
        // For a linear model the LM answer equals OLS, with
        // sd = sqrt(diag((XᵀX)⁻¹) · SSE / (n - p)).
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.1, 0.9, 2.2, 2.8];
        let model = ModelKind::Line;
        let problem = Problem::new(&model, &x, &y);
        let out = LevenbergMarquardt::default().solve(&problem, &[0.0, 1.0], 200).unwrap();

        // Closed form: slope = Sxy / Sxx, intercept = ȳ - slope·x̄.
        let slope = 0.94;
        let intercept = 1.5 - slope * 1.5;
        assert_abs_diff_eq!(out.beta[1], slope, epsilon = 1e-7);
        assert_abs_diff_eq!(out.beta[0], intercept, epsilon = 1e-7);

        let sse: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| (yi - intercept - slope * xi).powi(2))
            .sum();
        assert_abs_diff_eq!(out.sum_square, sse, epsilon = 1e-10);
        // (XᵀX)⁻¹ = [[7, -3], [-3, 2]] / 10 for x = 0..3.
        let res_var = sse / 2.0;
        assert_abs_diff_eq!(out.sd_beta[0], (0.7 * res_var).sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(out.sd_beta[1], (0.2 * res_var).sqrt(), epsilon = 1e-6);
    }
}
