//! Reporting utilities: residuals and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (the golden tests below pin the layout)

use serde::{Deserialize, Serialize};

use crate::domain::FitResult;
use crate::error::{FitError, Result};
use crate::models::Model;

/// Fitted value and residual at one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub x: f64,
    pub y: f64,
    pub y_fit: f64,
    /// `y - y_fit`.
    pub residual: f64,
    pub weight: f64,
}

/// Compute fitted values and residuals for each observation (unit weights).
pub fn compute_residuals(model: &dyn Model, coefficients: &[f64], x: &[f64], y: &[f64]) -> Result<Vec<Residual>> {
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }

    let fitted = model.eval_many(coefficients, x)?;
    Ok(x.iter()
        .zip(y)
        .zip(fitted)
        .map(|((&x, &y), y_fit)| Residual {
            x,
            y,
            y_fit,
            residual: y - y_fit,
            weight: 1.0,
        })
        .collect())
}

/// Attach per-point weights to residuals computed by [`compute_residuals`].
pub fn apply_weights(residuals: &mut [Residual], weights: &[f64]) -> Result<()> {
    if weights.len() != residuals.len() {
        return Err(FitError::WeightLengthMismatch {
            weights: weights.len(),
            y: residuals.len(),
        });
    }
    for (r, &w) in residuals.iter_mut().zip(weights) {
        r.weight = w;
    }
    Ok(())
}

/// Format the fit summary: parameters with standard errors, covariance,
/// residual variance and why the solver stopped.
pub fn format_fit_report(result: &FitResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== fit: {} ===\n", result.model));
    out.push_str(&format!(
        "Points: n={} | iterations={}\n",
        result.n_points, result.iterations
    ));
    out.push_str(&format!(
        "Stop: {}{}\n",
        result.stop_reason.description(),
        if result.stop_reason.is_converged() { "" } else { " (not converged)" }
    ));
    out.push_str(&format!(
        "Chi-square={:.6e} | residual variance={:.6e}\n",
        result.chi_square, result.residual_variance
    ));

    out.push_str("\nParameters:\n");
    out.push_str(format!("{:<6} {:>16} {:>16}", "", "value", "std error").trim_end());
    out.push('\n');
    for (i, (value, err)) in result.coefficients.iter().zip(&result.errors).enumerate() {
        out.push_str(&format!("p{i:<5} {value:>16.6e} {err:>16.6e}\n"));
    }

    if !result.covariance.is_empty() {
        out.push_str("\nCovariance:\n");
        for row in &result.covariance {
            out.push_str(&fmt_vec(row));
            out.push('\n');
        }
    }

    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6e}")).collect();
    format!("[{}]", parts.join(", "))
}
