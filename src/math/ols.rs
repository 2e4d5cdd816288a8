//! Linear least squares via SVD.
//!
//! Every damped Gauss–Newton step of the solver is a small linear problem of
//! the form:
//!
//! ```text
//! minimize ‖J δ - r‖² + λ ‖D δ‖²
//! ```
//!
//! which we solve as an ordinary least squares problem on the stacked system
//! `[J; √λ D] δ = [r; 0]`.
//!
//! Implementation choices:
//! - SVD handles the tall (more rows than columns) stacked matrix directly.
//!   (Nalgebra's `QR::solve` is intended for square systems.)
//! - Parameter counts are tiny (≤ 21 columns), so SVD cost is irrelevant.

use nalgebra::{DMatrix, DVector};

use crate::error::{FitError, Result};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the damped step `[J; √λ D] δ = [r; 0]` where `D = diag(scale)`.
pub fn solve_damped(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    lambda: f64,
    scale: &DVector<f64>,
) -> Option<DVector<f64>> {
    let (n, p) = jacobian.shape();
    let mut a = DMatrix::<f64>::zeros(n + p, p);
    a.rows_mut(0, n).copy_from(jacobian);
    let sqrt_lambda = lambda.sqrt();
    for j in 0..p {
        a[(n + j, j)] = sqrt_lambda * scale[j];
    }

    let mut b = DVector::<f64>::zeros(n + p);
    b.rows_mut(0, n).copy_from(residuals);

    solve_least_squares(&a, &b)
}

/// Unscaled parameter covariance `(JᵀJ)⁻¹ = V·diag(1/σᵢ²)·Vᵀ` from the SVD of `J`.
///
/// Singular values at or below `ε·max(n, p)·σ_max` are treated as zero
/// (pseudo-inverse). The cutoff is relative to `J` itself, so the result is
/// independent of the absolute scale of x.
pub fn normal_covariance(jacobian: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (n, p) = jacobian.shape();
    if p == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }

    let svd = jacobian.clone().svd(false, true);
    let v_t = svd.v_t.ok_or(FitError::Algebra("SVD did not produce V"))?;
    let sigma_max = svd.singular_values.iter().copied().fold(0.0, f64::max);
    let cutoff = f64::EPSILON * n.max(p) as f64 * sigma_max;

    let mut cov = DMatrix::<f64>::zeros(p, p);
    for (k, &sigma) in svd.singular_values.iter().enumerate() {
        if sigma > cutoff {
            let v = v_t.row(k).transpose();
            cov += &v * v.transpose() / (sigma * sigma);
        }
    }
    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_the_step() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        let scale = DVector::from_element(2, 1.0);

        let free = solve_damped(&j, &r, 0.0, &scale).unwrap();
        let damped = solve_damped(&j, &r, 100.0, &scale).unwrap();
        assert!((free[0] - 2.0).abs() < 1e-10);
        assert!(damped.norm() < free.norm());
    }

    #[test]
    fn covariance_of_straight_line_design() {
        // JᵀJ = [[3, 3], [3, 5]] -> inverse = [[5, -3], [-3, 3]] / 6
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let cov = normal_covariance(&j).unwrap();
        assert!((cov[(0, 0)] - 5.0 / 6.0).abs() < 1e-12);
        assert!((cov[(0, 1)] + 0.5).abs() < 1e-12);
        assert!((cov[(1, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn covariance_follows_column_scale() {
        // Scaling the slope column by s scales its variance by 1/s².
        let base = [1.0, 0.0, 1.0, 0.5, 1.0, 1.0, 1.0, 1.5];
        let s = 1e-8;
        let scaled: Vec<f64> = base
            .chunks(2)
            .flat_map(|row| [row[0], row[1] * s])
            .collect();

        let cov = normal_covariance(&DMatrix::from_row_slice(4, 2, &base)).unwrap();
        let cov_s = normal_covariance(&DMatrix::from_row_slice(4, 2, &scaled)).unwrap();
        assert!((cov_s[(0, 0)] / cov[(0, 0)] - 1.0).abs() < 1e-6);
        assert!((cov_s[(1, 1)] * s * s / cov[(1, 1)] - 1.0).abs() < 1e-6);
        assert!((cov_s[(0, 1)] * s / cov[(0, 1)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn covariance_drops_null_directions() {
        // Two identical columns: rank 1, pseudo-inverse stays finite.
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let cov = normal_covariance(&j).unwrap();
        assert!(cov.iter().all(|v| v.is_finite()));
        // (JᵀJ)⁺ for J = [u, u] with ‖u‖² = 14 is [[1, 1], [1, 1]] / 56.
        assert!((cov[(0, 0)] - 1.0 / 56.0).abs() < 1e-12);
        assert!((cov[(0, 1)] - 1.0 / 56.0).abs() < 1e-12);
    }
}
