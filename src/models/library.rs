//! Built-in model functions.
//!
//! Each formula is exposed both as a free function (`gaus(params, x)`) and
//! through [`ModelKind`], which is what the fitter and the estimator table
//! work with. Parameter order is documented on each function.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use nalgebra::Complex;
use statrs::function::erf::erf;

use crate::error::Result;
use crate::models::model::{Model, check_arity};
use crate::models::polynomial::Polynomial;

/// Unnormalized Gaussian. Params: `[N, mu, sigma]`.
pub fn gaus(params: &[f64], x: f64) -> Result<f64> {
    check_arity("gaus", params, 3)?;
    let (n, mu, sigma) = (params[0], params[1], params[2]);
    Ok(n * (-0.5 * ((x - mu) / sigma).powi(2)).exp())
}

/// `exp(const + slope·x)`. Params: `[const, slope]`.
pub fn expo(params: &[f64], x: f64) -> Result<f64> {
    check_arity("expo", params, 2)?;
    Ok((params[0] + params[1] * x).exp())
}

/// Product of two `c·exp(s·x + m)` terms. Params: `[c1, s1, m1, c2, s2, m2]`.
pub fn double_exp(params: &[f64], x: f64) -> Result<f64> {
    check_arity("double_exp", params, 6)?;
    let first = params[0] * (params[1] * x + params[2]).exp();
    let second = params[3] * (params[4] * x + params[5]).exp();
    Ok(first * second)
}

/// Straight line. Params: `[intercept, slope]`.
pub fn line(params: &[f64], x: f64) -> Result<f64> {
    check_arity("line", params, 2)?;
    Ok(params[1] * x + params[0])
}

/// Crystal Ball: Gaussian core with a power-law low tail.
/// Params: `[N, a, n, xb, sig]`. `a` and `n` are used by absolute value.
pub fn crystal_ball(params: &[f64], x: f64) -> Result<f64> {
    check_arity("crystal_ball", params, 5)?;
    let (amplitude, a, n, xb, sig) = (params[0], params[1], params[2], params[3], params[4]);
    Ok(amplitude * crystal_ball_shape(a.abs(), n.abs(), xb, sig, x))
}

/// Crystal Ball normalized to unit area. Params: `[a, n, xb, sig]`.
///
/// The normalization integral only converges for `n > 1`; other values are
/// not rejected and simply produce non-finite output.
pub fn crystal_ball_norm(params: &[f64], x: f64) -> Result<f64> {
    check_arity("crystal_ball_norm", params, 4)?;
    let (a, n, xb, sig) = (params[0].abs(), params[1].abs(), params[2], params[3]);
    let tail = n / a / (n - 1.0) * (-0.5 * a * a).exp();
    let core = (PI / 2.0).sqrt() * (1.0 + erf(a * FRAC_1_SQRT_2));
    let amplitude = 1.0 / (sig * (tail + core));
    Ok(amplitude * crystal_ball_shape(a, n, xb, sig, x))
}

/// `base · x^exponent`. Params: `[base, exponent]`.
pub fn pow_law(params: &[f64], x: f64) -> Result<f64> {
    check_arity("pow_law", params, 2)?;
    Ok(params[0] * x.powf(params[1]))
}

/// First-over-first-inverse: `a / (x + b) + c·x + d`. Params: `[a, b, c, d]`.
pub fn fofoi(params: &[f64], x: f64) -> Result<f64> {
    check_arity("fofoi", params, 4)?;
    let (a, b, c, d) = (params[0], params[1], params[2], params[3]);
    Ok(a / (x + b) + c * x + d)
}

/// Unit-amplitude Crystal Ball shape; expects `a, n >= 0`.
fn crystal_ball_shape(a: f64, n: f64, xb: f64, sig: f64, x: f64) -> f64 {
    let t = (x - xb) / sig;
    if t > -a {
        return (-0.5 * t * t).exp();
    }
    let scale = (n / a).powf(n) * (-0.5 * a * a).exp();
    let offset = n / a - a;
    // Principal branch so a negative base cannot produce NaN; only the real part is kept.
    let tail = Complex::new(offset - t, 0.0).powf(-n);
    scale * tail.re
}

/// Every built-in model, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Gaus,
    Expo,
    DoubleExp,
    Line,
    CrystalBall,
    CrystalBallNorm,
    PowLaw,
    Fofoi,
    Poly(Polynomial),
}

impl ModelKind {
    /// Non-polynomial models, in library order.
    pub const SHAPES: [ModelKind; 8] = [
        ModelKind::Gaus,
        ModelKind::Expo,
        ModelKind::DoubleExp,
        ModelKind::Line,
        ModelKind::CrystalBall,
        ModelKind::CrystalBallNorm,
        ModelKind::PowLaw,
        ModelKind::Fofoi,
    ];

    /// The whole library: shapes followed by `pol0`..`pol20`.
    pub fn library() -> Vec<ModelKind> {
        Self::SHAPES
            .iter()
            .copied()
            .chain(Polynomial::all().map(ModelKind::Poly))
            .collect()
    }

    pub fn from_name(name: &str) -> Option<ModelKind> {
        Self::SHAPES
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .or_else(|| Polynomial::from_name(name).map(ModelKind::Poly))
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Gaus => "gaus",
            ModelKind::Expo => "expo",
            ModelKind::DoubleExp => "double_exp",
            ModelKind::Line => "line",
            ModelKind::CrystalBall => "crystal_ball",
            ModelKind::CrystalBallNorm => "crystal_ball_norm",
            ModelKind::PowLaw => "pow_law",
            ModelKind::Fofoi => "fofoi",
            ModelKind::Poly(p) => p.name(),
        }
    }

    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Gaus => 3,
            ModelKind::Expo | ModelKind::Line | ModelKind::PowLaw => 2,
            ModelKind::DoubleExp => 6,
            ModelKind::CrystalBall => 5,
            ModelKind::CrystalBallNorm | ModelKind::Fofoi => 4,
            ModelKind::Poly(p) => p.param_count(),
        }
    }

    /// Predict `y(x)`.
    pub fn predict(self, params: &[f64], x: f64) -> Result<f64> {
        match self {
            ModelKind::Gaus => gaus(params, x),
            ModelKind::Expo => expo(params, x),
            ModelKind::DoubleExp => double_exp(params, x),
            ModelKind::Line => line(params, x),
            ModelKind::CrystalBall => crystal_ball(params, x),
            ModelKind::CrystalBallNorm => crystal_ball_norm(params, x),
            ModelKind::PowLaw => pow_law(params, x),
            ModelKind::Fofoi => fofoi(params, x),
            ModelKind::Poly(p) => p.evaluate(params, x),
        }
    }
}

impl From<Polynomial> for ModelKind {
    fn from(p: Polynomial) -> Self {
        ModelKind::Poly(p)
    }
}

impl Model for ModelKind {
    fn name(&self) -> &str {
        ModelKind::name(*self)
    }

    fn eval(&self, params: &[f64], x: f64) -> Result<f64> {
        self.predict(params, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;
    use approx::assert_relative_eq;

    fn sample_params(kind: ModelKind) -> Vec<f64> {
        match kind {
            ModelKind::Gaus => vec![2.0, 1.0, 0.5],
            ModelKind::Expo => vec![0.3, -0.2],
            ModelKind::DoubleExp => vec![1.0, 0.1, 0.2, 2.0, -0.3, 0.1],
            ModelKind::Line => vec![1.0, 2.0],
            ModelKind::CrystalBall => vec![3.0, 1.2, 2.5, 1.0, 0.4],
            ModelKind::CrystalBallNorm => vec![1.2, 2.5, 1.0, 0.4],
            ModelKind::PowLaw => vec![2.6, -0.15],
            ModelKind::Fofoi => vec![1.0, 2.0, 0.5, -1.0],
            ModelKind::Poly(p) => (0..p.param_count()).map(|i| 0.1 * (i as f64 + 1.0)).collect(),
        }
    }

    #[test]
    fn scalar_and_single_element_evaluation_agree() {
        for kind in ModelKind::library() {
            let params = sample_params(kind);
            for &x in &[0.3, 0.9, 1.7] {
                let scalar = kind.eval(&params, x).unwrap();
                let many = kind.eval_many(&params, &[x]).unwrap();
                assert_eq!(many.len(), 1);
                assert_eq!(scalar.to_bits(), many[0].to_bits(), "{}", kind.name());
            }
        }
    }

    #[test]
    fn every_model_rejects_wrong_arity() {
        for kind in ModelKind::library() {
            let mut params = sample_params(kind);
            params.push(0.0);
            assert!(
                matches!(kind.eval(&params, 1.0), Err(FitError::InvalidArity { .. })),
                "{}",
                kind.name()
            );
            assert_eq!(kind.param_count(), params.len() - 1);
        }
    }

    #[test]
    fn line_is_degree_one_polynomial() {
        let pol1 = ModelKind::from_name("pol1").unwrap();
        for &x in &[-2.0, 0.0, 3.5] {
            assert_eq!(
                line(&[1.0, 2.0], x).unwrap(),
                pol1.eval(&[1.0, 2.0], x).unwrap()
            );
        }
    }

    #[test]
    fn gaus_peaks_at_mu() {
        assert_relative_eq!(gaus(&[5.0, 2.0, 0.7], 2.0).unwrap(), 5.0);
        let one_sigma = gaus(&[5.0, 2.0, 0.7], 2.7).unwrap();
        assert_relative_eq!(one_sigma, 5.0 * (-0.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn double_exp_is_product_of_terms() {
        let y = double_exp(&[2.0, 0.5, 0.0, 3.0, -0.5, 0.0], 1.3).unwrap();
        assert_relative_eq!(y, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn fofoi_and_pow_law_formulas() {
        assert_relative_eq!(fofoi(&[1.0, 1.0, 2.0, 3.0], 1.0).unwrap(), 0.5 + 2.0 + 3.0);
        assert_relative_eq!(pow_law(&[2.0, 2.0], 3.0).unwrap(), 18.0);
    }

    #[test]
    fn crystal_ball_is_continuous_at_the_tail_junction() {
        let params = [1.0, 1.5, 3.0, 0.0, 1.0];
        let junction = -1.5;
        let left = crystal_ball(&params, junction - 1e-9).unwrap();
        let right = crystal_ball(&params, junction + 1e-9).unwrap();
        assert_relative_eq!(left, right, epsilon = 1e-6);
    }

    #[test]
    fn crystal_ball_uses_absolute_shape_parameters() {
        let pos = crystal_ball(&[1.0, 1.5, 3.0, 0.0, 1.0], -4.0).unwrap();
        let neg = crystal_ball(&[1.0, -1.5, -3.0, 0.0, 1.0], -4.0).unwrap();
        assert_eq!(pos, neg);
        assert!(pos.is_finite() && pos > 0.0);
    }

    #[test]
    fn crystal_ball_norm_has_unit_area() {
        let params = [1.5, 3.0, 0.0, 1.0];
        let (lo, hi, step) = (-400.0, 10.0, 0.005);
        let n = ((hi - lo) / step) as usize;
        let mut area = 0.0;
        let mut prev = crystal_ball_norm(&params, lo).unwrap();
        for i in 1..=n {
            let x = lo + i as f64 * step;
            let cur = crystal_ball_norm(&params, x).unwrap();
            area += 0.5 * (prev + cur) * step;
            prev = cur;
        }
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn crystal_ball_norm_degenerates_without_convergent_tail() {
        // n = 1: the tail integral diverges and the amplitude collapses.
        let y = crystal_ball_norm(&[1.5, 1.0, 0.0, 1.0], 0.0).unwrap();
        assert_eq!(y, 0.0);
    }

    #[test]
    fn library_names_resolve() {
        let lib = ModelKind::library();
        assert_eq!(lib.len(), 8 + 21);
        for kind in lib {
            assert_eq!(ModelKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ModelKind::from_name("nope"), None);
    }
}
