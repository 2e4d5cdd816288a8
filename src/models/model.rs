//! The `Model` abstraction.
//!
//! The fitter relies on one primitive operation: predict `y(x)` for a given
//! parameter slice. Everything else (estimators, solver, curve resampling) is
//! generic over that.

use crate::error::{FitError, Result};

/// A curve `y = f(params, x)`.
///
/// Implementations must be pure and must reject a parameter slice of the
/// wrong length with [`FitError::InvalidArity`]; the generic default-parameter
/// estimator relies on that to discover how many parameters a model takes.
pub trait Model: Send + Sync {
    /// Stable identifier, also the key into the estimator table.
    fn name(&self) -> &str;

    /// Evaluate at a single point.
    fn eval(&self, params: &[f64], x: f64) -> Result<f64>;

    /// Evaluate at many points.
    fn eval_many(&self, params: &[f64], xs: &[f64]) -> Result<Vec<f64>> {
        xs.iter().map(|&x| self.eval(params, x)).collect()
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn eval(&self, params: &[f64], x: f64) -> Result<f64> {
        (**self).eval(params, x)
    }

    fn eval_many(&self, params: &[f64], xs: &[f64]) -> Result<Vec<f64>> {
        (**self).eval_many(params, xs)
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn eval(&self, params: &[f64], x: f64) -> Result<f64> {
        (**self).eval(params, x)
    }

    fn eval_many(&self, params: &[f64], xs: &[f64]) -> Result<Vec<f64>> {
        (**self).eval_many(params, xs)
    }
}

/// Reject `params` unless it has exactly `expected` entries.
pub fn check_arity(model: &str, params: &[f64], expected: usize) -> Result<()> {
    if params.len() != expected {
        return Err(FitError::arity(model, expected, params.len()));
    }
    Ok(())
}

/// A user-supplied closure with a declared parameter count.
///
/// ```
/// use fit_curves::models::{FnModel, Model};
///
/// // Gaussian on a quadratic background: [N, mu, sigma, a, b, c].
/// let model = FnModel::new("gaus_bg", 6, |p: &[f64], x: f64| {
///     p[0] * (-0.5 * ((x - p[1]) / p[2]).powi(2)).exp() + p[3] * x * x + p[4] * x + p[5]
/// });
/// assert!(model.eval(&[1.0, 0.0, 1.0, 0.0, 0.0, 0.0], 0.0).is_ok());
/// assert!(model.eval(&[1.0, 0.0, 1.0], 0.0).is_err());
/// ```
pub struct FnModel<F> {
    name: String,
    arity: usize,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&[f64], f64) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, arity: usize, f: F) -> Self {
        Self {
            name: name.into(),
            arity,
            f,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(&[f64], f64) -> f64 + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, params: &[f64], x: f64) -> Result<f64> {
        check_arity(&self.name, params, self.arity)?;
        Ok((self.f)(params, x))
    }
}

impl<F> std::fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModel")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_model_checks_arity() {
        let m = FnModel::new("shift", 1, |p: &[f64], x: f64| x + p[0]);
        assert_eq!(m.eval(&[2.0], 1.0).unwrap(), 3.0);
        match m.eval(&[], 1.0) {
            Err(FitError::InvalidArity { expected, got, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(got, 0);
            }
            other => panic!("expected arity error, got {other:?}"),
        }
    }

    #[test]
    fn eval_many_matches_eval() {
        let m = FnModel::new("sq", 1, |p: &[f64], x: f64| p[0] * x * x);
        let xs = [0.0, 1.0, 2.0];
        let ys = m.eval_many(&[3.0], &xs).unwrap();
        assert_eq!(ys, vec![0.0, 3.0, 12.0]);
    }

    #[test]
    fn boxed_and_borrowed_models_delegate() {
        let m = FnModel::new("id", 0, |_: &[f64], x: f64| x);
        let boxed: Box<dyn Model> = Box::new(m);
        assert_eq!(boxed.name(), "id");
        let borrowed = &boxed;
        assert_eq!(borrowed.eval(&[], 4.0).unwrap(), 4.0);
    }
}
