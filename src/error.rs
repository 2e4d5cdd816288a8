//! Error type shared by every module.
//!
//! Numerical trouble (non-finite values, solver non-convergence) is *not* an
//! error here: it is reported through `StopReason` and the log. `FitError`
//! covers structural problems that make a fit meaningless to attempt.

/// Errors produced while evaluating models or running a fit.
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    /// A model was called with the wrong number of parameters.
    #[error("model `{model}` expects {expected} parameters, got {got}")]
    InvalidArity {
        model: String,
        expected: usize,
        got: usize,
    },

    /// Polynomials are only provided up to a fixed degree.
    #[error("polynomial degree {degree} is outside the supported range 0..={max}")]
    UnsupportedDegree { degree: usize, max: usize },

    /// x and y lengths are neither equal nor histogram edges + contents.
    #[error("x has {x} values but y has {y}; expected equal lengths or exactly one extra bin edge")]
    LengthMismatch { x: usize, y: usize },

    /// Weight vector does not line up with the observations.
    #[error("weights has {weights} values but y has {y}")]
    WeightLengthMismatch { weights: usize, y: usize },

    /// Lower bound of a data range must be below the upper bound.
    #[error("invalid data range: lo={lo}, hi={hi} (need lo < hi)")]
    InvalidRange { lo: f64, hi: f64 },

    /// Nothing left to fit (empty input or everything outside the range).
    #[error("no data points available for fitting")]
    NoData,

    /// Fewer observations than free parameters.
    #[error("underdetermined fit: {n} data points for {p} parameters")]
    Underdetermined { n: usize, p: usize },

    /// The generic estimator could not find a parameter count the model accepts.
    #[error("could not determine the parameter count of model `{model}` (probed lengths 0..={limit})")]
    ArityProbeExhausted {
        model: String,
        limit: usize,
        #[source]
        last: Option<Box<FitError>>,
    },

    /// A registered estimator could not produce a starting point.
    #[error("estimator for model `{model}` failed: {reason}")]
    Estimate { model: String, reason: String },

    /// Linear algebra failure inside the solver.
    #[error("failed to solve: {0}")]
    Algebra(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FitError>;

impl FitError {
    pub(crate) fn arity(model: impl Into<String>, expected: usize, got: usize) -> Self {
        FitError::InvalidArity {
            model: model.into(),
            expected,
            got,
        }
    }
}
