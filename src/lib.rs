//! `fit-curves` library crate.
//!
//! Least-squares curve fitting with sensible defaults:
//!
//! - a library of common model shapes (Gaussian, exponentials, Crystal Ball,
//!   power law, polynomials up to degree 20) behind the [`Model`] trait
//! - per-model starting-parameter estimators with a generic fallback
//! - a Levenberg–Marquardt solver reporting standard errors and chi-square
//! - a [`fit`] entry point that also handles histogram bin edges, a data
//!   range and per-point weights
//!
//! Reporting and ASCII plots live in [`report`] and [`plot`]. The library
//! only emits `log` records; installing a logger is up to the caller.

pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;

pub use domain::{DataRange, FitCurve, FitOptions, FitResult, Samples, StopReason, Verbosity};
pub use error::{FitError, Result};
pub use fit::{Estimate, Estimators, Fitter, Heuristic, fit};
pub use math::lm::{LeastSquaresSolver, LevenbergMarquardt, LmConfig};
pub use models::{FnModel, Model, ModelKind, Polynomial, make_polynomial};
