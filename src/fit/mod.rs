//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - prepare samples (histogram edges, data range)
//! - estimate starting parameters per model
//! - run the solver and assemble the `FitResult`

pub mod estimate;
pub mod fitter;
pub mod prepare;

pub use estimate::*;
pub use fitter::*;
pub use prepare::*;
