//! Numerical building blocks: least squares solves, the Levenberg–Marquardt
//! solver and small statistics helpers.

pub mod lm;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use ols::*;
