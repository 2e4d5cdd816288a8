//! Reporting utilities: residuals and the fit summary.

pub mod format;

pub use format::*;
