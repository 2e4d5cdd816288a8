//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - fit configuration (`FitOptions`, `DataRange`, `Verbosity`)
//! - preprocessed observations (`Samples`)
//! - fit outputs (`FitResult`, `FitCurve`, `StopReason`)

pub mod types;

pub use types::*;
