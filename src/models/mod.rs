//! Model function library.
//!
//! Models are small, pure functions behind the [`Model`] trait so that the
//! estimator and solver code can stay generic.

pub mod library;
pub mod model;
pub mod polynomial;

pub use library::*;
pub use model::*;
pub use polynomial::*;
