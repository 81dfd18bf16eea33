//! Core data structures and traits for Strata (pure Rust)

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod matrix;
pub mod scalar;
pub mod semiring;

pub use matrix::{Layout, Matrix, Values};
pub use scalar::{Scalar, ScalarKind};
pub use semiring::{BinaryOp, Monoid, MonoidOpcode, MultiplyOpcode, Semiring, UserFn};
