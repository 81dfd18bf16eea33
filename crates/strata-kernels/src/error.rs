use thiserror::Error;

/// Failure of a saxpy3 product. No partial result accompanies an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpgemmError {
    #[error("out of memory allocating {0}")]
    OutOfMemory(&'static str),

    #[error("integer overflow computing {0}")]
    Overflow(&'static str),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("thread pool construction failed: {0}")]
    ThreadPool(String),
}

pub type Result<T> = core::result::Result<T, SpgemmError>;
