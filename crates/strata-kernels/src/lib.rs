//! Parallel saxpy3 sparse matrix product over semirings (pure Rust, rayon)
//!
//! The entry point is [`saxpy3`]. Parallelism comes from the ambient rayon
//! pool (`RAYON_NUM_THREADS`), or from a dedicated pool when
//! [`Saxpy3Config::nthreads`] is set.

pub mod config;
pub mod error;
pub mod mask;
pub mod saxpy3;
pub mod stats;
pub mod utility;

pub use config::{AxbMethod, MaskRegime, Saxpy3Config};
pub use error::{Result, SpgemmError};
pub use mask::{apply_mask, Mask};
pub use saxpy3::hash_size::{hash_table_size, Accumulator};
pub use saxpy3::{saxpy3, Saxpy3Output};
pub use stats::{PhaseTimings, Saxpy3Stats};
