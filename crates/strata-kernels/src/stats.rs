//! Per-call diagnostics returned alongside the product

use crate::config::MaskRegime;
use std::time::{Duration, Instant};

/// Wall time spent in each phase of one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    pub setup: Duration,
    pub flopcount: Duration,
    pub mask_policy: Duration,
    pub tasks: Duration,
    pub workspace: Duration,
    pub symbolic: Duration,
    pub numeric: Duration,
    pub finalize: Duration,
}

impl PhaseTimings {
    #[must_use]
    pub fn total(&self) -> Duration {
        self.setup
            + self.flopcount
            + self.mask_policy
            + self.tasks
            + self.workspace
            + self.symbolic
            + self.numeric
            + self.finalize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Saxpy3Stats {
    pub nthreads: usize,
    pub nfine: usize,
    pub ncoarse: usize,
    pub nfine_hash: usize,
    pub nfine_gustavson: usize,
    pub ncoarse_hash: usize,
    pub ncoarse_gustavson: usize,
    pub total_flops: i64,
    /// Estimated flops of the most expensive task, for load-balance checks.
    pub max_task_flops: i64,
    pub mask_work: i64,
    pub regime: MaskRegime,
    /// The product was computed directly from two full iso inputs.
    pub iso_fast_path: bool,
    /// The result values are a single iso scalar.
    pub iso_result: bool,
    /// The type-erased numeric backend ran instead of a specialized one.
    pub generic: bool,
    pub timings: PhaseTimings,
}

impl Saxpy3Stats {
    #[must_use]
    pub const fn ntasks(&self) -> usize {
        self.nfine + self.ncoarse
    }
}

/// Measures consecutive phases; each `lap` returns the time since the last.
pub(crate) struct Stopwatch(Instant);

impl Stopwatch {
    pub(crate) fn start() -> Self {
        Self(Instant::now())
    }

    pub(crate) fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.0);
        self.0 = now;
        elapsed
    }
}
