//! Tunables for the saxpy3 engine

/// Method hint for choosing between the Hash and Gustavson accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxbMethod {
    /// Pick per task from the flop count.
    #[default]
    Default,
    /// Dense accumulator for every task.
    Gustavson,
    /// Hash accumulator unless the table would reach the column length.
    Hash,
}

/// How a mask participates in the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskRegime {
    #[default]
    NoMask,
    /// The mask is scattered into each workspace and filters entries.
    Inline,
    /// Dense mask read directly from its own storage; Hash for all tasks.
    DenseInPlace,
    /// Dense mask read directly; Gustavson for all tasks, mask scan counted.
    DenseGustavson,
    /// The mask is ignored; the caller must apply it afterwards.
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Saxpy3Config {
    /// `None` runs on the ambient rayon pool (`RAYON_NUM_THREADS`).
    pub nthreads: Option<usize>,
    /// Minimum flops per thread.
    pub chunk: f64,
    pub tasks_per_thread: usize,
    /// A column is costly when its flops exceed `costly * target_task_size`.
    pub costly: f64,
    /// Each fine task aims at `target_task_size / fine_work` flops.
    pub fine_work: f64,
    /// Discard a sparse mask when A*B flops are below `mask_alpha * mask_work`.
    pub mask_alpha: f64,
    /// Use a dense mask in place when A*B flops are below `mask_beta * nrows * ncols`.
    pub mask_beta: f64,
    /// Switch to Gustavson when the hash table reaches `nrows / gustavson_divisor`.
    pub gustavson_divisor: usize,
    /// Override the mask policy (`Inline` or `Discard`).
    pub force_mask_regime: Option<MaskRegime>,
}

impl Default for Saxpy3Config {
    fn default() -> Self {
        Self {
            nthreads: None,
            chunk: 64.0 * 1024.0,
            tasks_per_thread: 2,
            costly: 1.2,
            fine_work: 2.0,
            mask_alpha: 0.01,
            mask_beta: 0.10,
            gustavson_divisor: 16,
            force_mask_regime: None,
        }
    }
}

impl Saxpy3Config {
    #[must_use]
    pub fn with_nthreads(mut self, nthreads: usize) -> Self {
        self.nthreads = Some(nthreads.max(1));
        self
    }

    #[must_use]
    pub fn with_chunk(mut self, chunk: f64) -> Self {
        self.chunk = chunk.max(1.0);
        self
    }

    #[must_use]
    pub fn with_tasks_per_thread(mut self, tasks_per_thread: usize) -> Self {
        self.tasks_per_thread = tasks_per_thread.max(1);
        self
    }

    #[must_use]
    pub fn with_costly(mut self, costly: f64) -> Self {
        self.costly = costly;
        self
    }

    #[must_use]
    pub fn with_fine_work(mut self, fine_work: f64) -> Self {
        self.fine_work = fine_work;
        self
    }

    #[must_use]
    pub fn with_mask_thresholds(mut self, alpha: f64, beta: f64) -> Self {
        self.mask_alpha = alpha;
        self.mask_beta = beta;
        self
    }

    #[must_use]
    pub fn with_gustavson_divisor(mut self, divisor: usize) -> Self {
        self.gustavson_divisor = divisor.max(1);
        self
    }

    #[must_use]
    pub fn with_mask_regime(mut self, regime: MaskRegime) -> Self {
        self.force_mask_regime = Some(regime);
        self
    }

    /// Upper bound on worker threads for this call.
    #[must_use]
    pub fn nthreads_max(&self) -> usize {
        self.nthreads
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}
