//! Saxpy3: C = A*B, C<M> = A*B or C<!M> = A*B over any semiring
//!
//! Every column of C is a sum of columns of A scaled by the entries of the
//! matching column of B. Columns are grouped into coarse tasks, each owning a
//! range of columns and a private workspace, while columns costly enough to
//! stall a thread are split across a team of fine tasks sharing one atomic
//! workspace.
//!
//! # Algorithm
//! 1. Iso check: a provably iso result skips value computation, and two full
//!    iso inputs skip the whole machinery.
//! 2. Flop count per column of B, with the cost of a sparse mask.
//! 3. Mask policy: inline, dense in place, dense with Gustavson, or discard.
//! 4. Task partition and one workspace per coarse task or fine team.
//! 5. Symbolic phase: count C(:,j), then a prefix sum gives the pointers.
//! 6. Numeric phase with a specialized kernel, or the generic one.
//! 7. Prune empty vectors of a hypersparse result.

mod factory;
mod flopcount;
pub mod hash_size;
mod iso;
mod mask_policy;
mod numeric;
mod symbolic;
mod tasks;
mod workspace;

use crate::config::{AxbMethod, MaskRegime, Saxpy3Config};
use crate::error::{Result, SpgemmError};
use crate::mask::Mask;
use crate::stats::{Saxpy3Stats, Stopwatch};
use crate::utility::prune::prune_empty_vectors;
use crate::utility::util::{cumsum, i64_to_usize, try_filled};
use factory::{run_specialized, Generic, KernelRunner};
use flopcount::flopcount;
use iso::{iso_result, IsoResult};
use mask_policy::{decide, MaskShape};
use numeric::NumericPhase;
use strata_core::{Layout, Matrix, MonoidOpcode, MultiplyOpcode, Scalar, Semiring, Values};
use symbolic::symbolic;
use tasks::partition;
use workspace::allocate;

/// How the mask reaches the symbolic and numeric phases.
pub(crate) enum MaskMode<'a> {
    Off,
    /// Scattered into every workspace before its column is computed.
    Inline(Mask<'a>),
    /// Dense; each candidate entry reads `M(i,j)` directly.
    InPlace(Mask<'a>),
}

/// Inputs shared by every task.
pub(crate) struct Context<'a, T> {
    pub a: &'a Matrix<T>,
    pub b: &'a Matrix<T>,
    pub mask: MaskMode<'a>,
}

impl<T> Context<'_, T> {
    /// A dense mask read in place forbids C(i,j).
    #[inline]
    pub fn blocked_in_place(&self, i: usize, j: usize) -> bool {
        match &self.mask {
            MaskMode::InPlace(m) => !m.dense_allows(i, j),
            _ => false,
        }
    }

    /// Only rows scattered from the mask may enter C.
    #[inline]
    pub fn restricts(&self) -> bool {
        matches!(&self.mask, MaskMode::Inline(m) if !m.complement)
    }
}

/// Result of [`saxpy3`].
#[derive(Debug, Clone)]
pub struct Saxpy3Output<T> {
    pub c: Matrix<T>,
    /// The mask was honored. False when no mask was given, and when the
    /// mask was discarded; in that case apply it with
    /// [`apply_mask`](crate::mask::apply_mask).
    pub mask_applied: bool,
    pub stats: Saxpy3Stats,
}

/// Compute `C = A*B` (optionally masked) over `semiring`.
///
/// With `flipxy` the multiply operator is applied as `f(b, a)`. `method`
/// hints at the accumulator; `config` carries the tuning constants and the
/// thread count. Rows are sorted within every column of the result, which
/// is sparse, or hypersparse with a subset of B's vectors when B is
/// hypersparse.
///
/// # Errors
/// `DimensionMismatch` when the shapes of A, B and the mask disagree,
/// `OutOfMemory` or `Overflow` when a buffer cannot be sized or allocated,
/// and `ThreadPool` when a dedicated pool cannot be built.
pub fn saxpy3<T: Scalar>(
    mask: Option<Mask<'_>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T>,
    flipxy: bool,
    method: AxbMethod,
    config: &Saxpy3Config,
) -> Result<Saxpy3Output<T>> {
    match config.nthreads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| SpgemmError::ThreadPool(e.to_string()))?;
            pool.install(|| multiply(mask, a, b, semiring, flipxy, method, config))
        }
        None => multiply(mask, a, b, semiring, flipxy, method, config),
    }
}

fn empty_product<T: Scalar>(b: &Matrix<T>, nrows: usize) -> Matrix<T> {
    match &b.layout {
        Layout::Hypersparse { .. } => Matrix {
            nrows,
            ncols: b.ncols,
            layout: Layout::Hypersparse {
                hyperlist: Vec::new(),
                indptr: vec![0],
                indices: Vec::new(),
            },
            values: Values::Array(Vec::new()),
            jumbled: false,
        },
        _ => Matrix::empty(nrows, b.ncols),
    }
}

#[allow(clippy::too_many_lines)]
fn multiply<T: Scalar>(
    mask: Option<Mask<'_>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T>,
    flipxy: bool,
    method: AxbMethod,
    config: &Saxpy3Config,
) -> Result<Saxpy3Output<T>> {
    let mut clock = Stopwatch::start();
    let mut stats = Saxpy3Stats::default();

    if a.ncols != b.nrows {
        return Err(SpgemmError::DimensionMismatch(format!(
            "A is {:?} but B is {:?}",
            a.shape(),
            b.shape()
        )));
    }
    let (cvlen, cvdim) = (a.nrows, b.ncols);
    if let Some(m) = &mask {
        m.check_shape(cvlen, cvdim)?;
    }

    if b.nvec() == 0 {
        stats.nthreads = 1;
        stats.timings.setup = clock.lap();
        return Ok(Saxpy3Output {
            c: empty_product(b, cvlen),
            mask_applied: mask.is_some(),
            stats,
        });
    }

    let iso = iso_result(a, b, semiring, flipxy);
    stats.iso_result = iso.is_some();
    if let (Some(IsoResult::Full(value)), None) = (iso, &mask) {
        stats.iso_fast_path = true;
        stats.nthreads = 1;
        stats.timings.setup = clock.lap();
        log::debug!("saxpy3: full iso inputs, C is {cvlen}x{cvdim} of {value:?}");
        return Ok(Saxpy3Output {
            c: Matrix::full_iso(cvlen, cvdim, value),
            mask_applied: false,
            stats,
        });
    }
    let iso_value = iso.map(|r| match r {
        IsoResult::Pattern(v) | IsoResult::Full(v) => v,
    });
    stats.timings.setup = clock.lap();

    let shape = match &mask {
        None => MaskShape::Absent,
        Some(m) if m.is_dense() => MaskShape::Dense,
        Some(_) => MaskShape::Sparse,
    };
    let counted_mask = mask.as_ref().filter(|_| shape == MaskShape::Sparse);
    let mut flops = flopcount(counted_mask, a, b)?;
    stats.timings.flopcount = clock.lap();

    let decision = decide(
        shape,
        flops.total(),
        flops.mask_work,
        cvlen,
        cvdim,
        method,
        config,
    );
    if decision.recount {
        flops = flopcount(None, a, b)?;
    }
    if decision.add_dense_cost {
        flops.add_dense_mask(cvlen)?;
    }
    let mask_mode = match (decision.regime, mask) {
        (MaskRegime::Inline, Some(m)) => MaskMode::Inline(m),
        (MaskRegime::DenseInPlace | MaskRegime::DenseGustavson, Some(m)) => MaskMode::InPlace(m),
        _ => MaskMode::Off,
    };
    let mask_applied = !matches!(mask_mode, MaskMode::Off);
    stats.regime = decision.regime;
    stats.total_flops = flops.total();
    stats.mask_work = flops.mask_work;
    log::debug!(
        "saxpy3: {} flops, mask work {}, regime {:?}, method {:?}",
        stats.total_flops,
        stats.mask_work,
        decision.regime,
        decision.method
    );
    stats.timings.mask_policy = clock.lap();

    let tasks = partition(
        &flops,
        a,
        b,
        cvlen,
        decision.method,
        config,
        config.nthreads_max(),
    )?;
    let (fine_hash, fine_gus, coarse_hash, coarse_gus) = tasks.census();
    stats.nthreads = tasks.nthreads;
    stats.nfine = tasks.nfine;
    stats.ncoarse = tasks.ncoarse();
    stats.nfine_hash = fine_hash;
    stats.nfine_gustavson = fine_gus;
    stats.ncoarse_hash = coarse_hash;
    stats.ncoarse_gustavson = coarse_gus;
    stats.max_task_flops = tasks.tasks.iter().map(|t| t.flops).max().unwrap_or(0);
    log::debug!(
        "saxpy3: {} threads, fine {fine_hash} hash / {fine_gus} gustavson in {} teams, \
         coarse {coarse_hash} hash / {coarse_gus} gustavson, largest task {} flops",
        tasks.nthreads,
        tasks.teams.len(),
        stats.max_task_flops
    );
    stats.timings.tasks = clock.lap();

    // pattern-only runs fold with ANY, whose identity is zero
    let identity = if iso_value.is_some() {
        T::ZERO
    } else {
        semiring.add().identity()
    };
    let mut ws = allocate(&tasks, identity)?;
    stats.timings.workspace = clock.lap();

    let ctx = Context {
        a,
        b,
        mask: mask_mode,
    };
    let cnz = symbolic(&ctx, &tasks, &mut ws)?;
    let cp = cumsum(&cnz, "output column pointers")?;
    let cnz_total = i64_to_usize(cp[cnz.len()]);
    let mut ci = try_filled(cnz_total, 0i64, "output row indices")?;
    let mut cx = match iso_value {
        Some(_) => None,
        None => Some(try_filled(cnz_total, T::ZERO, "output values")?),
    };
    stats.timings.symbolic = clock.lap();

    let phase = NumericPhase {
        ctx: &ctx,
        tasks: &tasks,
        ws: &mut ws,
        cp: &cp,
        ci: &mut ci,
        cx: cx.as_deref_mut(),
    };
    let specialized = if iso_value.is_some() {
        run_specialized(MonoidOpcode::Any, MultiplyOpcode::Pair, phase)
    } else {
        match (semiring.add().opcode(), semiring.multiply().opcode()) {
            (Some(add), Some(mult)) => {
                run_specialized(add, if flipxy { mult.flipped() } else { mult }, phase)
            }
            _ => Err(phase),
        }
    };
    stats.generic = match specialized {
        Ok(done) => {
            done?;
            false
        }
        Err(phase) => {
            phase.run(&Generic::new(semiring.add(), semiring.multiply(), flipxy))?;
            true
        }
    };
    log::debug!(
        "saxpy3: {} numeric backend, {cnz_total} entries",
        if stats.generic { "generic" } else { "specialized" }
    );
    stats.timings.numeric = clock.lap();
    drop(ws);

    let values = match iso_value {
        Some(v) => Values::Iso(v),
        None => Values::Array(cx.unwrap_or_default()),
    };
    let layout = match &b.layout {
        Layout::Hypersparse { hyperlist, .. } => {
            let (hyperlist, indptr) = prune_empty_vectors(hyperlist, &cp)?;
            Layout::Hypersparse {
                hyperlist,
                indptr,
                indices: ci,
            }
        }
        _ => Layout::Sparse {
            indptr: cp,
            indices: ci,
        },
    };
    let c = Matrix {
        nrows: cvlen,
        ncols: cvdim,
        layout,
        values,
        jumbled: false,
    };
    stats.timings.finalize = clock.lap();

    Ok(Saxpy3Output {
        c,
        mask_applied,
        stats,
    })
}
