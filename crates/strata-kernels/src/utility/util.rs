//! Index conversions, fallible allocation, prefix sums and slicing helpers
//
// Shared by every phase of the saxpy3 engine. All allocation of
// problem-sized buffers goes through `try_filled` so that an allocation
// failure surfaces as `SpgemmError::OutOfMemory` instead of aborting.

use crate::error::{Result, SpgemmError};
use core::ops::Range;

/// Multiplicative hash constant (golden ratio, 64-bit).
const HASH_MUL: u64 = 0x9E37_79B9_7F4A_7C15;

/// Convert i64 to usize, asserting non-negativity.
#[inline]
#[must_use]
pub fn i64_to_usize(x: i64) -> usize {
    debug_assert!(x >= 0);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    {
        x as usize
    }
}

/// Convert usize to i64, asserting it fits.
#[inline]
#[must_use]
pub fn usize_to_i64(x: usize) -> i64 {
    debug_assert!(i64::try_from(x).is_ok());
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    {
        x as i64
    }
}

#[inline]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn as_f64(x: i64) -> f64 {
    x as f64
}

/// Allocate `len` copies of `value`, reporting failure instead of aborting.
pub fn try_filled<T: Clone>(len: usize, value: T, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| SpgemmError::OutOfMemory(what))?;
    v.resize(len, value);
    Ok(v)
}

/// Allocate `len` items produced by `f`, reporting failure instead of aborting.
pub fn try_filled_with<T>(
    len: usize,
    what: &'static str,
    mut f: impl FnMut() -> T,
) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| SpgemmError::OutOfMemory(what))?;
    v.resize_with(len, &mut f);
    Ok(v)
}

/// Exclusive prefix sum of `counts` into a vector one longer, checking overflow.
pub fn cumsum(counts: &[i64], what: &'static str) -> Result<Vec<i64>> {
    let mut out = try_filled(counts.len() + 1, 0i64, what)?;
    let mut acc = 0i64;
    for (dst, &c) in out[1..].iter_mut().zip(counts) {
        acc = acc.checked_add(c).ok_or(SpgemmError::Overflow(what))?;
        *dst = acc;
    }
    Ok(out)
}

/// Number of threads for `work` units: `clamp(work / chunk, 1, nthreads_max)`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn nthreads_for(work: f64, chunk: f64, nthreads_max: usize) -> usize {
    let chunk = if chunk > 1.0 { chunk } else { 1.0 };
    let n = (work / chunk).floor();
    if n < 1.0 {
        1
    } else if n >= nthreads_max as f64 {
        nthreads_max.max(1)
    } else {
        n as usize
    }
}

/// Partition `0..n` into `ntasks` contiguous ranges of roughly equal work,
/// where `cumsum` (length `n + 1`) is the running total of work. Returns
/// `ntasks + 1` boundaries; ranges may be empty.
#[must_use]
pub fn pslice(cumsum: &[i64], ntasks: usize) -> Vec<usize> {
    let n = cumsum.len().saturating_sub(1);
    let ntasks = ntasks.max(1);
    let total = cumsum.last().copied().unwrap_or(0);
    let mut slice = vec![0usize; ntasks + 1];
    slice[ntasks] = n;
    for t in 1..ntasks {
        let k = if total <= 0 {
            t * n / ntasks
        } else {
            let target = i128::from(total) * t as i128 / ntasks as i128;
            cumsum.partition_point(|&c| i128::from(c) < target)
        };
        slice[t] = k.clamp(slice[t - 1], n);
    }
    slice
}

/// Start slot for `row` in a table of `hsize` slots (`hsize` a power of two).
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hash_slot(row: usize, hsize: usize) -> usize {
    debug_assert!(hsize.is_power_of_two());
    ((row as u64).wrapping_mul(HASH_MUL) >> 17) as usize & (hsize - 1)
}

/// Split `data` into disjoint mutable pieces, one per range. Ranges must be
/// sorted, non-overlapping and within `data`.
pub fn split_ranges_mut<'a, T>(mut data: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut out = Vec::with_capacity(ranges.len());
    let mut offset = 0usize;
    for r in ranges {
        debug_assert!(r.start >= offset && r.end >= r.start);
        let rest = core::mem::take(&mut data);
        let (_, tail) = rest.split_at_mut(r.start - offset);
        let (piece, tail) = tail.split_at_mut(r.end - r.start);
        out.push(piece);
        data = tail;
        offset = r.end;
    }
    out
}
