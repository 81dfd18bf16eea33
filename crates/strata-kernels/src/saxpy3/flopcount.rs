//! Per-column flop estimates for C = A*B, optionally including mask cost

use crate::error::{Result, SpgemmError};
use crate::mask::Mask;
use crate::utility::util::{cumsum, try_filled, usize_to_i64};
use rayon::prelude::*;
use strata_core::{Matrix, Scalar};

/// Prefix-summed flop counts over the vectors of B.
#[derive(Debug, Clone)]
pub(crate) struct FlopCount {
    /// `bflops[kk+1] - bflops[kk]` is the estimated work for the `kk`th vector of B.
    pub bflops: Vec<i64>,
    /// Entries of the mask scanned across all columns (already inside `bflops`).
    pub mask_work: i64,
}

impl FlopCount {
    #[inline]
    pub fn total(&self) -> i64 {
        self.bflops.last().copied().unwrap_or(0)
    }

    #[inline]
    pub fn vector(&self, kk: usize) -> i64 {
        self.bflops[kk + 1] - self.bflops[kk]
    }

    /// Add a dense mask scan of `cvlen` rows to every column.
    pub fn add_dense_mask(&mut self, cvlen: usize) -> Result<()> {
        let cvlen = i64::try_from(cvlen).map_err(|_| SpgemmError::Overflow("dense mask work"))?;
        let mut extra = 0i64;
        for f in &mut self.bflops[1..] {
            extra = extra
                .checked_add(cvlen)
                .ok_or(SpgemmError::Overflow("dense mask work"))?;
            *f = f
                .checked_add(extra)
                .ok_or(SpgemmError::Overflow("dense mask work"))?;
        }
        self.mask_work = extra;
        Ok(())
    }
}

/// Estimate the work of each column of A*B.
///
/// Column `j` costs the sum of `nnz(A(:,k))` over the entries `B(k,j)`. With
/// an inline mask, `nnz(M(:,j))` is added; a column whose mask column is
/// empty costs nothing unless the mask is complemented, and when neither A
/// nor M is jumbled an `A(:,k)` whose rows miss the rows of `M(:,j)` entirely
/// is left out. Dense masks are never passed here.
pub(crate) fn flopcount<T: Scalar>(
    mask: Option<&Mask<'_>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Result<FlopCount> {
    let bnvec = b.nvec();
    let mut flops = try_filled(bnvec, 0i64, "flop counts")?;
    let mut mwork = try_filled(bnvec, 0i64, "mask work")?;

    flops
        .par_iter_mut()
        .zip(mwork.par_iter_mut())
        .enumerate()
        .for_each(|(kk, (fl, mw))| match vector_flops(kk, mask, a, b) {
            Some((f, m)) => {
                *fl = f;
                *mw = m;
            }
            None => *fl = -1,
        });

    if flops.par_iter().any(|&f| f < 0) {
        return Err(SpgemmError::Overflow("flop count"));
    }
    let bflops = cumsum(&flops, "flop count")?;
    let mask_work = mwork
        .iter()
        .try_fold(0i64, |acc, &m| acc.checked_add(m))
        .ok_or(SpgemmError::Overflow("mask work"))?;
    Ok(FlopCount { bflops, mask_work })
}

fn vector_flops<T: Scalar>(
    kk: usize,
    mask: Option<&Mask<'_>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Option<(i64, i64)> {
    let j = b.vector_index(kk);
    let mut fl = 0i64;
    let mut mjnz = 0i64;
    let mut mrows = None;

    if let Some(m) = mask {
        let mr = m.matrix.lookup(j);
        mjnz = if m.matrix.is_bitmap() {
            usize_to_i64(mr.clone().filter(|&p| m.matrix.is_present(p)).count())
        } else {
            usize_to_i64(mr.len())
        };
        if !m.complement && mjnz == 0 {
            return Some((0, 0));
        }
        if !m.complement && m.matrix.is_compressed() && !m.matrix.jumbled {
            mrows = Some((m.matrix.row_at(mr.start), m.matrix.row_at(mr.end - 1)));
        }
        fl = mjnz;
    }

    let a_sorted = a.is_compressed() && !a.jumbled;
    for pb in b.vector_range(kk) {
        if !b.is_present(pb) {
            continue;
        }
        let ar = a.lookup(b.row_at(pb));
        if ar.is_empty() {
            continue;
        }
        if let (Some((mfirst, mlast)), true) = (mrows, a_sorted) {
            let afirst = a.row_at(ar.start);
            let alast = a.row_at(ar.end - 1);
            if alast < mfirst || afirst > mlast {
                continue;
            }
        }
        fl = fl.checked_add(usize_to_i64(ar.len()))?;
    }
    Some((fl, mjnz))
}
