//! Mask descriptor and the deferred mask application pass

use crate::error::{Result, SpgemmError};
use crate::utility::util::{cumsum, i64_to_usize, split_ranges_mut, try_filled, usize_to_i64};
use rayon::prelude::*;
use strata_core::{Layout, Matrix, Scalar, Values};

/// A boolean matrix restricting which entries of C may be written.
///
/// `M(i,j)` is true when the entry is present and, unless `structural`, its
/// value is true. With `complement` the test is negated.
#[derive(Debug, Clone, Copy)]
pub struct Mask<'a> {
    pub matrix: &'a Matrix<bool>,
    pub complement: bool,
    pub structural: bool,
}

impl<'a> Mask<'a> {
    #[must_use]
    pub const fn new(matrix: &'a Matrix<bool>) -> Self {
        Self {
            matrix,
            complement: false,
            structural: false,
        }
    }

    #[must_use]
    pub const fn complemented(mut self) -> Self {
        self.complement = !self.complement;
        self
    }

    #[must_use]
    pub const fn structural(mut self) -> Self {
        self.structural = true;
        self
    }

    /// The entry stored at slot `p` counts as true.
    #[inline]
    pub(crate) fn slot_true(&self, p: usize) -> bool {
        self.matrix.is_present(p) && (self.structural || self.matrix.value_at(p))
    }

    /// Every entry is present, so `M(i,j)` can be read in place.
    pub(crate) fn is_dense(&self) -> bool {
        self.matrix.is_dense()
    }

    /// `C(i,j)` may be written, for a dense mask read in place.
    #[inline]
    pub(crate) fn dense_allows(&self, i: usize, j: usize) -> bool {
        let p = self.matrix.lookup(j).start + i;
        self.slot_true(p) != self.complement
    }

    /// `M(i,j)` by searching column `j`.
    pub(crate) fn value(&self, i: usize, j: usize) -> bool {
        let range = self.matrix.lookup(j);
        if range.is_empty() {
            return false;
        }
        match &self.matrix.layout {
            Layout::Bitmap { .. } | Layout::Full => self.slot_true(range.start + i),
            Layout::Sparse { indices, .. } | Layout::Hypersparse { indices, .. } => {
                let Ok(target) = i64::try_from(i) else {
                    return false;
                };
                let col = &indices[range.clone()];
                let found = if self.matrix.jumbled {
                    col.iter().position(|&r| r == target)
                } else {
                    col.binary_search(&target).ok()
                };
                found.is_some_and(|off| self.slot_true(range.start + off))
            }
        }
    }

    #[inline]
    pub(crate) fn allows(&self, i: usize, j: usize) -> bool {
        self.value(i, j) != self.complement
    }

    pub(crate) fn check_shape(&self, nrows: usize, ncols: usize) -> Result<()> {
        if self.matrix.shape() == (nrows, ncols) {
            Ok(())
        } else {
            Err(SpgemmError::DimensionMismatch(format!(
                "mask is {:?} but the product is {:?}",
                self.matrix.shape(),
                (nrows, ncols)
            )))
        }
    }
}

/// Keep only the entries of `c` that `mask` allows.
///
/// Completes a product computed under the discard regime, where the engine
/// reports `mask_applied == false`. The result is sparse, or hypersparse
/// with the same vectors when `c` is hypersparse. Row order within each
/// column is preserved.
pub fn apply_mask<T: Scalar>(c: &Matrix<T>, mask: &Mask<'_>) -> Result<Matrix<T>> {
    mask.check_shape(c.nrows, c.ncols)?;
    let nvec = c.nvec();

    let mut counts = try_filled(nvec, 0i64, "mask counts")?;
    counts.par_iter_mut().enumerate().for_each(|(k, cnt)| {
        let j = c.vector_index(k);
        let kept = c
            .vector_range(k)
            .filter(|&p| c.is_present(p) && mask.allows(c.row_at(p), j))
            .count();
        *cnt = usize_to_i64(kept);
    });
    let indptr = cumsum(&counts, "mask indptr")?;
    let nnz = i64_to_usize(indptr[nvec]);

    let iso = match &c.values {
        Values::Iso(v) => Some(*v),
        Values::Array(_) => None,
    };
    let mut indices = try_filled(nnz, 0i64, "masked indices")?;
    let mut data = try_filled(if iso.is_some() { 0 } else { nnz }, T::ZERO, "masked values")?;

    let ranges: Vec<_> = indptr
        .windows(2)
        .map(|w| i64_to_usize(w[0])..i64_to_usize(w[1]))
        .collect();
    let index_parts = split_ranges_mut(&mut indices, &ranges);
    let data_parts: Vec<&mut [T]> = if iso.is_some() {
        (0..nvec).map(|_| <&mut [T]>::default()).collect()
    } else {
        split_ranges_mut(&mut data, &ranges)
    };
    index_parts
        .into_par_iter()
        .zip(data_parts.into_par_iter())
        .enumerate()
        .for_each(|(k, (ci, cx))| {
            let j = c.vector_index(k);
            let mut dst = 0usize;
            for p in c.vector_range(k) {
                if c.is_present(p) && mask.allows(c.row_at(p), j) {
                    ci[dst] = usize_to_i64(c.row_at(p));
                    if !cx.is_empty() {
                        cx[dst] = c.value_at(p);
                    }
                    dst += 1;
                }
            }
        });

    let values = match iso {
        Some(v) => Values::Iso(v),
        None => Values::Array(data),
    };
    let layout = match &c.layout {
        Layout::Hypersparse { hyperlist, .. } => Layout::Hypersparse {
            hyperlist: hyperlist.clone(),
            indptr,
            indices,
        },
        _ => Layout::Sparse { indptr, indices },
    };
    Ok(Matrix {
        nrows: c.nrows,
        ncols: c.ncols,
        layout,
        values,
        jumbled: c.jumbled,
    })
}
