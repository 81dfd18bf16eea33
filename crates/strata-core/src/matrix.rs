//! Column-oriented matrix storage (sparse, hypersparse, bitmap, full)
//!
//! Every layout stores a collection of vectors (columns). `nrows` is the
//! vector length and `ncols` the number of vectors. Hypersparse storage keeps
//! only the non-empty columns, listed in `hyperlist`; bitmap and full storage
//! hold `nrows * ncols` slots addressed as `col * nrows + row`.

use crate::scalar::Scalar;
use core::ops::Range;

/// Storage of the sparsity pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Sparse {
        indptr: Vec<i64>,
        indices: Vec<i64>,
    },
    Hypersparse {
        hyperlist: Vec<i64>,
        indptr: Vec<i64>,
        indices: Vec<i64>,
    },
    Bitmap {
        present: Vec<bool>,
    },
    Full,
}

/// Stored values: one shared value, or one value per slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Values<T> {
    Iso(T),
    Array(Vec<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    pub nrows: usize,
    pub ncols: usize,
    pub layout: Layout,
    pub values: Values<T>,
    /// Row indices within some column are not in ascending order.
    pub jumbled: bool,
}

#[inline]
fn i64_to_usize(x: i64) -> usize {
    debug_assert!(x >= 0);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    {
        x as usize
    }
}

/// Validate compressed column storage; returns the jumbled flag.
fn check_compressed(
    nrows: usize,
    nvec: usize,
    indptr: &[i64],
    indices: &[i64],
    nvals: Option<usize>,
    check: bool,
) -> Result<bool, String> {
    let Some(expected_len) = nvec.checked_add(1) else {
        return Err("ncols overflow when adding 1".into());
    };
    if indptr.len() != expected_len {
        return Err("indptr length must be ncols + 1".into());
    }
    if let Some(n) = nvals {
        if indices.len() != n {
            return Err("indices and data must have equal length".into());
        }
    }
    let nnz = indices.len();
    if usize::try_from(indptr.last().copied().unwrap_or(0)).ok() != Some(nnz) {
        return Err("indptr last element must equal nnz".into());
    }
    if indptr.first().copied().unwrap_or(0) != 0 {
        return Err("indptr first element must be 0".into());
    }
    let mut jumbled = false;
    if check {
        for (prev_ptr, next_ptr) in indptr.iter().zip(indptr.iter().skip(1)) {
            if *prev_ptr < 0 || *next_ptr < 0 {
                return Err("indptr must be non-negative".into());
            }
            if prev_ptr > next_ptr {
                return Err("indptr must be non-decreasing".into());
            }
        }
        for (&start_i, &end_i) in indptr.iter().zip(indptr.iter().skip(1)) {
            let (start, end) = (i64_to_usize(start_i), i64_to_usize(end_i));
            let Some(col_indices) = indices.get(start..end) else {
                return Err("indptr elements must be within [0, nnz]".into());
            };
            let mut prev_row = -1_i64;
            for &i in col_indices {
                let out_of_bounds = usize::try_from(i).map_or(true, |row| row >= nrows);
                if i < 0 || out_of_bounds {
                    return Err("row index out of bounds".into());
                }
                if i == prev_row {
                    return Err("duplicate row index within a column".into());
                }
                if i < prev_row {
                    jumbled = true;
                }
                prev_row = i;
            }
        }
    }
    Ok(jumbled)
}

fn dense_len(nrows: usize, ncols: usize) -> Result<usize, String> {
    nrows
        .checked_mul(ncols)
        .ok_or_else(|| "nrows * ncols overflows".to_string())
}

impl<T: Scalar> Matrix<T> {
    /// Compressed sparse column storage.
    #[inline]
    pub fn sparse(
        nrows: usize,
        ncols: usize,
        indptr: Vec<i64>,
        indices: Vec<i64>,
        data: Vec<T>,
        check: bool,
    ) -> Result<Self, String> {
        let jumbled = check_compressed(nrows, ncols, &indptr, &indices, Some(data.len()), check)?;
        Ok(Self {
            nrows,
            ncols,
            layout: Layout::Sparse { indptr, indices },
            values: Values::Array(data),
            jumbled,
        })
    }

    /// Sparse storage where every entry holds `value`.
    pub fn sparse_iso(
        nrows: usize,
        ncols: usize,
        indptr: Vec<i64>,
        indices: Vec<i64>,
        value: T,
        check: bool,
    ) -> Result<Self, String> {
        let jumbled = check_compressed(nrows, ncols, &indptr, &indices, None, check)?;
        Ok(Self {
            nrows,
            ncols,
            layout: Layout::Sparse { indptr, indices },
            values: Values::Iso(value),
            jumbled,
        })
    }

    /// Hypersparse storage: only the columns in `hyperlist` are stored.
    pub fn hypersparse(
        nrows: usize,
        ncols: usize,
        hyperlist: Vec<i64>,
        indptr: Vec<i64>,
        indices: Vec<i64>,
        data: Vec<T>,
        check: bool,
    ) -> Result<Self, String> {
        if hyperlist.len() > ncols {
            return Err("hyperlist longer than ncols".into());
        }
        let mut prev = -1_i64;
        for &j in &hyperlist {
            if j <= prev || usize::try_from(j).map_or(true, |jj| jj >= ncols) {
                return Err("hyperlist must be strictly increasing and within [0, ncols)".into());
            }
            prev = j;
        }
        let jumbled =
            check_compressed(nrows, hyperlist.len(), &indptr, &indices, Some(data.len()), check)?;
        Ok(Self {
            nrows,
            ncols,
            layout: Layout::Hypersparse {
                hyperlist,
                indptr,
                indices,
            },
            values: Values::Array(data),
            jumbled,
        })
    }

    /// Bitmap storage; `present` and `data` are column-major, `nrows * ncols` long.
    pub fn bitmap(
        nrows: usize,
        ncols: usize,
        present: Vec<bool>,
        data: Vec<T>,
    ) -> Result<Self, String> {
        let len = dense_len(nrows, ncols)?;
        if present.len() != len || data.len() != len {
            return Err("bitmap and data must have nrows * ncols entries".into());
        }
        Ok(Self {
            nrows,
            ncols,
            layout: Layout::Bitmap { present },
            values: Values::Array(data),
            jumbled: false,
        })
    }

    /// Full storage; `data` is column-major, `nrows * ncols` long.
    pub fn full(nrows: usize, ncols: usize, data: Vec<T>) -> Result<Self, String> {
        if data.len() != dense_len(nrows, ncols)? {
            return Err("data must have nrows * ncols entries".into());
        }
        Ok(Self {
            nrows,
            ncols,
            layout: Layout::Full,
            values: Values::Array(data),
            jumbled: false,
        })
    }

    /// Full storage with every entry equal to `value`.
    #[must_use]
    pub const fn full_iso(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            nrows,
            ncols,
            layout: Layout::Full,
            values: Values::Iso(value),
            jumbled: false,
        }
    }

    /// Matrix with no entries.
    #[must_use]
    pub fn empty(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            layout: Layout::Sparse {
                indptr: vec![0; ncols + 1],
                indices: Vec::new(),
            },
            values: Values::Array(Vec::new()),
            jumbled: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    #[must_use]
    pub const fn is_hypersparse(&self) -> bool {
        matches!(self.layout, Layout::Hypersparse { .. })
    }

    #[inline]
    #[must_use]
    pub const fn is_bitmap(&self) -> bool {
        matches!(self.layout, Layout::Bitmap { .. })
    }

    /// Compressed (sparse or hypersparse) storage with explicit row indices.
    #[inline]
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        matches!(self.layout, Layout::Sparse { .. } | Layout::Hypersparse { .. })
    }

    /// Number of stored vectors.
    #[inline]
    #[must_use]
    pub fn nvec(&self) -> usize {
        match &self.layout {
            Layout::Hypersparse { hyperlist, .. } => hyperlist.len(),
            _ => self.ncols,
        }
    }

    /// Column index of the `k`th stored vector.
    #[inline]
    #[must_use]
    pub fn vector_index(&self, k: usize) -> usize {
        match &self.layout {
            Layout::Hypersparse { hyperlist, .. } => i64_to_usize(hyperlist[k]),
            _ => k,
        }
    }

    /// Slot positions of the `k`th stored vector.
    #[inline]
    #[must_use]
    pub fn vector_range(&self, k: usize) -> Range<usize> {
        match &self.layout {
            Layout::Sparse { indptr, .. } | Layout::Hypersparse { indptr, .. } => {
                i64_to_usize(indptr[k])..i64_to_usize(indptr[k + 1])
            }
            Layout::Bitmap { .. } | Layout::Full => k * self.nrows..(k + 1) * self.nrows,
        }
    }

    /// Slot positions of column `j`, empty if the column is not stored.
    #[inline]
    #[must_use]
    pub fn lookup(&self, j: usize) -> Range<usize> {
        match &self.layout {
            Layout::Hypersparse { hyperlist, .. } => {
                let Ok(target) = i64::try_from(j) else {
                    return 0..0;
                };
                match hyperlist.binary_search(&target) {
                    Ok(k) => self.vector_range(k),
                    Err(_) => 0..0,
                }
            }
            _ => self.vector_range(j),
        }
    }

    /// Row index stored at slot `p`.
    #[inline]
    #[must_use]
    pub fn row_at(&self, p: usize) -> usize {
        match &self.layout {
            Layout::Sparse { indices, .. } | Layout::Hypersparse { indices, .. } => {
                i64_to_usize(indices[p])
            }
            Layout::Bitmap { .. } | Layout::Full => p % self.nrows,
        }
    }

    /// Slot `p` holds an entry (only bitmap storage has empty slots).
    #[inline]
    #[must_use]
    pub fn is_present(&self, p: usize) -> bool {
        match &self.layout {
            Layout::Bitmap { present } => present[p],
            _ => true,
        }
    }

    #[inline]
    #[must_use]
    pub fn value_at(&self, p: usize) -> T {
        match &self.values {
            Values::Iso(v) => *v,
            Values::Array(data) => data[p],
        }
    }

    /// Number of entries in the `k`th stored vector.
    #[must_use]
    pub fn vector_nnz(&self, k: usize) -> usize {
        let range = self.vector_range(k);
        match &self.layout {
            Layout::Bitmap { present } => present[range].iter().filter(|&&b| b).count(),
            _ => range.len(),
        }
    }

    #[must_use]
    pub fn nnz(&self) -> usize {
        match &self.layout {
            Layout::Sparse { indices, .. } | Layout::Hypersparse { indices, .. } => indices.len(),
            Layout::Bitmap { present } => present.iter().filter(|&&b| b).count(),
            Layout::Full => self.nrows * self.ncols,
        }
    }

    /// Every entry is present and `M(i,j)` lives at slot `vector_range(j).start + i`.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        let Some(total) = self.nrows.checked_mul(self.ncols) else {
            return false;
        };
        match &self.layout {
            Layout::Full => true,
            Layout::Bitmap { present } => present.iter().all(|&b| b),
            Layout::Sparse { .. } | Layout::Hypersparse { .. } => {
                !self.jumbled && self.nvec() == self.ncols && self.nnz() == total
            }
        }
    }

    /// Full, or compressed with every entry present.
    #[must_use]
    pub fn is_as_if_full(&self) -> bool {
        match &self.layout {
            Layout::Full => true,
            Layout::Bitmap { .. } => false,
            Layout::Sparse { .. } | Layout::Hypersparse { .. } => self
                .nrows
                .checked_mul(self.ncols)
                .is_some_and(|total| self.nnz() == total),
        }
    }

    /// All entries are known to share one value.
    #[must_use]
    pub fn is_iso_valued(&self) -> bool {
        matches!(self.values, Values::Iso(_)) || (self.nnz() == 1 && !self.is_bitmap())
    }

    /// The shared value of an iso-valued matrix.
    #[must_use]
    pub fn iso_value(&self) -> Option<T> {
        match &self.values {
            Values::Iso(v) => Some(*v),
            Values::Array(data) if self.is_iso_valued() => data.first().copied(),
            Values::Array(_) => None,
        }
    }

    /// All entries as `(row, col, value)`, sorted by column then row.
    #[must_use]
    pub fn entries(&self) -> Vec<(usize, usize, T)> {
        let mut out = Vec::with_capacity(self.nnz());
        for k in 0..self.nvec() {
            let j = self.vector_index(k);
            let start = out.len();
            for p in self.vector_range(k) {
                if self.is_present(p) {
                    out.push((self.row_at(p), j, self.value_at(p)));
                }
            }
            if self.jumbled {
                out[start..].sort_unstable_by_key(|&(i, _, _)| i);
            }
        }
        out
    }
}
