//! Hash table capacity selection and the Hash/Gustavson switch

use crate::config::AxbMethod;

/// Accumulator chosen for a task (or a fine-task team).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    /// Open-addressed table with linear probing; the capacity is a power of two.
    Hash(usize),
    /// Dense workspace with one slot per row of C.
    Gustavson(usize),
}

impl Accumulator {
    #[inline]
    #[must_use]
    pub const fn capacity(self) -> usize {
        match self {
            Self::Hash(h) | Self::Gustavson(h) => h,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_gustavson(self) -> bool {
        matches!(self, Self::Gustavson(_))
    }
}

/// Pick the accumulator for a task whose costliest column needs `flmax` flops.
///
/// The hash capacity is twice the smallest power of two strictly greater
/// than `flmax`, so the table is never more than half full. Gustavson's
/// method replaces it when the capacity reaches `cvlen / divisor` (default
/// method), when it reaches `cvlen` (forced Hash), or always (forced
/// Gustavson).
#[must_use]
pub fn hash_table_size(flmax: i64, cvlen: usize, method: AxbMethod, divisor: usize) -> Accumulator {
    let f = u64::try_from(flmax.max(1)).unwrap_or(1);
    let hsize = f
        .checked_add(1)
        .and_then(u64::checked_next_power_of_two)
        .and_then(|p| p.checked_mul(2))
        .and_then(|h| usize::try_from(h).ok());
    let Some(hsize) = hsize else {
        return Accumulator::Gustavson(cvlen);
    };
    let use_gustavson = match method {
        AxbMethod::Gustavson => true,
        AxbMethod::Hash => hsize >= cvlen,
        AxbMethod::Default => hsize >= cvlen / divisor.max(1),
    };
    if use_gustavson {
        Accumulator::Gustavson(cvlen)
    } else {
        Accumulator::Hash(hsize)
    }
}
