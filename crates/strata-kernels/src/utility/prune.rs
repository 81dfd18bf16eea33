//! Prune empty vectors from a hypersparse result

use super::util::try_filled;
use crate::error::Result;
use rayon::prelude::*;

/// Keep only the vectors of `hyperlist` that hold at least one entry.
///
/// `indptr` has one more element than `hyperlist`. Returns the pruned
/// hyperlist and its column pointers; the row indices and values are
/// untouched since empty vectors own no slots.
pub(crate) fn prune_empty_vectors(hyperlist: &[i64], indptr: &[i64]) -> Result<(Vec<i64>, Vec<i64>)> {
    debug_assert_eq!(indptr.len(), hyperlist.len() + 1);
    let kept = indptr
        .par_windows(2)
        .filter(|w| w[1] > w[0])
        .count();
    if kept == hyperlist.len() {
        return Ok((hyperlist.to_vec(), indptr.to_vec()));
    }

    let mut pruned_list = try_filled(kept, 0i64, "pruned hyperlist")?;
    let mut pruned_ptr = try_filled(kept + 1, 0i64, "pruned indptr")?;
    let mut dst = 0usize;
    for (&j, w) in hyperlist.iter().zip(indptr.windows(2)) {
        if w[1] > w[0] {
            pruned_list[dst] = j;
            pruned_ptr[dst + 1] = w[1];
            dst += 1;
        }
    }
    Ok((pruned_list, pruned_ptr))
}
