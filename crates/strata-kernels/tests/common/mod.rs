#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet};
use strata_core::{Matrix, Scalar};
use strata_kernels::Mask;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `StdRng` seeded with `seed`.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random sparse matrix with about `percent`% of entries present and small
/// integer values in `-4..=4`.
pub fn random_sparse(nrows: usize, ncols: usize, percent: u64, seed: u64) -> Matrix<i64> {
    let mut rng = seeded(seed);
    let mut indptr = vec![0i64];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for _ in 0..ncols {
        for i in 0..nrows {
            if rng.gen_range(0..100) < percent {
                indices.push(i as i64);
                data.push(rng.gen_range(-4..=4i64));
            }
        }
        indptr.push(indices.len() as i64);
    }
    Matrix::sparse(nrows, ncols, indptr, indices, data, true).unwrap()
}

/// Random boolean mask; present entries hold random values.
pub fn random_mask(nrows: usize, ncols: usize, percent: u64, seed: u64) -> Matrix<bool> {
    let mut rng = seeded(seed.wrapping_add(17));
    let mut indptr = vec![0i64];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for _ in 0..ncols {
        for i in 0..nrows {
            if rng.gen_range(0..100) < percent {
                indices.push(i as i64);
                data.push(rng.gen_bool(0.75));
            }
        }
        indptr.push(indices.len() as i64);
    }
    Matrix::sparse(nrows, ncols, indptr, indices, data, true).unwrap()
}

/// Build a sparse matrix from `(row, col, value)` triples sorted by column then row.
pub fn from_triples<T: Scalar>(
    nrows: usize,
    ncols: usize,
    triples: &[(usize, usize, T)],
) -> Matrix<T> {
    let mut indptr = vec![0i64; ncols + 1];
    for &(_, j, _) in triples {
        indptr[j + 1] += 1;
    }
    for j in 0..ncols {
        indptr[j + 1] += indptr[j];
    }
    let indices = triples.iter().map(|&(i, _, _)| i as i64).collect();
    let data = triples.iter().map(|&(_, _, v)| v).collect();
    Matrix::sparse(nrows, ncols, indptr, indices, data, true).unwrap()
}

pub fn to_bitmap<T: Scalar>(m: &Matrix<T>) -> Matrix<T> {
    let len = m.nrows * m.ncols;
    let mut present = vec![false; len];
    let mut data = vec![T::ZERO; len];
    for (i, j, v) in m.entries() {
        present[j * m.nrows + i] = true;
        data[j * m.nrows + i] = v;
    }
    Matrix::bitmap(m.nrows, m.ncols, present, data).unwrap()
}

/// Full storage, with absent entries filled by zero.
pub fn to_full<T: Scalar>(m: &Matrix<T>) -> Matrix<T> {
    let mut data = vec![T::ZERO; m.nrows * m.ncols];
    for (i, j, v) in m.entries() {
        data[j * m.nrows + i] = v;
    }
    Matrix::full(m.nrows, m.ncols, data).unwrap()
}

/// Hypersparse storage listing only the non-empty columns.
pub fn to_hypersparse<T: Scalar>(m: &Matrix<T>) -> Matrix<T> {
    let mut hyperlist = Vec::new();
    let mut indptr = vec![0i64];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    let entries = m.entries();
    for j in 0..m.ncols {
        let before = indices.len();
        for &(i, _, v) in entries.iter().filter(|e| e.1 == j) {
            indices.push(i as i64);
            data.push(v);
        }
        if indices.len() > before {
            hyperlist.push(j as i64);
            indptr.push(indices.len() as i64);
        }
    }
    Matrix::hypersparse(m.nrows, m.ncols, hyperlist, indptr, indices, data, true).unwrap()
}

/// Straightforward product over `(add, mul)`, as sorted `(row, col, value)`.
pub fn reference<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    add: impl Fn(T, T) -> T,
    mul: impl Fn(T, T) -> T,
) -> Vec<(usize, usize, T)> {
    let mut a_cols: Vec<Vec<(usize, T)>> = vec![Vec::new(); a.ncols];
    for (i, k, v) in a.entries() {
        a_cols[k].push((i, v));
    }
    let mut acc: BTreeMap<(usize, usize), T> = BTreeMap::new();
    for (k, j, bv) in b.entries() {
        for &(i, av) in &a_cols[k] {
            let t = mul(av, bv);
            acc.entry((j, i))
                .and_modify(|x| *x = add(*x, t))
                .or_insert(t);
        }
    }
    acc.into_iter().map(|((j, i), v)| (i, j, v)).collect()
}

/// Keep the entries the mask allows.
pub fn masked<T: Copy>(entries: &[(usize, usize, T)], mask: &Mask<'_>) -> Vec<(usize, usize, T)> {
    let truthy: HashSet<(usize, usize)> = mask
        .matrix
        .entries()
        .into_iter()
        .filter(|&(_, _, v)| mask.structural || v)
        .map(|(i, j, _)| (i, j))
        .collect();
    entries
        .iter()
        .copied()
        .filter(|&(i, j, _)| truthy.contains(&(i, j)) != mask.complement)
        .collect()
}

/// Every column holds strictly increasing rows.
pub fn assert_canonical<T: Scalar>(c: &Matrix<T>) {
    assert!(!c.jumbled);
    for k in 0..c.nvec() {
        let rows: Vec<usize> = c.vector_range(k).map(|p| c.row_at(p)).collect();
        assert!(
            rows.windows(2).all(|w| w[0] < w[1]),
            "column {} is not sorted: {rows:?}",
            c.vector_index(k)
        );
    }
}

/// 4096 x 64 A with 8 entries per column, and B whose column 5 is full while
/// every other column holds one entry. Column 5 is costly enough to be split
/// across a fine-task team once `chunk` is small and several threads run.
pub fn skewed_pair() -> (Matrix<i64>, Matrix<i64>) {
    let mut rng = seeded(99);
    let (m, n) = (4096usize, 64usize);
    let mut triples = Vec::new();
    for k in 0..n {
        let mut rows: Vec<usize> = (0..8).map(|_| rng.gen_range(0..m)).collect();
        rows.sort_unstable();
        rows.dedup();
        for i in rows {
            triples.push((i, k, rng.gen_range(1..=7i64)));
        }
    }
    let a = from_triples(m, n, &triples);

    let mut triples = Vec::new();
    for j in 0..n {
        if j == 5 {
            for k in 0..n {
                triples.push((k, j, (k % 5) as i64 + 1));
            }
        } else {
            triples.push(((j * 7) % n, j, 2));
        }
    }
    let b = from_triples(n, n, &triples);
    (a, b)
}
