mod common;

use common::{
    assert_canonical, from_triples, init_logging, random_sparse, reference, skewed_pair,
    to_bitmap, to_full, to_hypersparse,
};
use strata_core::{
    BinaryOp, Layout, Matrix, Monoid, MonoidOpcode, MultiplyOpcode, Semiring, Values,
};
use strata_kernels::{saxpy3, AxbMethod, Saxpy3Config, SpgemmError};

fn plus_times() -> Semiring<i64> {
    Semiring::builtin(MonoidOpcode::Plus, MultiplyOpcode::Times).unwrap()
}

fn product(a: &Matrix<i64>, b: &Matrix<i64>, method: AxbMethod, config: &Saxpy3Config) -> Matrix<i64> {
    let out = saxpy3(None, a, b, &plus_times(), false, method, config).unwrap();
    assert!(!out.mask_applied);
    assert_canonical(&out.c);
    out.c
}

#[test]
fn identity_times_b() {
    init_logging();
    let a = from_triples(3, 3, &[(0, 0, 1i64), (1, 1, 1), (2, 2, 1)]);
    let b = from_triples(3, 3, &[(0, 0, 1i64), (1, 1, 2), (0, 2, 3), (2, 2, 4)]);
    for method in [AxbMethod::Default, AxbMethod::Hash, AxbMethod::Gustavson] {
        let c = product(&a, &b, method, &Saxpy3Config::default());
        assert_eq!(c.shape(), (3, 3));
        assert_eq!(c.entries(), b.entries(), "method {method:?}");
        match &c.layout {
            Layout::Sparse { indptr, indices } => {
                assert_eq!(indptr, &vec![0, 1, 2, 4]);
                assert_eq!(indices, &vec![0, 1, 0, 2]);
            }
            other => panic!("expected sparse result, got {other:?}"),
        }
        assert_eq!(c.values, Values::Array(vec![1, 2, 3, 4]));
    }
}

#[test]
fn random_product_matches_reference() {
    init_logging();
    let a = random_sparse(40, 30, 15, 1);
    let b = random_sparse(30, 25, 20, 2);
    let expected = reference(&a, &b, |x, y| x + y, |x, y| x * y);
    for method in [AxbMethod::Default, AxbMethod::Hash, AxbMethod::Gustavson] {
        let c = product(&a, &b, method, &Saxpy3Config::default());
        assert_eq!(c.entries(), expected, "method {method:?}");
    }
}

#[test]
fn fine_task_teams_agree_with_coarse_tasks() {
    init_logging();
    let (a, b) = skewed_pair();
    let expected = reference(&a, &b, |x, y| x + y, |x, y| x * y);

    let serial = saxpy3(
        None,
        &a,
        &b,
        &plus_times(),
        false,
        AxbMethod::Default,
        &Saxpy3Config::default().with_nthreads(1),
    )
    .unwrap();
    assert_eq!(serial.stats.nfine, 0);
    assert_eq!(serial.c.entries(), expected);

    let config = Saxpy3Config::default().with_nthreads(4).with_chunk(1.0);
    let gus = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &config).unwrap();
    assert!(gus.stats.nfine > 1);
    assert!(gus.stats.nfine_gustavson > 0);
    assert!(gus.stats.ncoarse_hash > 0);
    assert_canonical(&gus.c);
    assert_eq!(gus.c.entries(), expected);

    let hash = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Hash, &config).unwrap();
    assert!(hash.stats.nfine_hash > 1);
    assert_canonical(&hash.c);
    assert_eq!(hash.c.entries(), expected);
}

#[test]
fn fine_teams_start_from_the_monoid_identity() {
    let (a, b) = skewed_pair();
    let config = Saxpy3Config::default().with_nthreads(4).with_chunk(1.0);
    let cases: [(MonoidOpcode, MultiplyOpcode, fn(i64, i64) -> i64, fn(i64, i64) -> i64); 2] = [
        (MonoidOpcode::Min, MultiplyOpcode::Plus, i64::min, |x, y| x + y),
        (MonoidOpcode::Max, MultiplyOpcode::Times, i64::max, |x, y| x * y),
    ];
    for (add, mul, add_fn, mul_fn) in cases {
        let semiring = Semiring::builtin(add, mul).unwrap();
        let expected = reference(&a, &b, add_fn, mul_fn);
        for method in [AxbMethod::Default, AxbMethod::Hash] {
            let out = saxpy3(None, &a, &b, &semiring, false, method, &config).unwrap();
            assert!(out.stats.nfine > 1);
            assert_eq!(out.c.entries(), expected, "{add:?} {mul:?} {method:?}");
        }
    }
}

#[test]
fn fine_teams_in_pattern_mode() {
    let (a, b) = skewed_pair();
    let any_pair = Semiring::builtin(MonoidOpcode::Any, MultiplyOpcode::Pair).unwrap();
    let config = Saxpy3Config::default().with_nthreads(4).with_chunk(1.0);
    let expected: Vec<(usize, usize, i64)> = reference(&a, &b, |x, y| x + y, |x, y| x * y)
        .into_iter()
        .map(|(i, j, _)| (i, j, 1))
        .collect();
    for method in [AxbMethod::Default, AxbMethod::Hash, AxbMethod::Gustavson] {
        let out = saxpy3(None, &a, &b, &any_pair, false, method, &config).unwrap();
        assert!(out.stats.nfine > 1);
        assert!(out.stats.iso_result);
        assert_eq!(out.c.values, Values::Iso(1));
        assert_canonical(&out.c);
        assert_eq!(out.c.entries(), expected, "method {method:?}");
    }
}

#[test]
fn thread_counts_give_identical_results() {
    let a = random_sparse(60, 50, 10, 7);
    let b = random_sparse(50, 40, 12, 8);
    let first = product(&a, &b, AxbMethod::Default, &Saxpy3Config::default().with_nthreads(1));
    for n in 2..=6 {
        let config = Saxpy3Config::default().with_nthreads(n).with_chunk(1.0);
        let c = product(&a, &b, AxbMethod::Default, &config);
        assert_eq!(c, first, "nthreads {n}");
    }
}

#[test]
fn single_column_b_with_many_threads() {
    let a = random_sparse(30, 20, 30, 3);
    let b = random_sparse(20, 1, 60, 4);
    let expected = reference(&a, &b, |x, y| x + y, |x, y| x * y);
    let config = Saxpy3Config::default().with_nthreads(4).with_chunk(1.0);
    let out = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &config).unwrap();
    assert_eq!(out.stats.nfine, out.stats.ntasks());
    assert_eq!(out.c.entries(), expected);
}

#[test]
fn all_input_layouts_agree() {
    let a = random_sparse(25, 20, 25, 11);
    let b = random_sparse(20, 15, 25, 12);
    let expected = reference(&a, &b, |x, y| x + y, |x, y| x * y);
    let variants = [
        (a.clone(), to_bitmap(&b)),
        (to_bitmap(&a), b.clone()),
        (to_hypersparse(&a), to_bitmap(&b)),
        (to_bitmap(&a), to_bitmap(&b)),
    ];
    for (va, vb) in &variants {
        let c = product(va, vb, AxbMethod::Default, &Saxpy3Config::default());
        assert_eq!(c.entries(), expected);
    }

    // full inputs keep their explicit zeros
    let (fa, fb) = (to_full(&a), to_full(&b));
    let expected = reference(&fa, &fb, |x, y| x + y, |x, y| x * y);
    let c = product(&fa, &fb, AxbMethod::Gustavson, &Saxpy3Config::default());
    assert_eq!(c.nnz(), 25 * 15);
    assert_eq!(c.entries(), expected);
}

#[test]
fn hypersparse_b_gives_pruned_hypersparse_c() {
    // A(:,2) is empty, so B(:,4) = {2} contributes nothing
    let a = from_triples(4, 3, &[(0, 0, 1i64), (3, 0, 2), (1, 1, 5)]);
    let b = Matrix::hypersparse(
        3,
        10,
        vec![1, 4, 7],
        vec![0, 2, 3, 4],
        vec![0, 1, 2, 1],
        vec![1i64, 1, 1, 3],
        true,
    )
    .unwrap();
    let c = product(&a, &b, AxbMethod::Default, &Saxpy3Config::default());
    match &c.layout {
        Layout::Hypersparse {
            hyperlist, indptr, ..
        } => {
            assert_eq!(hyperlist, &vec![1, 7]);
            assert_eq!(indptr, &vec![0, 3, 4]);
        }
        other => panic!("expected hypersparse result, got {other:?}"),
    }
    assert_eq!(c.entries(), vec![(0, 1, 1), (1, 1, 5), (3, 1, 2), (1, 7, 15)]);
}

#[test]
fn jumbled_inputs_give_sorted_output() {
    let a = Matrix::sparse(4, 2, vec![0, 3, 4], vec![3, 0, 2, 1], vec![1i64, 2, 3, 4], true).unwrap();
    assert!(a.jumbled);
    let b = Matrix::sparse(2, 1, vec![0, 2], vec![1, 0], vec![10i64, 1], true).unwrap();
    let c = product(&a, &b, AxbMethod::Hash, &Saxpy3Config::default());
    assert_eq!(c.entries(), vec![(0, 0, 2), (1, 0, 40), (2, 0, 3), (3, 0, 1)]);
}

#[test]
fn empty_operands() {
    let a = random_sparse(5, 4, 50, 1);
    let b = Matrix::<i64>::empty(4, 0);
    let out = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &Saxpy3Config::default()).unwrap();
    assert_eq!(out.c.shape(), (5, 0));
    assert_eq!(out.c.nnz(), 0);
    assert_eq!(out.stats.ntasks(), 0);

    let a = Matrix::<i64>::empty(5, 0);
    let b = Matrix::<i64>::empty(0, 3);
    let out = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &Saxpy3Config::default()).unwrap();
    assert_eq!(out.c.shape(), (5, 3));
    assert_eq!(out.c.nnz(), 0);
}

#[test]
fn dimension_mismatch_is_reported() {
    let a = random_sparse(3, 4, 50, 1);
    let b = random_sparse(5, 2, 50, 2);
    let err = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &Saxpy3Config::default())
        .unwrap_err();
    assert!(matches!(err, SpgemmError::DimensionMismatch(_)));
}

#[test]
fn flipped_multiply_swaps_operands() {
    let a = random_sparse(12, 10, 30, 21);
    let b = random_sparse(10, 9, 30, 22);
    let minus = Semiring::builtin(MonoidOpcode::Plus, MultiplyOpcode::Minus).unwrap();
    let rminus = Semiring::builtin(MonoidOpcode::Plus, MultiplyOpcode::Rminus).unwrap();
    let cfg = Saxpy3Config::default();
    let flipped = saxpy3(None, &a, &b, &minus, true, AxbMethod::Default, &cfg).unwrap();
    let direct = saxpy3(None, &a, &b, &rminus, false, AxbMethod::Default, &cfg).unwrap();
    assert_eq!(flipped.c, direct.c);
    assert_eq!(direct.c.entries(), reference(&a, &b, |x, y| x + y, |x, y| y - x));
}

#[test]
fn user_operators_use_the_generic_backend() {
    let a = random_sparse(30, 20, 20, 31);
    let b = random_sparse(20, 15, 20, 32);
    let cfg = Saxpy3Config::default().with_nthreads(3).with_chunk(1.0);
    let builtin = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &cfg).unwrap();
    assert!(!builtin.stats.generic);

    let user = Semiring::new(
        Monoid::user(|x: i64, y: i64| x + y, 0),
        BinaryOp::user(|x: i64, y: i64| x * y),
    )
    .unwrap();
    let generic = saxpy3(None, &a, &b, &user, false, AxbMethod::Default, &cfg).unwrap();
    assert!(generic.stats.generic);
    assert_eq!(generic.c, builtin.c);

    // built-in pair without a specialized kernel
    let isgt = Semiring::builtin(MonoidOpcode::Plus, MultiplyOpcode::IsGt).unwrap();
    let out = saxpy3(None, &a, &b, &isgt, false, AxbMethod::Default, &cfg).unwrap();
    assert!(out.stats.generic);
    assert_eq!(
        out.c.entries(),
        reference(&a, &b, |x, y| x + y, |x, y| i64::from(x > y))
    );
}

#[test]
fn user_monoid_terminal_value() {
    // saturating OR over small integers, terminal at 1
    let a = random_sparse(20, 20, 40, 41);
    let b = random_sparse(20, 20, 40, 42);
    let sat = Semiring::new(
        Monoid::user(|x: i64, y: i64| i64::from(x != 0 || y != 0), 0).with_terminal(1),
        BinaryOp::user(|x: i64, y: i64| i64::from(x != 0 && y != 0)),
    )
    .unwrap();
    let cfg = Saxpy3Config::default().with_nthreads(4).with_chunk(1.0);
    let out = saxpy3(None, &a, &b, &sat, false, AxbMethod::Default, &cfg).unwrap();
    let expected = reference(
        &a,
        &b,
        |x, y| i64::from(x != 0 || y != 0),
        |x, y| i64::from(x != 0 && y != 0),
    );
    assert_eq!(out.c.entries(), expected);
}

#[test]
fn boolean_lor_land_with_terminal() {
    let ai = random_sparse(30, 30, 20, 51);
    let bi = random_sparse(30, 30, 20, 52);
    let to_bool = |m: &Matrix<i64>| {
        let t: Vec<(usize, usize, bool)> = m.entries().into_iter().map(|(i, j, v)| (i, j, v > 0)).collect();
        from_triples(m.nrows, m.ncols, &t)
    };
    let (a, b) = (to_bool(&ai), to_bool(&bi));
    let lor_land = Semiring::builtin(MonoidOpcode::Lor, MultiplyOpcode::Land).unwrap();
    let cfg = Saxpy3Config::default().with_nthreads(2).with_chunk(1.0);
    for method in [AxbMethod::Hash, AxbMethod::Gustavson] {
        let out = saxpy3(None, &a, &b, &lor_land, false, method, &cfg).unwrap();
        assert!(!out.stats.generic);
        assert_eq!(out.c.entries(), reference(&a, &b, |x, y| x || y, |x, y| x && y));
    }

    // PLUS on booleans is renamed to LOR
    let plus_times = Semiring::builtin(MonoidOpcode::Plus, MultiplyOpcode::Times).unwrap();
    assert_eq!(plus_times.add().opcode(), Some(MonoidOpcode::Lor));
    let out = saxpy3(None, &a, &b, &plus_times, false, AxbMethod::Default, &cfg).unwrap();
    assert_eq!(out.c.entries(), reference(&a, &b, |x, y| x || y, |x, y| x && y));
}

#[test]
fn min_plus_shortest_paths_step() {
    let a = random_sparse(25, 25, 20, 61);
    let b = random_sparse(25, 25, 20, 62);
    let min_plus = Semiring::builtin(MonoidOpcode::Min, MultiplyOpcode::Plus).unwrap();
    let run = |method| {
        saxpy3(None, &a, &b, &min_plus, false, method, &Saxpy3Config::default())
            .unwrap()
            .c
    };
    let c1 = run(AxbMethod::Hash);
    let c2 = run(AxbMethod::Gustavson);
    assert_eq!(c1, c2);
    assert_eq!(c1.entries(), reference(&a, &b, i64::min, |x, y| x + y));
}

#[test]
fn any_pair_gives_iso_structure() {
    let a = random_sparse(20, 15, 25, 71);
    let b = random_sparse(15, 10, 25, 72);
    let any_pair = Semiring::builtin(MonoidOpcode::Any, MultiplyOpcode::Pair).unwrap();
    let cfg = Saxpy3Config::default().with_nthreads(3).with_chunk(1.0);
    let out = saxpy3(None, &a, &b, &any_pair, false, AxbMethod::Default, &cfg).unwrap();
    assert!(out.stats.iso_result);
    assert!(!out.stats.iso_fast_path);
    assert_eq!(out.c.values, Values::Iso(1));
    let pattern: Vec<(usize, usize)> = out.c.entries().into_iter().map(|(i, j, _)| (i, j)).collect();
    let expected: Vec<(usize, usize)> = reference(&a, &b, |x, _| x, |_, _| 1)
        .into_iter()
        .map(|(i, j, _)| (i, j))
        .collect();
    assert_eq!(pattern, expected);
}

#[test]
fn any_monoid_keeps_the_structure() {
    let a = random_sparse(20, 15, 25, 81);
    let b = random_sparse(15, 10, 25, 82);
    let any_times = Semiring::builtin(MonoidOpcode::Any, MultiplyOpcode::Times).unwrap();
    let cfg = Saxpy3Config::default().with_nthreads(3).with_chunk(1.0);
    let out = saxpy3(None, &a, &b, &any_times, false, AxbMethod::Default, &cfg).unwrap();
    let expected = reference(&a, &b, |x, _| x, |x, y| x * y);
    let got = out.c.entries();
    assert_eq!(got.len(), expected.len());
    for ((i, j, _), (ei, ej, _)) in got.iter().zip(&expected) {
        assert_eq!((i, j), (ei, ej));
    }
}

#[test]
fn full_iso_fast_path_matches_full_computation() {
    init_logging();
    let (m, n, p) = (6usize, 5usize, 4usize);
    let a = Matrix::full_iso(m, n, 2i64);
    let b = Matrix::full_iso(n, p, 3i64);
    let out = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &Saxpy3Config::default()).unwrap();
    assert!(out.stats.iso_fast_path);
    assert_eq!(out.stats.ntasks(), 0);
    assert_eq!(out.c.layout, Layout::Full);
    assert_eq!(out.c.values, Values::Iso(30));

    let a_full = Matrix::full(m, n, vec![2i64; m * n]).unwrap();
    let b_full = Matrix::full(n, p, vec![3i64; n * p]).unwrap();
    let slow = product(&a_full, &b_full, AxbMethod::Default, &Saxpy3Config::default());
    assert_eq!(slow.entries(), out.c.entries());

    // LOR/PAIR over booleans
    let a = Matrix::full_iso(m, n, true);
    let b = Matrix::full_iso(n, p, true);
    let lor_pair = Semiring::builtin(MonoidOpcode::Lor, MultiplyOpcode::Pair).unwrap();
    let out = saxpy3(None, &a, &b, &lor_pair, false, AxbMethod::Default, &Saxpy3Config::default()).unwrap();
    assert!(out.stats.iso_fast_path);
    assert_eq!(out.c.values, Values::Iso(true));
}

#[test]
fn sparse_iso_inputs_compute_the_pattern_only() {
    let a0 = random_sparse(20, 15, 25, 91);
    let b0 = random_sparse(15, 12, 25, 92);
    let iso = |m: &Matrix<i64>, v: i64| match &m.layout {
        Layout::Sparse { indptr, indices } => {
            Matrix::sparse_iso(m.nrows, m.ncols, indptr.clone(), indices.clone(), v, true).unwrap()
        }
        _ => unreachable!(),
    };
    let (a, b) = (iso(&a0, 4), iso(&b0, 7));
    let min_first = Semiring::builtin(MonoidOpcode::Min, MultiplyOpcode::First).unwrap();
    let out = saxpy3(None, &a, &b, &min_first, false, AxbMethod::Default, &Saxpy3Config::default()).unwrap();
    assert!(out.stats.iso_result);
    assert_eq!(out.c.values, Values::Iso(4));
    assert_eq!(out.c.entries(), reference(&a, &b, i64::min, |x, _| x));
}

#[test]
fn dedicated_pool_size_is_respected() {
    let a = random_sparse(50, 50, 10, 101);
    let b = random_sparse(50, 50, 10, 102);
    let cfg = Saxpy3Config::default().with_nthreads(3).with_chunk(1.0);
    let out = saxpy3(None, &a, &b, &plus_times(), false, AxbMethod::Default, &cfg).unwrap();
    assert!(out.stats.nthreads <= 3);
    assert!(out.stats.timings.total() >= out.stats.timings.numeric);
}
