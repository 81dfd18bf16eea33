//! Iso-valued results: detection and the O(log n) full-times-full shortcut

use strata_core::{Matrix, Monoid, MonoidOpcode, MultiplyOpcode, Scalar, Semiring};

/// How an iso result is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum IsoResult<T> {
    /// Every entry of C equals the value; the pattern still has to be computed.
    Pattern(T),
    /// A and B are full and iso: C is full with this value.
    Full(T),
}

/// `multiply(a, b)` honoring the operand flip.
fn product<T: Scalar>(semiring: &Semiring<T>, flipxy: bool, a: T, b: T) -> T {
    if flipxy {
        semiring.multiply().apply(b, a)
    } else {
        semiring.multiply().apply(a, b)
    }
}

/// Decide whether C = A*B is iso-valued, and if so, its value.
///
/// Only built-in monoids qualify. PAIR with a nice monoid (or EQ, TIMES)
/// gives 1. With a nice monoid, SECOND and an iso B give B's value, FIRST
/// and an iso A give A's value, and two iso inputs give `a * b`. Two full
/// iso inputs give the reduction of `n` copies of `a * b` under any monoid,
/// where `n` is the inner dimension.
pub(crate) fn iso_result<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T>,
    flipxy: bool,
) -> Option<IsoResult<T>> {
    let add = semiring.add().opcode()?;
    let mult = semiring
        .multiply()
        .opcode()
        .map(|op| if flipxy { op.flipped() } else { op });
    let nice = add.is_nice();
    let nice_with_pair = nice || matches!(add, MonoidOpcode::Eq | MonoidOpcode::Times);
    let a_iso = a.iso_value();
    let b_iso = b.iso_value();
    let n = a.ncols;
    let full = n > 0 && a.is_as_if_full() && b.is_as_if_full();

    let wrap = |c| {
        if full && a_iso.is_some() && b_iso.is_some() {
            IsoResult::Full(c)
        } else {
            IsoResult::Pattern(c)
        }
    };

    if nice_with_pair && mult == Some(MultiplyOpcode::Pair) {
        return Some(wrap(T::ONE));
    }
    if nice && mult == Some(MultiplyOpcode::Second) {
        if let Some(bv) = b_iso {
            return Some(wrap(bv));
        }
    }
    if nice && mult == Some(MultiplyOpcode::First) {
        if let Some(av) = a_iso {
            return Some(wrap(av));
        }
    }
    let (av, bv) = (a_iso?, b_iso?);
    let t = product(semiring, flipxy, av, bv);
    if nice {
        Some(wrap(t))
    } else if full {
        Some(IsoResult::Full(reduce_copies(semiring.add(), t, n)))
    } else {
        None
    }
}

/// Reduce `n >= 1` copies of `t` by repeated doubling.
pub(crate) fn reduce_copies<T: Scalar>(monoid: &Monoid<T>, t: T, mut n: usize) -> T {
    debug_assert!(n > 0);
    let mut acc: Option<T> = None;
    let mut power = t;
    while n > 0 {
        if n & 1 == 1 {
            acc = Some(match acc {
                None => power,
                Some(x) => monoid.apply(x, power),
            });
        }
        n >>= 1;
        if n > 0 {
            power = monoid.apply(power, power);
        }
    }
    acc.unwrap_or(t)
}
