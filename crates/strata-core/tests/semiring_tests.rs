use strata_core::{BinaryOp, Monoid, MonoidOpcode, MultiplyOpcode, Semiring};

#[test]
fn boolean_monoids_are_renamed() {
    let s = Semiring::<bool>::builtin(MonoidOpcode::Plus, MultiplyOpcode::Times).unwrap();
    assert_eq!(s.add().opcode(), Some(MonoidOpcode::Lor));
    let s = Semiring::<bool>::builtin(MonoidOpcode::Min, MultiplyOpcode::Pair).unwrap();
    assert_eq!(s.add().opcode(), Some(MonoidOpcode::Land));
    assert!(s.is_any_pair());
    let s = Semiring::<i64>::builtin(MonoidOpcode::Plus, MultiplyOpcode::Times).unwrap();
    assert_eq!(s.add().opcode(), Some(MonoidOpcode::Plus));
    assert!(!s.is_any_pair());
}

#[test]
fn bitwise_rejected_for_floats() {
    let err = Semiring::<f64>::builtin(MonoidOpcode::Bor, MultiplyOpcode::Times).unwrap_err();
    assert!(err.contains("floating point"));
    let err = Semiring::<f32>::builtin(MonoidOpcode::Plus, MultiplyOpcode::Bxor).unwrap_err();
    assert!(err.contains("floating point"));
    assert!(Semiring::<u32>::builtin(MonoidOpcode::Bor, MultiplyOpcode::Band).is_ok());
}

#[test]
fn identities_and_terminals() {
    assert_eq!(MonoidOpcode::Plus.identity::<i64>(), 0);
    assert_eq!(MonoidOpcode::Min.identity::<f64>(), f64::INFINITY);
    assert_eq!(MonoidOpcode::Max.identity::<i32>(), i32::MIN);
    assert_eq!(MonoidOpcode::Band.identity::<u32>(), u32::MAX);
    assert_eq!(MonoidOpcode::Times.terminal::<i64>(), Some(0));
    assert_eq!(MonoidOpcode::Times.terminal::<f64>(), None);
    assert_eq!(MonoidOpcode::Lor.terminal::<bool>(), Some(true));
    assert_eq!(MonoidOpcode::Plus.terminal::<u64>(), None);
}

#[test]
fn flipped_multiply_swaps_operands() {
    for op in [
        MultiplyOpcode::First,
        MultiplyOpcode::Minus,
        MultiplyOpcode::Div,
        MultiplyOpcode::IsGt,
        MultiplyOpcode::IsLe,
        MultiplyOpcode::Times,
    ] {
        assert_eq!(op.flipped().apply(7i64, 3), op.apply(3i64, 7));
    }
}

#[test]
fn user_operators() {
    let add = Monoid::user(|x: i64, y: i64| x.max(y), i64::MIN).with_terminal(100);
    let mul = BinaryOp::user(|x: i64, y: i64| x - 2 * y);
    let s = Semiring::new(add, mul).unwrap();
    assert!(!s.is_builtin());
    assert_eq!(s.add().identity(), i64::MIN);
    assert_eq!(s.add().terminal(), Some(100));
    assert_eq!(s.multiply().apply(10, 3), 4);
    assert_eq!(s.add().apply(4, 9), 9);
    assert!(format!("{s:?}").contains("User"));
}
