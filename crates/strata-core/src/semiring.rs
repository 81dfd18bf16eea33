//! Monoids, multiply operators and semiring descriptors

use crate::scalar::{Scalar, ScalarKind};
use std::fmt;
use std::sync::Arc;

/// A user-supplied binary function.
pub type UserFn<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// Built-in additive (combine) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonoidOpcode {
    Any,
    Plus,
    Times,
    Min,
    Max,
    Lor,
    Land,
    Lxor,
    /// Logical XNOR.
    Eq,
    Bor,
    Band,
    Bxor,
}

impl MonoidOpcode {
    /// Renaming applied when the monoid operates on booleans.
    #[inline]
    #[must_use]
    pub const fn boolean_rename(self) -> Self {
        match self {
            Self::Min | Self::Times | Self::Band => Self::Land,
            Self::Max | Self::Plus | Self::Bor => Self::Lor,
            Self::Bxor => Self::Lxor,
            other => other,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_bitwise(self) -> bool {
        matches!(self, Self::Bor | Self::Band | Self::Bxor)
    }

    /// Reducing any number of copies of one value returns that value.
    #[inline]
    #[must_use]
    pub const fn is_nice(self) -> bool {
        matches!(
            self,
            Self::Any | Self::Land | Self::Lor | Self::Band | Self::Bor | Self::Min | Self::Max
        )
    }

    #[inline]
    #[must_use]
    pub fn apply<T: Scalar>(self, x: T, y: T) -> T {
        match self {
            Self::Any => y,
            Self::Plus => x.add(y),
            Self::Times => x.mul(y),
            Self::Min => x.min_of(y),
            Self::Max => x.max_of(y),
            Self::Lor => T::from_bool(x.truth() || y.truth()),
            Self::Land => T::from_bool(x.truth() && y.truth()),
            Self::Lxor => T::from_bool(x.truth() != y.truth()),
            Self::Eq => T::from_bool(x.truth() == y.truth()),
            Self::Bor => T::from_bits(x.to_bits() | y.to_bits()),
            Self::Band => T::from_bits(x.to_bits() & y.to_bits()),
            Self::Bxor => T::from_bits(x.to_bits() ^ y.to_bits()),
        }
    }

    #[inline]
    #[must_use]
    pub fn identity<T: Scalar>(self) -> T {
        match self {
            Self::Any | Self::Plus | Self::Lor | Self::Lxor | Self::Bor | Self::Bxor => T::ZERO,
            Self::Times | Self::Land | Self::Eq => T::ONE,
            Self::Min => T::MAX_VALUE,
            Self::Max => T::MIN_VALUE,
            Self::Band => T::from_bits(u64::MAX),
        }
    }

    /// Value past which folding cannot change the result. `Any` has no
    /// terminal value; it stops after the first write instead.
    #[inline]
    #[must_use]
    pub fn terminal<T: Scalar>(self) -> Option<T> {
        match self {
            Self::Times if T::KIND != ScalarKind::Float => Some(T::ZERO),
            Self::Min => Some(T::MIN_VALUE),
            Self::Max => Some(T::MAX_VALUE),
            Self::Lor => Some(T::ONE),
            Self::Land | Self::Band => Some(T::ZERO),
            Self::Bor => Some(T::from_bits(u64::MAX)),
            _ => None,
        }
    }
}

/// Built-in multiplicative operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiplyOpcode {
    First,
    Second,
    /// Always one, ignoring both operands.
    Pair,
    Plus,
    Minus,
    Rminus,
    Times,
    Div,
    Rdiv,
    Min,
    Max,
    Lor,
    Land,
    Lxor,
    IsEq,
    IsNe,
    IsGt,
    IsLt,
    IsGe,
    IsLe,
    Bor,
    Band,
    Bxor,
}

impl MultiplyOpcode {
    /// The opcode computing `f(y, x)`.
    #[inline]
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
            Self::Minus => Self::Rminus,
            Self::Rminus => Self::Minus,
            Self::Div => Self::Rdiv,
            Self::Rdiv => Self::Div,
            Self::IsGt => Self::IsLt,
            Self::IsLt => Self::IsGt,
            Self::IsGe => Self::IsLe,
            Self::IsLe => Self::IsGe,
            other => other,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_bitwise(self) -> bool {
        matches!(self, Self::Bor | Self::Band | Self::Bxor)
    }

    #[inline]
    #[must_use]
    pub fn apply<T: Scalar>(self, x: T, y: T) -> T {
        match self {
            Self::First => x,
            Self::Second => y,
            Self::Pair => T::ONE,
            Self::Plus => x.add(y),
            Self::Minus => x.sub(y),
            Self::Rminus => y.sub(x),
            Self::Times => x.mul(y),
            Self::Div => x.div(y),
            Self::Rdiv => y.div(x),
            Self::Min => x.min_of(y),
            Self::Max => x.max_of(y),
            Self::Lor => T::from_bool(x.truth() || y.truth()),
            Self::Land => T::from_bool(x.truth() && y.truth()),
            Self::Lxor => T::from_bool(x.truth() != y.truth()),
            Self::IsEq => T::from_bool(x == y),
            Self::IsNe => T::from_bool(x != y),
            Self::IsGt => T::from_bool(x > y),
            Self::IsLt => T::from_bool(x < y),
            Self::IsGe => T::from_bool(x >= y),
            Self::IsLe => T::from_bool(x <= y),
            Self::Bor => T::from_bits(x.to_bits() | y.to_bits()),
            Self::Band => T::from_bits(x.to_bits() & y.to_bits()),
            Self::Bxor => T::from_bits(x.to_bits() ^ y.to_bits()),
        }
    }
}

/// Additive monoid of a semiring.
#[derive(Clone)]
pub enum Monoid<T> {
    Builtin(MonoidOpcode),
    User {
        op: UserFn<T>,
        identity: T,
        terminal: Option<T>,
    },
}

impl<T: Scalar> Monoid<T> {
    #[must_use]
    pub fn user(op: impl Fn(T, T) -> T + Send + Sync + 'static, identity: T) -> Self {
        Self::User {
            op: Arc::new(op),
            identity,
            terminal: None,
        }
    }

    #[must_use]
    pub fn with_terminal(self, terminal: T) -> Self {
        match self {
            Self::User { op, identity, .. } => Self::User {
                op,
                identity,
                terminal: Some(terminal),
            },
            builtin @ Self::Builtin(_) => builtin,
        }
    }

    #[inline]
    #[must_use]
    pub fn opcode(&self) -> Option<MonoidOpcode> {
        match self {
            Self::Builtin(op) => Some(*op),
            Self::User { .. } => None,
        }
    }

    #[must_use]
    pub fn identity(&self) -> T {
        match self {
            Self::Builtin(op) => op.identity(),
            Self::User { identity, .. } => *identity,
        }
    }

    #[must_use]
    pub fn terminal(&self) -> Option<T> {
        match self {
            Self::Builtin(op) => op.terminal(),
            Self::User { terminal, .. } => *terminal,
        }
    }

    #[must_use]
    pub fn apply(&self, x: T, y: T) -> T {
        match self {
            Self::Builtin(op) => op.apply(x, y),
            Self::User { op, .. } => op(x, y),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Monoid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(op) => write!(f, "Monoid::{op:?}"),
            Self::User {
                identity, terminal, ..
            } => write!(f, "Monoid::User(identity={identity:?}, terminal={terminal:?})"),
        }
    }
}

/// Multiplicative operator of a semiring.
#[derive(Clone)]
pub enum BinaryOp<T> {
    Builtin(MultiplyOpcode),
    User(UserFn<T>),
}

impl<T: Scalar> BinaryOp<T> {
    #[must_use]
    pub fn user(op: impl Fn(T, T) -> T + Send + Sync + 'static) -> Self {
        Self::User(Arc::new(op))
    }

    #[inline]
    #[must_use]
    pub fn opcode(&self) -> Option<MultiplyOpcode> {
        match self {
            Self::Builtin(op) => Some(*op),
            Self::User(_) => None,
        }
    }

    #[must_use]
    pub fn apply(&self, x: T, y: T) -> T {
        match self {
            Self::Builtin(op) => op.apply(x, y),
            Self::User(op) => op(x, y),
        }
    }
}

impl<T> fmt::Debug for BinaryOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(op) => write!(f, "BinaryOp::{op:?}"),
            Self::User(_) => f.write_str("BinaryOp::User"),
        }
    }
}

/// A combine monoid paired with a multiply operator.
#[derive(Debug, Clone)]
pub struct Semiring<T> {
    add: Monoid<T>,
    multiply: BinaryOp<T>,
}

impl<T: Scalar> Semiring<T> {
    /// Validate the operator pair for `T` and rename boolean monoids.
    pub fn new(add: Monoid<T>, multiply: BinaryOp<T>) -> Result<Self, String> {
        let float = T::KIND == ScalarKind::Float;
        let add = match add {
            Monoid::Builtin(op) if float && op.is_bitwise() => {
                return Err(format!("bitwise monoid {op:?} is not defined for floating point"));
            }
            Monoid::Builtin(op) if T::KIND == ScalarKind::Bool => {
                Monoid::Builtin(op.boolean_rename())
            }
            other => other,
        };
        if let BinaryOp::Builtin(op) = &multiply {
            if float && op.is_bitwise() {
                return Err(format!(
                    "bitwise multiply operator {op:?} is not defined for floating point"
                ));
            }
        }
        Ok(Self { add, multiply })
    }

    /// Shorthand for a semiring of two built-in opcodes.
    pub fn builtin(add: MonoidOpcode, multiply: MultiplyOpcode) -> Result<Self, String> {
        Self::new(Monoid::Builtin(add), BinaryOp::Builtin(multiply))
    }

    #[inline]
    #[must_use]
    pub const fn add(&self) -> &Monoid<T> {
        &self.add
    }

    #[inline]
    #[must_use]
    pub const fn multiply(&self) -> &BinaryOp<T> {
        &self.multiply
    }

    /// Both operators are built-in opcodes.
    #[inline]
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.add.opcode().is_some() && self.multiply.opcode().is_some()
    }

    /// True for PAIR combined with a monoid that makes it behave as ANY_PAIR.
    #[must_use]
    pub fn is_any_pair(&self) -> bool {
        matches!(
            (self.add.opcode(), self.multiply.opcode()),
            (
                Some(
                    MonoidOpcode::Any
                        | MonoidOpcode::Eq
                        | MonoidOpcode::Land
                        | MonoidOpcode::Band
                        | MonoidOpcode::Lor
                        | MonoidOpcode::Bor
                        | MonoidOpcode::Max
                        | MonoidOpcode::Min
                        | MonoidOpcode::Times
                ),
                Some(MultiplyOpcode::Pair)
            )
        )
    }
}
