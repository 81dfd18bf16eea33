//! Scalar value types stored in matrices and folded by semirings

use core::fmt::Debug;

/// Broad class of a scalar type, used to validate operators and rename
/// boolean monoids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    SignedInt,
    UnsignedInt,
    Float,
}

impl ScalarKind {
    #[inline]
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::SignedInt | Self::UnsignedInt)
    }
}

/// A value type the engine can multiply and accumulate.
///
/// `to_bits`/`from_bits` must round-trip losslessly; the engine stores
/// values of shared (fine-task) workspaces in `AtomicU64` slots and folds
/// them with compare-and-swap on the bit pattern.
pub trait Scalar: Copy + PartialEq + PartialOrd + Debug + Send + Sync + 'static {
    const ZERO: Self;
    const ONE: Self;
    /// Smallest value (negative infinity for floats).
    const MIN_VALUE: Self;
    /// Largest value (positive infinity for floats).
    const MAX_VALUE: Self;
    const KIND: ScalarKind;

    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;

    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
    fn div(self, other: Self) -> Self;
    fn min_of(self, other: Self) -> Self;
    fn max_of(self, other: Self) -> Self;

    #[inline]
    fn truth(self) -> bool {
        self != Self::ZERO
    }

    #[inline]
    fn from_bool(b: bool) -> Self {
        if b {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

macro_rules! impl_signed {
    ($t:ty, $u:ty) => {
        impl Scalar for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN_VALUE: Self = <$t>::MIN;
            const MAX_VALUE: Self = <$t>::MAX;
            const KIND: ScalarKind = ScalarKind::SignedInt;

            #[inline]
            #[allow(clippy::cast_sign_loss)]
            fn to_bits(self) -> u64 {
                u64::from(self as $u)
            }
            #[inline]
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            fn from_bits(bits: u64) -> Self {
                bits as $u as $t
            }
            #[inline]
            fn add(self, other: Self) -> Self {
                self.wrapping_add(other)
            }
            #[inline]
            fn sub(self, other: Self) -> Self {
                self.wrapping_sub(other)
            }
            #[inline]
            fn mul(self, other: Self) -> Self {
                self.wrapping_mul(other)
            }
            #[inline]
            fn div(self, other: Self) -> Self {
                if other == 0 {
                    match self {
                        0 => 0,
                        x if x > 0 => <$t>::MAX,
                        _ => <$t>::MIN,
                    }
                } else {
                    self.wrapping_div(other)
                }
            }
            #[inline]
            fn min_of(self, other: Self) -> Self {
                Ord::min(self, other)
            }
            #[inline]
            fn max_of(self, other: Self) -> Self {
                Ord::max(self, other)
            }
        }
    };
}

macro_rules! impl_unsigned {
    ($t:ty) => {
        impl Scalar for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MIN_VALUE: Self = 0;
            const MAX_VALUE: Self = <$t>::MAX;
            const KIND: ScalarKind = ScalarKind::UnsignedInt;

            #[inline]
            fn to_bits(self) -> u64 {
                u64::from(self)
            }
            #[inline]
            #[allow(clippy::cast_possible_truncation)]
            fn from_bits(bits: u64) -> Self {
                bits as $t
            }
            #[inline]
            fn add(self, other: Self) -> Self {
                self.wrapping_add(other)
            }
            #[inline]
            fn sub(self, other: Self) -> Self {
                self.wrapping_sub(other)
            }
            #[inline]
            fn mul(self, other: Self) -> Self {
                self.wrapping_mul(other)
            }
            #[inline]
            fn div(self, other: Self) -> Self {
                if other == 0 {
                    if self == 0 {
                        0
                    } else {
                        <$t>::MAX
                    }
                } else {
                    self / other
                }
            }
            #[inline]
            fn min_of(self, other: Self) -> Self {
                Ord::min(self, other)
            }
            #[inline]
            fn max_of(self, other: Self) -> Self {
                Ord::max(self, other)
            }
        }
    };
}

impl_signed!(i32, u32);
impl_signed!(i64, u64);
impl_unsigned!(u32);
impl_unsigned!(u64);

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const MIN_VALUE: Self = f32::NEG_INFINITY;
    const MAX_VALUE: Self = f32::INFINITY;
    const KIND: ScalarKind = ScalarKind::Float;

    #[inline]
    fn to_bits(self) -> u64 {
        u64::from(f32::to_bits(self))
    }
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
    #[inline]
    fn add(self, other: Self) -> Self {
        self + other
    }
    #[inline]
    fn sub(self, other: Self) -> Self {
        self - other
    }
    #[inline]
    fn mul(self, other: Self) -> Self {
        self * other
    }
    #[inline]
    fn div(self, other: Self) -> Self {
        self / other
    }
    #[inline]
    fn min_of(self, other: Self) -> Self {
        self.min(other)
    }
    #[inline]
    fn max_of(self, other: Self) -> Self {
        self.max(other)
    }
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const MIN_VALUE: Self = f64::NEG_INFINITY;
    const MAX_VALUE: Self = f64::INFINITY;
    const KIND: ScalarKind = ScalarKind::Float;

    #[inline]
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }
    #[inline]
    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
    #[inline]
    fn add(self, other: Self) -> Self {
        self + other
    }
    #[inline]
    fn sub(self, other: Self) -> Self {
        self - other
    }
    #[inline]
    fn mul(self, other: Self) -> Self {
        self * other
    }
    #[inline]
    fn div(self, other: Self) -> Self {
        self / other
    }
    #[inline]
    fn min_of(self, other: Self) -> Self {
        self.min(other)
    }
    #[inline]
    fn max_of(self, other: Self) -> Self {
        self.max(other)
    }
}

// Boolean arithmetic follows the usual renaming: + is OR, * is AND, - is XOR.
impl Scalar for bool {
    const ZERO: Self = false;
    const ONE: Self = true;
    const MIN_VALUE: Self = false;
    const MAX_VALUE: Self = true;
    const KIND: ScalarKind = ScalarKind::Bool;

    #[inline]
    fn to_bits(self) -> u64 {
        u64::from(self)
    }
    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits != 0
    }
    #[inline]
    fn add(self, other: Self) -> Self {
        self | other
    }
    #[inline]
    fn sub(self, other: Self) -> Self {
        self ^ other
    }
    #[inline]
    fn mul(self, other: Self) -> Self {
        self & other
    }
    #[inline]
    fn div(self, _other: Self) -> Self {
        self
    }
    #[inline]
    fn min_of(self, other: Self) -> Self {
        self & other
    }
    #[inline]
    fn max_of(self, other: Self) -> Self {
        self | other
    }
}
