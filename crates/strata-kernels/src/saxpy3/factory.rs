//! Numeric kernels: specialized built-in pairs and the generic fallback
//
// The numeric phase is written once, generic over `SaxpyKernel`. Built-in
// monoid/multiply pairs from a closed set get a zero-sized kernel whose
// operators are constants, so each pair compiles to its own inner loop. Any
// other pair (user-defined operators, or built-ins outside the set) runs
// through `Generic`, which calls the semiring's operators per entry. Both
// see exactly the same tasks and workspaces.

use core::marker::PhantomData;
use strata_core::{BinaryOp, Monoid, MonoidOpcode, MultiplyOpcode, Scalar};

pub(crate) trait SaxpyKernel<T: Scalar>: Sync {
    /// `a` comes from A and `b` from B; operand flipping is already resolved.
    fn multiply(&self, a: T, b: T) -> T;
    fn combine(&self, x: T, y: T) -> T;
    fn terminal(&self) -> Option<T>;
    /// ANY monoid: the first value written to a slot is final.
    fn is_any(&self) -> bool;
}

pub(crate) trait CombineOp: Copy + Send + Sync + 'static {
    const OPCODE: MonoidOpcode;
}

pub(crate) trait MultiplyOp: Copy + Send + Sync + 'static {
    const OPCODE: MultiplyOpcode;
}

macro_rules! opcode_markers {
    ($tr:ident, $op:ident, $($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub(crate) struct $name;
            impl super::$tr for $name {
                const OPCODE: strata_core::$op = strata_core::$op::$name;
            }
        )*
    };
}

pub(crate) mod add {
    opcode_markers!(CombineOp, MonoidOpcode, Any, Plus, Times, Min, Max, Lor, Land, Lxor);
}

pub(crate) mod mul {
    opcode_markers!(MultiplyOp, MultiplyOpcode, First, Second, Pair, Plus, Minus, Times, Min, Max, Land, Lor);
}

/// Kernel for one built-in pair, resolved at compile time.
pub(crate) struct Builtin<C, M>(PhantomData<(C, M)>);

impl<C, M> Builtin<C, M> {
    pub(crate) const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Scalar, C: CombineOp, M: MultiplyOp> SaxpyKernel<T> for Builtin<C, M> {
    #[inline(always)]
    fn multiply(&self, a: T, b: T) -> T {
        M::OPCODE.apply(a, b)
    }
    #[inline(always)]
    fn combine(&self, x: T, y: T) -> T {
        C::OPCODE.apply(x, y)
    }
    #[inline]
    fn terminal(&self) -> Option<T> {
        C::OPCODE.terminal()
    }
    #[inline]
    fn is_any(&self) -> bool {
        matches!(C::OPCODE, MonoidOpcode::Any)
    }
}

/// Type-erased kernel calling the semiring's operators on every entry.
pub(crate) struct Generic<'a, T> {
    add: &'a Monoid<T>,
    multiply: &'a BinaryOp<T>,
    flipxy: bool,
}

impl<'a, T> Generic<'a, T> {
    pub(crate) const fn new(add: &'a Monoid<T>, multiply: &'a BinaryOp<T>, flipxy: bool) -> Self {
        Self {
            add,
            multiply,
            flipxy,
        }
    }
}

impl<T: Scalar> SaxpyKernel<T> for Generic<'_, T> {
    fn multiply(&self, a: T, b: T) -> T {
        if self.flipxy {
            self.multiply.apply(b, a)
        } else {
            self.multiply.apply(a, b)
        }
    }
    fn combine(&self, x: T, y: T) -> T {
        self.add.apply(x, y)
    }
    fn terminal(&self) -> Option<T> {
        self.add.terminal()
    }
    fn is_any(&self) -> bool {
        self.add.opcode() == Some(MonoidOpcode::Any)
    }
}

/// A computation that can run with any kernel.
pub(crate) trait KernelRunner<T: Scalar> {
    type Output;
    fn run<K: SaxpyKernel<T>>(self, kernel: &K) -> Self::Output;
}

/// Run `runner` with the specialized kernel for `(add, mult)`. Hands the
/// runner back when the pair has no specialization.
pub(crate) fn run_specialized<T: Scalar, R: KernelRunner<T>>(
    add: MonoidOpcode,
    mult: MultiplyOpcode,
    runner: R,
) -> Result<R::Output, R> {
    macro_rules! with_multiply {
        ($c:ty) => {
            match mult {
                MultiplyOpcode::First => Ok(runner.run(&Builtin::<$c, mul::First>::new())),
                MultiplyOpcode::Second => Ok(runner.run(&Builtin::<$c, mul::Second>::new())),
                MultiplyOpcode::Pair => Ok(runner.run(&Builtin::<$c, mul::Pair>::new())),
                MultiplyOpcode::Plus => Ok(runner.run(&Builtin::<$c, mul::Plus>::new())),
                MultiplyOpcode::Minus => Ok(runner.run(&Builtin::<$c, mul::Minus>::new())),
                MultiplyOpcode::Times => Ok(runner.run(&Builtin::<$c, mul::Times>::new())),
                MultiplyOpcode::Min => Ok(runner.run(&Builtin::<$c, mul::Min>::new())),
                MultiplyOpcode::Max => Ok(runner.run(&Builtin::<$c, mul::Max>::new())),
                MultiplyOpcode::Land => Ok(runner.run(&Builtin::<$c, mul::Land>::new())),
                MultiplyOpcode::Lor => Ok(runner.run(&Builtin::<$c, mul::Lor>::new())),
                _ => Err(runner),
            }
        };
    }
    match add {
        MonoidOpcode::Any => with_multiply!(add::Any),
        MonoidOpcode::Plus => with_multiply!(add::Plus),
        MonoidOpcode::Times => with_multiply!(add::Times),
        MonoidOpcode::Min => with_multiply!(add::Min),
        MonoidOpcode::Max => with_multiply!(add::Max),
        MonoidOpcode::Lor => with_multiply!(add::Lor),
        MonoidOpcode::Land => with_multiply!(add::Land),
        MonoidOpcode::Lxor => with_multiply!(add::Lxor),
        _ => Err(runner),
    }
}
