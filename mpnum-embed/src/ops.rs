// mpnum-embed - Operators under the current context
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Module-level operator functions.
//!
//! Each function runs the core dispatcher against this thread's current
//! context and returns the bare value. Use [`mpnum_core::apply`] directly
//! when the raised flags of a single call are needed.

use mpnum_core::{
    BinaryOp, CompareOp, ContextOverride, Number, Operand, Result, UnaryOp, apply, apply_divmod,
    apply_unary,
};

use crate::current::with_context;

/// Apply `op` under the current context.
pub fn binary<'a>(
    op: BinaryOp,
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
) -> Result<Number> {
    let (x, y) = (x.into(), y.into());
    with_context(|ctx| apply(op, x, y, ctx, None)).map(Number::from)
}

/// Apply `op` under the current context with a one-shot override.
pub fn binary_with<'a>(
    op: BinaryOp,
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
    overrides: &ContextOverride,
) -> Result<Number> {
    let (x, y) = (x.into(), y.into());
    with_context(|ctx| apply(op, x, y, ctx, Some(overrides))).map(Number::from)
}

/// Apply a unary `op` under the current context.
pub fn unary<'a>(op: UnaryOp, x: impl Into<Operand<'a>>) -> Result<Number> {
    let x = x.into();
    with_context(|ctx| apply_unary(op, x, ctx, None)).map(Number::from)
}

macro_rules! binary_fns {
    ($($(#[$doc:meta])* $name:ident => $op:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<'a>(x: impl Into<Operand<'a>>, y: impl Into<Operand<'a>>) -> Result<Number> {
                binary(BinaryOp::$op, x, y)
            }
        )*
    };
}

binary_fns! {
    add => Add,
    sub => Sub,
    mul => Mul,
    /// True division; Integer / Integer is a Rational
    div => Div,
    floordiv => FloorDiv,
    /// Remainder with the sign of the divisor
    modulo => Mod,
    pow => Pow,
}

macro_rules! unary_fns {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name<'a>(x: impl Into<Operand<'a>>) -> Result<Number> {
                unary(UnaryOp::$op, x)
            }
        )*
    };
}

unary_fns! {
    neg => Neg,
    pos => Pos,
    abs => Abs,
    sqrt => Sqrt,
}

/// Floor quotient and remainder.
pub fn divmod<'a>(x: impl Into<Operand<'a>>, y: impl Into<Operand<'a>>) -> Result<(Number, Number)> {
    let (x, y) = (x.into(), y.into());
    let (q, r) = with_context(|ctx| apply_divmod(x, y, ctx, None))?;
    Ok((q.into_value(), r.into_value()))
}

/// `x op y`; comparisons do not touch the context.
pub fn cmp<'a>(op: CompareOp, x: impl Into<Operand<'a>>, y: impl Into<Operand<'a>>) -> Result<bool> {
    mpnum_core::compare(op, x, y)
}
