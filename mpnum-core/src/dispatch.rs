// mpnum-core - Operator dispatch
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Operator entry points.
//!
//! Each call classifies its operands, picks the common tower level, coerces
//! both operands to it and runs the kernel there:
//!
//! - Integer and Rational operations are exact. They never read the
//!   context and never raise flags.
//! - Real and Complex operations round to the context precision with the
//!   context rounding mode and may raise sticky flags.
//!
//! Flags raised by a call are OR-ed into the context. If any of them is
//! trapped the call fails with [`Error::Trapped`] instead of returning a
//! value.

use std::cmp::Ordering;

use rug::float::{Round, Special};
use rug::ops::Pow;
use rug::{Complex, Float, Integer, Rational};
use tracing::trace;

use crate::classify::{Classified, Operand, classify, classify_pair};
use crate::coerce::{
    complex_operand, exact_float, non_dyadic, real_operand, to_integer, to_rational,
};
use crate::context::{Context, ContextOverride, Flags};
use crate::error::{Error, Result};
use crate::kernel::{round_complex, round_real};
use crate::number::{Number, TowerLevel};
use crate::outcome::Outcome;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division: Integer / Integer is a Rational
    Div,
    /// Division rounded toward negative infinity
    FloorDiv,
    /// Remainder with the sign of the divisor
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::FloorDiv => "floordiv",
            BinaryOp::Mod => "mod",
            BinaryOp::Pow => "pow",
        }
    }

    fn divides(self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    /// Identity on exact values; rounds Real and Complex to the context
    Pos,
    Abs,
    Sqrt,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Pos => "pos",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Apply a binary operator.
///
/// `overrides`, when given, applies to this call only; the context's
/// configuration is restored afterwards whether or not the call succeeds.
///
/// ```
/// use mpnum_core::{BinaryOp, Context, Number, apply};
///
/// let mut ctx = Context::new();
/// let six = Number::integer(6);
/// let third = Number::rational(1, 3).unwrap();
/// let out = apply(BinaryOp::Mul, &six, &third, &mut ctx, None).unwrap();
/// assert_eq!(out.value(), &Number::rational(2, 1).unwrap());
/// ```
pub fn apply<'a>(
    op: BinaryOp,
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
    ctx: &mut Context,
    overrides: Option<&ContextOverride>,
) -> Result<Outcome> {
    let (x, y) = (x.into(), y.into());
    match overrides {
        Some(ov) => ctx.with_override(ov, |ctx| binary(op, &x, &y, ctx)),
        None => binary(op, &x, &y, ctx),
    }
}

/// Floor division and modulus in one call.
pub fn apply_divmod<'a>(
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
    ctx: &mut Context,
    overrides: Option<&ContextOverride>,
) -> Result<(Outcome, Outcome)> {
    let (x, y) = (x.into(), y.into());
    let run = |ctx: &mut Context| -> Result<(Outcome, Outcome)> {
        let quotient = binary(BinaryOp::FloorDiv, &x, &y, ctx)?;
        let remainder = binary(BinaryOp::Mod, &x, &y, ctx)?;
        Ok((quotient, remainder))
    };
    match overrides {
        Some(ov) => ctx.with_override(ov, run),
        None => run(ctx),
    }
}

/// Apply a unary operator.
pub fn apply_unary<'a>(
    op: UnaryOp,
    x: impl Into<Operand<'a>>,
    ctx: &mut Context,
    overrides: Option<&ContextOverride>,
) -> Result<Outcome> {
    let x = x.into();
    match overrides {
        Some(ov) => ctx.with_override(ov, |ctx| unary(op, &x, ctx)),
        None => unary(op, &x, ctx),
    }
}

fn binary(op: BinaryOp, x: &Operand<'_>, y: &Operand<'_>, ctx: &mut Context) -> Result<Outcome> {
    let before = ctx.flags();
    let (cx, cy, level) = classify_pair(x, y)?;

    if op.divides() && cy.is_exact_zero() {
        return Err(Error::division_by_zero(op.name()));
    }

    // A fractional exponent has no exact result
    let level = if op == BinaryOp::Pow && level.is_exact() && !cy.is_exact_integral() {
        TowerLevel::Real
    } else {
        level
    };

    trace!(op = op.name(), %level, x = ?cx.kind(), y = ?cy.kind(), "dispatch binary");

    let (value, raised) = match level {
        TowerLevel::Integer => (integer_binary(op, &cx, &cy)?, Flags::empty()),
        TowerLevel::Rational => (rational_binary(op, &cx, &cy)?, Flags::empty()),
        TowerLevel::Real => real_binary(op, &cx, &cy, ctx)?,
        TowerLevel::Complex => complex_binary(op, &cx, &cy, ctx)?,
    };

    ctx.signal(op.name(), raised)?;
    Ok(Outcome::new(value, raised, before))
}

fn unary(op: UnaryOp, x: &Operand<'_>, ctx: &mut Context) -> Result<Outcome> {
    let before = ctx.flags();
    let cx = classify(x)?;
    trace!(op = op.name(), level = %cx.level(), x = ?cx.kind(), "dispatch unary");

    let (value, raised) = match (op, cx.level()) {
        (_, TowerLevel::Complex) => complex_unary(op, &cx, ctx)?,
        (UnaryOp::Sqrt, _) | (_, TowerLevel::Real) => real_unary(op, &cx, ctx)?,
        (_, TowerLevel::Integer) => {
            let a = to_integer(&cx)?;
            let value = match op {
                UnaryOp::Neg => Integer::from(-&*a),
                UnaryOp::Abs => Integer::from(a.abs_ref()),
                _ => a.into_owned(),
            };
            (Number::Integer(value), Flags::empty())
        }
        (_, TowerLevel::Rational) => {
            let a = to_rational(&cx)?;
            let value = match op {
                UnaryOp::Neg => Rational::from(-&*a),
                UnaryOp::Abs => Rational::from(a.abs_ref()),
                _ => a.into_owned(),
            };
            (Number::Rational(value), Flags::empty())
        }
    };

    ctx.signal(op.name(), raised)?;
    Ok(Outcome::new(value, raised, before))
}

// ============================================================================
// Exact levels
// ============================================================================

fn integer_binary(op: BinaryOp, x: &Classified<'_>, y: &Classified<'_>) -> Result<Number> {
    let a = to_integer(x)?;
    let b = to_integer(y)?;
    let (a, b) = (&*a, &*b);
    Ok(match op {
        BinaryOp::Add => Number::Integer(Integer::from(a + b)),
        BinaryOp::Sub => Number::Integer(Integer::from(a - b)),
        BinaryOp::Mul => Number::Integer(Integer::from(a * b)),
        BinaryOp::Div => Number::Rational(Rational::from((a.clone(), b.clone()))),
        BinaryOp::FloorDiv => {
            let (q, _) = <(Integer, Integer)>::from(a.div_rem_floor_ref(b));
            Number::Integer(q)
        }
        BinaryOp::Mod => {
            let (_, r) = <(Integer, Integer)>::from(a.div_rem_floor_ref(b));
            Number::Integer(r)
        }
        BinaryOp::Pow => integer_pow(a, b)?,
    })
}

fn integer_pow(base: &Integer, exp: &Integer) -> Result<Number> {
    if exp.cmp0() != Ordering::Less {
        let e = exp
            .to_u32()
            .ok_or_else(|| Error::domain("pow", "exponent too large"))?;
        return Ok(Number::Integer(Integer::from(base.pow(e))));
    }
    if base.cmp0() == Ordering::Equal {
        return Err(Error::division_by_zero("pow"));
    }
    let e = Integer::from(-exp)
        .to_u32()
        .ok_or_else(|| Error::domain("pow", "exponent too large"))?;
    let den = Integer::from(base.pow(e));
    Ok(Number::Rational(Rational::from((Integer::from(1), den))))
}

fn rational_binary(op: BinaryOp, x: &Classified<'_>, y: &Classified<'_>) -> Result<Number> {
    let a = to_rational(x)?;
    let b = to_rational(y)?;
    let (a, b) = (&*a, &*b);
    Ok(match op {
        BinaryOp::Add => Number::Rational(Rational::from(a + b)),
        BinaryOp::Sub => Number::Rational(Rational::from(a - b)),
        BinaryOp::Mul => Number::Rational(Rational::from(a * b)),
        BinaryOp::Div => Number::Rational(Rational::from(a / b)),
        BinaryOp::FloorDiv => Number::Integer(floor_quotient(a, b)),
        BinaryOp::Mod => {
            let q = Rational::from(floor_quotient(a, b));
            let multiple = Rational::from(&q * b);
            Number::Rational(Rational::from(a - &multiple))
        }
        BinaryOp::Pow => rational_pow(a, y)?,
    })
}

fn floor_quotient(a: &Rational, b: &Rational) -> Integer {
    let q = Rational::from(a / b);
    Integer::from(q.floor_ref())
}

fn rational_pow(base: &Rational, exp: &Classified<'_>) -> Result<Number> {
    let e = to_integer(exp)?
        .to_i32()
        .ok_or_else(|| Error::domain("pow", "exponent too large"))?;
    if e < 0 && base.cmp0() == Ordering::Equal {
        return Err(Error::division_by_zero("pow"));
    }
    Ok(Number::Rational(Rational::from(base.pow(e))))
}

// ============================================================================
// Real level
// ============================================================================

/// Finite non-zero dividend over a zero divisor.
fn divides_by_zero(a: &Float, b: &Float) -> bool {
    b.is_zero() && a.is_finite() && !a.is_zero()
}

fn real_binary(
    op: BinaryOp,
    x: &Classified<'_>,
    y: &Classified<'_>,
    ctx: &Context,
) -> Result<(Number, Flags)> {
    if let Some(result) = real_with_rational(op, x, y, ctx)? {
        return Ok(result);
    }
    let mut raised = Flags::empty();
    let a = real_operand(x, ctx, &mut raised)?;

    if op == BinaryOp::Pow && y.level() == TowerLevel::Integer {
        let n = to_integer(y)?;
        return Ok(real_pow_integer(&a, &n, ctx, raised));
    }

    let b = real_operand(y, ctx, &mut raised)?;
    let (a, b) = (&*a, &*b);
    let nan_in = a.is_nan() || b.is_nan();
    let prec = ctx.precision();

    let res = match op {
        BinaryOp::Add => round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a + b, r)),
        BinaryOp::Sub => round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a - b, r)),
        BinaryOp::Mul => round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a * b, r)),
        BinaryOp::Div => {
            if divides_by_zero(a, b) {
                raised |= Flags::DIV_BY_ZERO;
            }
            round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a / b, r))
        }
        BinaryOp::FloorDiv => {
            if divides_by_zero(a, b) {
                raised |= Flags::DIV_BY_ZERO;
            }
            round_real(ctx, prec, nan_in, |p, _| {
                let (q, dir) = Float::with_val_round(p, a / b, Round::Down);
                (q.floor(), dir)
            })
        }
        BinaryOp::Mod => {
            if b.is_zero() {
                if !a.is_nan() {
                    raised |= Flags::DIV_BY_ZERO | Flags::INVALID_OP;
                }
                return Ok((Number::Real(Float::with_val(prec, Special::Nan)), raised));
            }
            round_real(ctx, prec, nan_in, |p, r| real_mod(a, b, p, r))
        }
        BinaryOp::Pow => return Ok(real_pow(a, b, ctx, raised)),
    };

    Ok((Number::Real(res.value), raised | res.raised))
}

/// Add, Sub, Mul or Div of a Real and a Rational with no finite binary
/// expansion. The Rational stays exact, so the result is rounded once.
fn real_with_rational(
    op: BinaryOp,
    x: &Classified<'_>,
    y: &Classified<'_>,
    ctx: &Context,
) -> Result<Option<(Number, Flags)>> {
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div) {
        return Ok(None);
    }
    let mut raised = Flags::empty();
    let prec = ctx.precision();

    let res = match (non_dyadic(x), non_dyadic(y)) {
        (None, Some(q)) => {
            let a = real_operand(x, ctx, &mut raised)?;
            let a = &*a;
            let nan_in = a.is_nan();
            match op {
                BinaryOp::Add => {
                    round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a + q, r))
                }
                BinaryOp::Sub => {
                    round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a - q, r))
                }
                BinaryOp::Mul => {
                    round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a * q, r))
                }
                _ => round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a / q, r)),
            }
        }
        (Some(q), None) => {
            let b = real_operand(y, ctx, &mut raised)?;
            let b = &*b;
            let nan_in = b.is_nan();
            match op {
                BinaryOp::Add => {
                    round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, b + q, r))
                }
                BinaryOp::Sub => {
                    let neg = Float::with_val(b.prec(), -b);
                    round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, &neg + q, r))
                }
                BinaryOp::Mul => {
                    round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, b * q, r))
                }
                _ => {
                    // q is never zero here
                    if b.is_zero() {
                        raised |= Flags::DIV_BY_ZERO;
                    }
                    // num / (b * den), both exact
                    let num = exact_float(q.numer());
                    let den = scaled(b, q.denom());
                    round_real(ctx, prec, nan_in, |p, r| {
                        Float::with_val_round(p, &num / &den, r)
                    })
                }
            }
        }
        _ => return Ok(None),
    };

    Ok(Some((Number::Real(res.value), raised | res.raised)))
}

/// `x * n` without rounding.
fn scaled(x: &Float, n: &Integer) -> Float {
    Float::with_val(x.prec() + n.significant_bits(), x * n)
}

/// Correctly rounded square root of a positive Rational.
///
/// Widens the working precision until both ends of an enclosure of the
/// root round to the same value. The root of a non-dyadic Rational is never
/// a rounding boundary, so the loop ends.
fn sqrt_rational(q: &Rational, prec: u32, round: Round) -> (Float, Ordering) {
    let mut work = prec.saturating_add(32);
    loop {
        let (lo, _) = Float::with_val_round(work, q, Round::Down);
        let (hi, _) = Float::with_val_round(work, q, Round::Up);
        let (lo, _) = Float::with_val_round(work, lo.sqrt_ref(), Round::Down);
        let (hi, _) = Float::with_val_round(work, hi.sqrt_ref(), Round::Up);
        let (a, dir_a) = Float::with_val_round(prec, &lo, round);
        let (b, dir_b) = Float::with_val_round(prec, &hi, round);
        if a == b && dir_a == dir_b {
            return (a, dir_a);
        }
        work = work.saturating_mul(2);
    }
}

/// Remainder of `a / b` with the sign of `b`, rounded once.
fn real_mod(a: &Float, b: &Float, prec: u32, round: Round) -> (Float, Ordering) {
    // fmod is exact at the wider of the operand precisions
    let rem = Float::with_val(a.prec().max(b.prec()), a % b);
    if rem.is_zero() {
        let zero = if b.is_sign_negative() {
            Special::NegZero
        } else {
            Special::Zero
        };
        return (Float::with_val(prec, zero), Ordering::Equal);
    }
    if !rem.is_nan() && rem.is_sign_negative() != b.is_sign_negative() {
        Float::with_val_round(prec, &rem + b, round)
    } else {
        Float::with_val_round(prec, &rem, round)
    }
}

fn real_pow_integer(a: &Float, n: &Integer, ctx: &Context, mut raised: Flags) -> (Number, Flags) {
    if a.is_zero() && n.cmp0() == Ordering::Less {
        raised |= Flags::DIV_BY_ZERO;
    }
    let res = round_real(ctx, ctx.precision(), a.is_nan(), |p, r| {
        Float::with_val_round(p, a.pow(n), r)
    });
    (Number::Real(res.value), raised | res.raised)
}

fn real_pow(a: &Float, b: &Float, ctx: &Context, mut raised: Flags) -> (Number, Flags) {
    let negative_base = a.is_finite() && *a < 0;
    if ctx.allow_complex() && negative_base && b.is_finite() && !b.is_integer() {
        let ca = Complex::with_val(a.prec(), a);
        let cb = Complex::with_val(b.prec(), b);
        let res = round_complex(ctx, false, |p, r| Complex::with_val_round(p, (&ca).pow(&cb), r));
        return (Number::Complex(res.value), raised | res.raised);
    }
    if a.is_zero() && b.is_finite() && *b < 0 {
        raised |= Flags::DIV_BY_ZERO;
    }
    let nan_in = a.is_nan() || b.is_nan();
    let res = round_real(ctx, ctx.precision(), nan_in, |p, r| {
        Float::with_val_round(p, a.pow(b), r)
    });
    (Number::Real(res.value), raised | res.raised)
}

fn real_unary(op: UnaryOp, x: &Classified<'_>, ctx: &Context) -> Result<(Number, Flags)> {
    if let (UnaryOp::Sqrt, Some(q)) = (op, non_dyadic(x)) {
        if q.cmp0() == Ordering::Greater {
            let res = round_real(ctx, ctx.precision(), false, |p, r| sqrt_rational(q, p, r));
            return Ok((Number::Real(res.value), res.raised));
        }
        if ctx.allow_complex() {
            let neg = Rational::from(-q);
            let res = round_complex(ctx, false, |p, r| {
                let zero = (Float::with_val(p.0, Special::Zero), Ordering::Equal);
                from_parts(p, zero, sqrt_rational(&neg, p.1, r.1))
            });
            return Ok((Number::Complex(res.value), res.raised));
        }
    }
    let mut raised = Flags::empty();
    let a = real_operand(x, ctx, &mut raised)?;
    let a = &*a;
    let nan_in = a.is_nan();
    let prec = ctx.precision();

    let res = match op {
        UnaryOp::Neg => round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, -a, r)),
        UnaryOp::Pos => round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a, r)),
        UnaryOp::Abs => {
            round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a.abs_ref(), r))
        }
        UnaryOp::Sqrt => {
            if ctx.allow_complex() && *a < 0 {
                let c = Complex::with_val(a.prec(), a);
                let res =
                    round_complex(ctx, false, |p, r| Complex::with_val_round(p, c.sqrt_ref(), r));
                return Ok((Number::Complex(res.value), raised | res.raised));
            }
            round_real(ctx, prec, nan_in, |p, r| Float::with_val_round(p, a.sqrt_ref(), r))
        }
    };

    Ok((Number::Real(res.value), raised | res.raised))
}

// ============================================================================
// Complex level
// ============================================================================

fn has_nan(c: &Complex) -> bool {
    c.real().is_nan() || c.imag().is_nan()
}

fn is_zero(c: &Complex) -> bool {
    c.real().is_zero() && c.imag().is_zero()
}

/// Assemble a Complex from separately rounded parts.
fn from_parts(
    prec: (u32, u32),
    (re, dir_re): (Float, Ordering),
    (im, dir_im): (Float, Ordering),
) -> (Complex, (Ordering, Ordering)) {
    (Complex::with_val(prec, (re, im)), (dir_re, dir_im))
}

fn complex_binary(
    op: BinaryOp,
    x: &Classified<'_>,
    y: &Classified<'_>,
    ctx: &Context,
) -> Result<(Number, Flags)> {
    if let Some(result) = complex_with_rational(op, x, y, ctx)? {
        return Ok(result);
    }
    let mut raised = Flags::empty();
    let a = complex_operand(x, ctx, &mut raised)?;
    let a = &*a;

    if op == BinaryOp::Pow && y.level() == TowerLevel::Integer {
        let n = to_integer(y)?;
        if is_zero(a) && n.cmp0() == Ordering::Less {
            raised |= Flags::DIV_BY_ZERO;
        }
        let res = match n.to_i32() {
            Some(e) => round_complex(ctx, has_nan(a), |p, r| {
                Complex::with_val_round(p, a.pow(e), r)
            }),
            None => {
                let cn = Complex::with_val(exact_float(&n).prec(), &*n);
                round_complex(ctx, has_nan(a), |p, r| Complex::with_val_round(p, a.pow(&cn), r))
            }
        };
        return Ok((Number::Complex(res.value), raised | res.raised));
    }

    let b = complex_operand(y, ctx, &mut raised)?;
    let b = &*b;
    let mut nan_in = has_nan(a) || has_nan(b);

    let res = match op {
        BinaryOp::Add => round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a + b, r)),
        BinaryOp::Sub => round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a - b, r)),
        BinaryOp::Mul => round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a * b, r)),
        BinaryOp::Div => {
            if is_zero(b) && !is_zero(a) && a.real().is_finite() && a.imag().is_finite() {
                raised |= Flags::DIV_BY_ZERO;
                // NaN components of c/0 are reported as the division by zero
                nan_in = true;
            }
            round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a / b, r))
        }
        BinaryOp::Pow => {
            if is_zero(a) && b.real().is_finite() && *b.real() < 0 {
                raised |= Flags::DIV_BY_ZERO;
            }
            round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a.pow(b), r))
        }
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            return Err(Error::type_mismatch(op.name(), "real number", "complex"));
        }
    };

    Ok((Number::Complex(res.value), raised | res.raised))
}

/// Complex counterpart of [`real_with_rational`]. Sums and products with a
/// Rational round each part once; a Rational over a Complex divides the
/// exact numerator by the exactly scaled Complex.
fn complex_with_rational(
    op: BinaryOp,
    x: &Classified<'_>,
    y: &Classified<'_>,
    ctx: &Context,
) -> Result<Option<(Number, Flags)>> {
    if !matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div) {
        return Ok(None);
    }
    let mut raised = Flags::empty();

    let res = match (non_dyadic(x), non_dyadic(y)) {
        (None, Some(q)) => {
            let a = complex_operand(x, ctx, &mut raised)?;
            let (re, im) = (a.real(), a.imag());
            let nan_in = has_nan(&a);
            round_complex(ctx, nan_in, |p, r| match op {
                BinaryOp::Add => from_parts(
                    p,
                    Float::with_val_round(p.0, re + q, r.0),
                    Float::with_val_round(p.1, im, r.1),
                ),
                BinaryOp::Sub => from_parts(
                    p,
                    Float::with_val_round(p.0, re - q, r.0),
                    Float::with_val_round(p.1, im, r.1),
                ),
                BinaryOp::Mul => from_parts(
                    p,
                    Float::with_val_round(p.0, re * q, r.0),
                    Float::with_val_round(p.1, im * q, r.1),
                ),
                _ => from_parts(
                    p,
                    Float::with_val_round(p.0, re / q, r.0),
                    Float::with_val_round(p.1, im / q, r.1),
                ),
            })
        }
        (Some(q), None) => {
            let b = complex_operand(y, ctx, &mut raised)?;
            let mut nan_in = has_nan(&b);
            match op {
                BinaryOp::Add | BinaryOp::Mul | BinaryOp::Sub => {
                    let b = if op == BinaryOp::Sub {
                        Complex::with_val(b.prec(), -&*b)
                    } else {
                        b.into_owned()
                    };
                    let (re, im) = (b.real(), b.imag());
                    round_complex(ctx, nan_in, |p, r| {
                        if op == BinaryOp::Mul {
                            from_parts(
                                p,
                                Float::with_val_round(p.0, re * q, r.0),
                                Float::with_val_round(p.1, im * q, r.1),
                            )
                        } else {
                            from_parts(
                                p,
                                Float::with_val_round(p.0, re + q, r.0),
                                Float::with_val_round(p.1, im, r.1),
                            )
                        }
                    })
                }
                _ => {
                    if is_zero(&b) {
                        raised |= Flags::DIV_BY_ZERO;
                        nan_in = true;
                    }
                    let num = exact_float(q.numer());
                    let num = Complex::with_val(num.prec(), &num);
                    let re = scaled(b.real(), q.denom());
                    let im = scaled(b.imag(), q.denom());
                    let den = Complex::with_val((re.prec(), im.prec()), (re, im));
                    round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, &num / &den, r))
                }
            }
        }
        _ => return Ok(None),
    };

    Ok(Some((Number::Complex(res.value), raised | res.raised)))
}

fn complex_unary(op: UnaryOp, x: &Classified<'_>, ctx: &Context) -> Result<(Number, Flags)> {
    let mut raised = Flags::empty();
    let a = complex_operand(x, ctx, &mut raised)?;
    let a = &*a;
    let nan_in = has_nan(a);

    let res = match op {
        UnaryOp::Neg => round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, -a, r)),
        UnaryOp::Pos => round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a, r)),
        UnaryOp::Sqrt => {
            round_complex(ctx, nan_in, |p, r| Complex::with_val_round(p, a.sqrt_ref(), r))
        }
        UnaryOp::Abs => {
            // The modulus is a Real
            let res = round_real(ctx, ctx.precision(), nan_in, |p, r| {
                Float::with_val_round(p, a.abs_ref(), r)
            });
            return Ok((Number::Real(res.value), raised | res.raised));
        }
    };

    Ok((Number::Complex(res.value), raised | res.raised))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Flag;

    fn ctx() -> Context {
        Context::new()
    }

    // =========================================================================
    // Exact levels
    // =========================================================================

    #[test]
    fn test_integer_true_division_is_rational() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Div, 6, 4, &mut ctx, None).unwrap();
        assert_eq!(out.value(), &Number::rational(3, 2).unwrap());
        assert!(out.raised().is_empty());
    }

    #[test]
    fn test_integer_floor_division_and_mod() {
        let mut ctx = ctx();
        let (q, r) = apply_divmod(-7, 2, &mut ctx, None).unwrap();
        assert_eq!(q.value(), &Number::integer(-4));
        assert_eq!(r.value(), &Number::integer(1));

        let (q, r) = apply_divmod(7, -2, &mut ctx, None).unwrap();
        assert_eq!(q.value(), &Number::integer(-4));
        assert_eq!(r.value(), &Number::integer(-1));
    }

    #[test]
    fn test_exact_zero_divisor_at_every_level() {
        let mut ctx = ctx();
        let zero_q = Number::rational(0, 7).unwrap();
        for op in [BinaryOp::Div, BinaryOp::FloorDiv, BinaryOp::Mod] {
            assert_eq!(
                apply(op, 5, 0, &mut ctx, None).unwrap_err(),
                Error::division_by_zero(op.name())
            );
            assert_eq!(
                apply(op, 2.5, &zero_q, &mut ctx, None).unwrap_err(),
                Error::division_by_zero(op.name())
            );
        }
        assert!(ctx.flags().is_empty());
    }

    #[test]
    fn test_integer_pow() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Pow, 2, 10, &mut ctx, None).unwrap();
        assert_eq!(out.value(), &Number::integer(1024));

        let out = apply(BinaryOp::Pow, 2, -3, &mut ctx, None).unwrap();
        assert_eq!(out.value(), &Number::rational(1, 8).unwrap());

        assert_eq!(
            apply(BinaryOp::Pow, 0, -1, &mut ctx, None).unwrap_err(),
            Error::division_by_zero("pow")
        );
        assert!(matches!(
            apply(BinaryOp::Pow, 2, u64::MAX, &mut ctx, None),
            Err(Error::Domain { .. })
        ));
    }

    #[test]
    fn test_rational_arithmetic_stays_rational() {
        let mut ctx = ctx();
        let half = Number::rational(1, 2).unwrap();
        let out = apply(BinaryOp::Add, &half, &half, &mut ctx, None).unwrap();
        assert_eq!(out.level(), TowerLevel::Rational);
        assert_eq!(out.value(), &Number::rational(1, 1).unwrap());
    }

    #[test]
    fn test_rational_floor_division() {
        let mut ctx = ctx();
        let a = Number::rational(7, 2).unwrap();
        let b = Number::rational(-1, 3).unwrap();
        let (q, r) = apply_divmod(&a, &b, &mut ctx, None).unwrap();
        // 7/2 / (-1/3) = -10.5
        assert_eq!(q.value(), &Number::integer(-11));
        assert_eq!(r.value(), &Number::rational(-1, 6).unwrap());
    }

    #[test]
    fn test_fractional_exponent_promotes_to_real() {
        let mut ctx = ctx();
        let half = Number::rational(1, 2).unwrap();
        let out = apply(BinaryOp::Pow, 4, &half, &mut ctx, None).unwrap();
        assert_eq!(out.level(), TowerLevel::Real);
        assert_eq!(*out.value().as_real().unwrap(), 2.0);
        assert!(out.raised().is_empty());

        let whole = Number::rational(4, 2).unwrap();
        let out = apply(BinaryOp::Pow, 3, &whole, &mut ctx, None).unwrap();
        assert_eq!(out.value(), &Number::rational(9, 1).unwrap());
    }

    // =========================================================================
    // Real level
    // =========================================================================

    #[test]
    fn test_real_division_by_zero_gives_signed_infinity() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Div, -1.0, 0.0, &mut ctx, None).unwrap();
        let value = out.value().as_real().unwrap();
        assert!(value.is_infinite() && value.is_sign_negative());
        assert_eq!(out.raised(), Flags::DIV_BY_ZERO);

        let out = apply(BinaryOp::Div, 1.0, -0.0, &mut ctx, None).unwrap();
        assert!(out.value().as_real().unwrap().is_sign_negative());
    }

    #[test]
    fn test_zero_over_zero_is_invalid() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Div, 0.0, 0.0, &mut ctx, None).unwrap();
        assert!(out.value().is_nan());
        assert_eq!(out.raised(), Flags::INVALID_OP);
    }

    #[test]
    fn test_real_division_by_zero_trapped() {
        let mut ctx = ctx();
        ctx.trap(Flag::DivByZero, true);
        assert_eq!(
            apply(BinaryOp::Div, 1.0, 0.0, &mut ctx, None).unwrap_err(),
            Error::Trapped {
                flag: Flag::DivByZero,
                operation: "div"
            }
        );
        assert!(ctx.flags().has(Flag::DivByZero));
    }

    #[test]
    fn test_real_mod_takes_divisor_sign() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Mod, -7.5, 2.0, &mut ctx, None).unwrap();
        assert_eq!(*out.value().as_real().unwrap(), 0.5);
        let out = apply(BinaryOp::Mod, 7.5, -2.0, &mut ctx, None).unwrap();
        assert_eq!(*out.value().as_real().unwrap(), -0.5);
        let out = apply(BinaryOp::Mod, -6.0, 3.0, &mut ctx, None).unwrap();
        assert!(!out.value().as_real().unwrap().is_sign_negative());
    }

    #[test]
    fn test_real_mod_by_zero() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Mod, 1.0, 0.0, &mut ctx, None).unwrap();
        assert!(out.value().is_nan());
        assert!(out.raised().has(Flag::DivByZero));
    }

    #[test]
    fn test_real_floor_division() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::FloorDiv, 7.0, -2.0, &mut ctx, None).unwrap();
        assert_eq!(*out.value().as_real().unwrap(), -4.0);
    }

    #[test]
    fn test_mixed_rational_real_rounds_at_working_precision() {
        let mut ctx = ctx();
        ctx.set_precision(100).unwrap();
        let third = Number::rational(1, 3).unwrap();
        let out = apply(BinaryOp::Add, &third, 1.0, &mut ctx, None).unwrap();
        assert_eq!(out.value().precision(), Some(100));
        assert!(out.raised().has(Flag::Inexact));
    }

    #[test]
    fn test_rational_on_the_left_rounds_once() {
        let mut ctx = ctx();
        let two_thirds = Number::rational(2, 3).unwrap();
        let out = apply(BinaryOp::Sub, &two_thirds, 1.0, &mut ctx, None).unwrap();
        let expected = Float::with_val(53, Rational::from((-1, 3)));
        assert_eq!(*out.value().as_real().unwrap(), expected);

        let third = Number::rational(1, 3).unwrap();
        let out = apply(BinaryOp::Div, &third, 3.0, &mut ctx, None).unwrap();
        let expected = Float::with_val(53, Rational::from((1, 9)));
        assert_eq!(*out.value().as_real().unwrap(), expected);

        let out = apply(BinaryOp::Div, 1.0, &third, &mut ctx, None).unwrap();
        assert_eq!(*out.value().as_real().unwrap(), 3.0);
        assert!(out.raised().is_empty());
    }

    #[test]
    fn test_rational_over_real_zero() {
        let mut ctx = ctx();
        let third = Number::rational(-1, 3).unwrap();
        let out = apply(BinaryOp::Div, &third, 0.0, &mut ctx, None).unwrap();
        let value = out.value().as_real().unwrap();
        assert!(value.is_infinite() && value.is_sign_negative());
        assert_eq!(out.raised(), Flags::DIV_BY_ZERO);
    }

    #[test]
    fn test_sqrt_of_rational_rounds_once() {
        let mut ctx = ctx();
        let q = Number::rational(4, 9).unwrap();
        let out = apply_unary(UnaryOp::Sqrt, &q, &mut ctx, None).unwrap();
        let expected = Float::with_val(53, Rational::from((2, 3)));
        assert_eq!(*out.value().as_real().unwrap(), expected);
        assert_eq!(out.raised(), Flags::INEXACT);

        ctx.set_allow_complex(true);
        let q = Number::rational(-4, 9).unwrap();
        let out = apply_unary(UnaryOp::Sqrt, &q, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert!(c.real().is_zero());
        assert_eq!(*c.imag(), expected);
    }

    #[test]
    fn test_complex_with_rational() {
        let mut ctx = ctx();
        let third = Number::rational(1, 3).unwrap();
        let z = Number::complex(3.0, 6.0);
        let out = apply(BinaryOp::Mul, &third, &z, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert_eq!(*c.real(), 1.0);
        assert_eq!(*c.imag(), 2.0);
        assert!(out.raised().is_empty());

        let i = Number::complex(0.0, 1.0);
        let out = apply(BinaryOp::Div, &third, &i, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert!(c.real().is_zero());
        assert_eq!(*c.imag(), -Float::with_val(53, Rational::from((1, 3))));

        let out = apply(BinaryOp::Sub, &third, &i, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert_eq!(*c.real(), Float::with_val(53, Rational::from((1, 3))));
        assert_eq!(*c.imag(), -1.0);
    }

    #[test]
    fn test_sqrt_of_negative() {
        let mut ctx = ctx();
        let out = apply_unary(UnaryOp::Sqrt, -4, &mut ctx, None).unwrap();
        assert!(out.value().is_nan());
        assert_eq!(out.raised(), Flags::INVALID_OP);

        ctx.set_allow_complex(true);
        let out = apply_unary(UnaryOp::Sqrt, -4, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert!(c.real().is_zero());
        assert_eq!(*c.imag(), 2);
    }

    #[test]
    fn test_negative_base_fractional_exponent() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Pow, -8.0, 0.5, &mut ctx, None).unwrap();
        assert!(out.value().is_nan());
        assert!(out.raised().has(Flag::InvalidOp));

        ctx.set_allow_complex(true);
        let out = apply(BinaryOp::Pow, -4.0, 0.5, &mut ctx, None).unwrap();
        assert_eq!(out.level(), TowerLevel::Complex);
    }

    #[test]
    fn test_real_integer_power_and_zero_base() {
        let mut ctx = ctx();
        let out = apply(BinaryOp::Pow, 0.0, -2, &mut ctx, None).unwrap();
        assert!(out.value().as_real().unwrap().is_infinite());
        assert_eq!(out.raised(), Flags::DIV_BY_ZERO);
    }

    #[test]
    fn test_unary_exact() {
        let mut ctx = ctx();
        let q = Number::rational(-2, 3).unwrap();
        let out = apply_unary(UnaryOp::Abs, &q, &mut ctx, None).unwrap();
        assert_eq!(out.value(), &Number::rational(2, 3).unwrap());
        let out = apply_unary(UnaryOp::Neg, 5, &mut ctx, None).unwrap();
        assert_eq!(out.value(), &Number::integer(-5));
    }

    #[test]
    fn test_pos_rounds_to_context() {
        let mut ctx = ctx();
        ctx.set_precision(10).unwrap();
        let out = apply_unary(UnaryOp::Pos, 0.1, &mut ctx, None).unwrap();
        assert_eq!(out.value().precision(), Some(10));
        assert!(!out.is_exact());
    }

    // =========================================================================
    // Complex level
    // =========================================================================

    #[test]
    fn test_complex_integer_power_is_exact() {
        let mut ctx = ctx();
        let i = Number::complex(0.0, 1.0);
        let out = apply(BinaryOp::Pow, &i, 2, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert_eq!(*c.real(), -1);
        assert!(c.imag().is_zero());
        assert!(out.raised().is_empty());
    }

    #[test]
    fn test_complex_floor_division_is_type_mismatch() {
        let mut ctx = ctx();
        let i = Number::complex(0.0, 1.0);
        assert!(matches!(
            apply(BinaryOp::FloorDiv, &i, 2, &mut ctx, None),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_complex_abs_is_real() {
        let mut ctx = ctx();
        let z = Number::complex(3.0, 4.0);
        let out = apply_unary(UnaryOp::Abs, &z, &mut ctx, None).unwrap();
        assert_eq!(out.level(), TowerLevel::Real);
        assert_eq!(*out.value().as_real().unwrap(), 5.0);
    }

    #[test]
    fn test_complex_component_precision() {
        let mut ctx = ctx();
        ctx.set_real_prec(Some(20)).unwrap();
        ctx.set_imag_prec(Some(40)).unwrap();
        let z = Number::complex(1.0, 1.0);
        let out = apply(BinaryOp::Div, 1, &z, &mut ctx, None).unwrap();
        let c = out.value().as_complex().unwrap();
        assert_eq!(c.prec(), (20, 40));
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    #[test]
    fn test_one_shot_override() {
        let mut ctx = ctx();
        let ov = ContextOverride::new().precision(200);
        let out = apply(BinaryOp::Div, 1.0, 3.0, &mut ctx, Some(&ov)).unwrap();
        assert_eq!(out.value().precision(), Some(200));
        assert_eq!(ctx.precision(), 53);
        assert!(ctx.flags().has(Flag::Inexact));
    }

    #[test]
    fn test_override_restored_after_failure() {
        let mut ctx = ctx();
        let ov = ContextOverride::new().precision(200);
        assert!(apply(BinaryOp::Div, 1, 0, &mut ctx, Some(&ov)).is_err());
        assert_eq!(ctx.precision(), 53);
    }

    #[test]
    fn test_unsupported_operand() {
        let mut ctx = ctx();
        assert_eq!(
            apply(BinaryOp::Add, 1, Operand::Unsupported("string"), &mut ctx, None)
                .unwrap_err(),
            Error::type_mismatch("classify", "number", "string")
        );
    }
}
