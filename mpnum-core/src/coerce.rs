// mpnum-core - Tower coercion
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Conversion of classified operands to a target tower level.
//!
//! Widening conversions are exact, with one exception: a Rational whose
//! denominator is not a power of two has no finite binary expansion, so it
//! is rounded to the working precision and Inexact is raised. Narrowing
//! conversions succeed only when no information is lost.
//!
//! Helpers borrow when the operand already has the requested
//! representation and only allocate otherwise.

use std::borrow::Cow;
use std::cmp::Ordering;

use rug::{Complex, Float, Integer, Rational};

use crate::classify::Classified;
use crate::context::{Context, Flags};
use crate::error::{Error, Result};
use crate::number::{Number, TowerLevel};

/// Coerce `operand` to an internal value at level `to`.
///
/// Any Inexact raised by a rounding conversion is recorded in `ctx` and
/// fails the call if trapped.
pub fn coerce(operand: &Classified<'_>, to: TowerLevel, ctx: &mut Context) -> Result<Number> {
    Ok(match to {
        TowerLevel::Integer => Number::Integer(to_integer(operand)?.into_owned()),
        TowerLevel::Rational => Number::Rational(to_rational(operand)?.into_owned()),
        TowerLevel::Real => Number::Real(to_real(operand, ctx)?.into_owned()),
        TowerLevel::Complex => Number::Complex(to_complex(operand, ctx)?.into_owned()),
    })
}

/// Coerce to Integer. Fails for non-integral and non-finite values.
pub fn to_integer<'c>(operand: &'c Classified<'_>) -> Result<Cow<'c, Integer>> {
    if let Some(n) = operand.native_int() {
        return Ok(Cow::Owned(n));
    }
    if let Some(f) = operand.native_float() {
        return float_to_integer("native float", &Float::with_val(f64::MANTISSA_DIGITS, f))
            .map(Cow::Owned);
    }
    match operand.number() {
        Some(Number::Integer(n)) => Ok(Cow::Borrowed(n)),
        Some(Number::Rational(q)) => {
            if *q.denom() == 1 {
                Ok(Cow::Owned(q.numer().clone()))
            } else {
                Err(Error::conversion(
                    "rational",
                    TowerLevel::Integer,
                    "value is not integral",
                ))
            }
        }
        Some(Number::Real(f)) => float_to_integer("real", f).map(Cow::Owned),
        Some(Number::Complex(c)) => {
            let re = complex_real_part(c, TowerLevel::Integer)?;
            float_to_integer("complex", re).map(Cow::Owned)
        }
        None => Err(Error::type_mismatch("coerce", "number", operand.type_name())),
    }
}

/// Coerce to Rational. Fails for NaN, infinities and non-real Complex.
pub fn to_rational<'c>(operand: &'c Classified<'_>) -> Result<Cow<'c, Rational>> {
    if let Some(n) = operand.native_int() {
        return Ok(Cow::Owned(Rational::from(n)));
    }
    if let Some(f) = operand.native_float() {
        return Rational::from_f64(f)
            .map(Cow::Owned)
            .ok_or_else(|| non_finite("native float", TowerLevel::Rational));
    }
    match operand.number() {
        Some(Number::Integer(n)) => Ok(Cow::Owned(Rational::from(n))),
        Some(Number::Rational(q)) => Ok(Cow::Borrowed(q)),
        Some(Number::Real(f)) => f
            .to_rational()
            .map(Cow::Owned)
            .ok_or_else(|| non_finite("real", TowerLevel::Rational)),
        Some(Number::Complex(c)) => complex_real_part(c, TowerLevel::Rational)?
            .to_rational()
            .map(Cow::Owned)
            .ok_or_else(|| non_finite("complex", TowerLevel::Rational)),
        None => Err(Error::type_mismatch("coerce", "number", operand.type_name())),
    }
}

/// Coerce to Real, recording Inexact in `ctx` if a Rational had to be
/// rounded.
pub fn to_real<'c>(operand: &'c Classified<'_>, ctx: &mut Context) -> Result<Cow<'c, Float>> {
    let mut raised = Flags::empty();
    let value = real_operand(operand, ctx, &mut raised)?;
    ctx.signal("coerce", raised)?;
    Ok(value)
}

/// Coerce to Complex, recording Inexact in `ctx` if a Rational had to be
/// rounded.
pub fn to_complex<'c>(operand: &'c Classified<'_>, ctx: &mut Context) -> Result<Cow<'c, Complex>> {
    let mut raised = Flags::empty();
    let value = complex_operand(operand, ctx, &mut raised)?;
    ctx.signal("coerce", raised)?;
    Ok(value)
}

/// Real operand for the dispatcher. Flags are collected into `raised`
/// rather than signalled, so they can be reported with the result.
pub(crate) fn real_operand<'c>(
    operand: &'c Classified<'_>,
    ctx: &Context,
    raised: &mut Flags,
) -> Result<Cow<'c, Float>> {
    if let Some(n) = operand.native_int() {
        return Ok(Cow::Owned(exact_float(&n)));
    }
    if let Some(f) = operand.native_float() {
        return Ok(Cow::Owned(Float::with_val(f64::MANTISSA_DIGITS, f)));
    }
    match operand.number() {
        Some(Number::Integer(n)) => Ok(Cow::Owned(exact_float(n))),
        Some(Number::Rational(q)) => {
            if q.denom().is_power_of_two() {
                let prec = q.numer().significant_bits().max(1);
                Ok(Cow::Owned(Float::with_val(prec, q)))
            } else {
                let (f, dir) =
                    Float::with_val_round(ctx.precision(), q, ctx.rounding().into());
                if dir != Ordering::Equal {
                    *raised |= Flags::INEXACT;
                }
                Ok(Cow::Owned(f))
            }
        }
        Some(Number::Real(f)) => Ok(Cow::Borrowed(f)),
        Some(Number::Complex(c)) => {
            complex_real_part(c, TowerLevel::Real).map(|re| Cow::Owned(re.clone()))
        }
        None => Err(Error::type_mismatch("coerce", "number", operand.type_name())),
    }
}

/// The Rational behind `operand` when it has no finite binary expansion.
///
/// The dispatcher keeps such operands exact instead of calling
/// [`real_operand`], so the result is rounded only once.
pub(crate) fn non_dyadic<'c>(operand: &'c Classified<'_>) -> Option<&'c Rational> {
    match operand.number() {
        Some(Number::Rational(q)) if !q.denom().is_power_of_two() => Some(q),
        _ => None,
    }
}

/// Complex operand for the dispatcher; see [`real_operand`].
pub(crate) fn complex_operand<'c>(
    operand: &'c Classified<'_>,
    ctx: &Context,
    raised: &mut Flags,
) -> Result<Cow<'c, Complex>> {
    if let Some(Number::Complex(c)) = operand.number() {
        return Ok(Cow::Borrowed(c));
    }
    let re = real_operand(operand, ctx, raised)?;
    let prec = re.prec();
    Ok(Cow::Owned(Complex::with_val(prec, &*re)))
}

/// Float holding `n` exactly.
pub(crate) fn exact_float(n: &Integer) -> Float {
    Float::with_val(n.significant_bits().max(1), n)
}

fn float_to_integer(from: &'static str, f: &Float) -> Result<Integer> {
    if !f.is_finite() {
        return Err(non_finite(from, TowerLevel::Integer));
    }
    if !f.is_integer() {
        return Err(Error::conversion(
            from,
            TowerLevel::Integer,
            "value is not integral",
        ));
    }
    f.to_integer()
        .ok_or_else(|| non_finite(from, TowerLevel::Integer))
}

fn complex_real_part(c: &Complex, to: TowerLevel) -> Result<&Float> {
    if c.imag().is_zero() {
        Ok(c.real())
    } else {
        Err(Error::conversion(
            "complex",
            to,
            "imaginary part is not zero",
        ))
    }
}

fn non_finite(from: &'static str, to: TowerLevel) -> Error {
    Error::conversion(from, to, "value is not finite")
}
