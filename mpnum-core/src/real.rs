// mpnum-core - Real functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Exact decompositions, rational approximation and exponent manipulation
//! for Reals.

use std::cmp::Ordering;

use rug::float::{Round, Special};
use rug::{Float, Integer, Rational};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::kernel::round_real;
use crate::number::{Number, TowerLevel};

fn finite_ratio(operation: &'static str, x: &Float) -> Result<Rational> {
    if x.is_nan() {
        return Err(Error::conversion("real", TowerLevel::Rational, "value is NaN"));
    }
    x.to_rational().ok_or_else(|| {
        tracing::trace!(operation, "non-finite real has no ratio");
        Error::conversion("real", TowerLevel::Rational, "value is infinite")
    })
}

// ============================================================================
// Decomposition
// ============================================================================

/// Exact `(numerator, denominator)` in lowest terms.
pub fn as_integer_ratio(x: &Float) -> Result<(Integer, Integer)> {
    Ok(finite_ratio("as_integer_ratio", x)?.into_numer_denom())
}

/// Exact `(mantissa, exponent)` with `x == mantissa * 2^exponent`.
///
/// Zero is `(0, 1)`.
pub fn as_mantissa_exp(x: &Float) -> Result<(Integer, i32)> {
    if x.is_zero() {
        return Ok((Integer::new(), 1));
    }
    if x.is_nan() {
        return Err(Error::conversion("real", TowerLevel::Integer, "value is NaN"));
    }
    x.to_integer_exp()
        .ok_or_else(|| Error::conversion("real", TowerLevel::Integer, "value is infinite"))
}

// ============================================================================
// Rational approximation
// ============================================================================

/// Simplest rational within a relative error of `x`.
///
/// Without `err` the tolerance is `2^-prec(x)`. A negative `err` means a
/// relative error of `2^err`; a positive one is the relative error itself.
/// An Integer is returned when the denominator is one.
///
/// ```
/// use mpnum_core::{Number, real::f2q};
/// use rug::Float;
///
/// let x = Float::with_val(53, 0.1);
/// assert_eq!(f2q(&x, None).unwrap(), Number::rational(1, 10).unwrap());
/// ```
pub fn f2q(x: &Float, err: Option<&Float>) -> Result<Number> {
    let xq = finite_ratio("f2q", x)?;
    let rel = match err {
        None => power_of_two(-(x.prec() as i64)),
        Some(e) if e.is_zero() => power_of_two(-(x.prec() as i64)),
        Some(e) if *e < 0 => {
            let k = e
                .to_i32_saturating()
                .ok_or_else(|| Error::domain("f2q", "error bound is NaN"))?;
            power_of_two(i64::from(k))
        }
        Some(e) => finite_ratio("f2q", e)?,
    };
    let q = simplest_within(&xq, &rel);
    if *q.denom() == 1 {
        Ok(Number::Integer(q.into_numer_denom().0))
    } else {
        Ok(Number::Rational(q))
    }
}

/// Simplest rational that agrees with `x` to `precision` bits, or to the
/// precision of `x` when `precision` is zero.
pub fn simple_fraction(x: &Float, precision: u32) -> Result<Rational> {
    let xq = finite_ratio("simple_fraction", x)?;
    let bits = if precision == 0 { x.prec() } else { precision };
    Ok(simplest_within(&xq, &power_of_two(-i64::from(bits))))
}

fn power_of_two(k: i64) -> Rational {
    let shift = k.unsigned_abs() as u32;
    let p = Integer::from(1) << shift;
    if k < 0 {
        Rational::from((Integer::from(1), p))
    } else {
        Rational::from(p)
    }
}

/// Simplest rational in `[x - rel*|x|, x + rel*|x|]`.
fn simplest_within(x: &Rational, rel: &Rational) -> Rational {
    let tol = Rational::from(rel * Rational::from(x.abs_ref()));
    let lo = Rational::from(x - &tol);
    let hi = Rational::from(x + &tol);
    simplest_between(lo, hi)
}

/// Simplest rational in `[lo, hi]`: smallest denominator, then smallest
/// numerator magnitude. Built from continued-fraction terms.
fn simplest_between(lo: Rational, hi: Rational) -> Rational {
    if lo.cmp0() != Ordering::Greater && hi.cmp0() != Ordering::Less {
        return Rational::new();
    }
    if hi.cmp0() == Ordering::Less {
        return -simplest_between(-hi, -lo);
    }

    // 0 < lo <= hi
    let (mut lo, mut hi) = (lo, hi);
    let mut terms: Vec<Integer> = Vec::new();
    let last = loop {
        let fl = Integer::from(lo.floor_ref());
        if lo == fl {
            break fl;
        }
        let next = Integer::from(&fl + 1u32);
        if hi >= next {
            break next;
        }
        // Both ends share the integer part; recurse on the reciprocals
        let new_lo = Rational::from(&hi - &fl).recip();
        let new_hi = Rational::from(&lo - &fl).recip();
        terms.push(fl);
        lo = new_lo;
        hi = new_hi;
    };

    terms
        .into_iter()
        .rev()
        .fold(Rational::from(last), |acc, t| acc.recip() + t)
}

// ============================================================================
// Range and rounding
// ============================================================================

/// Re-apply the context's exponent range (and subnormal emulation) to `x`,
/// keeping its precision.
pub fn check_range(x: &Float, ctx: &mut Context) -> Result<Number> {
    let res = round_real(ctx, x.prec(), x.is_nan(), |p, r| {
        Float::with_val_round(p, x, r)
    });
    ctx.signal("check_range", res.raised)?;
    Ok(Number::Real(res.value))
}

/// Round to `digits` decimal places, ties to even.
///
/// With `None` the result is the nearest Integer. Otherwise the result is a
/// Real at the precision of `x`; negative `digits` round to tens, hundreds
/// and so on.
pub fn round_digits(x: &Float, digits: Option<i32>) -> Result<Number> {
    let Some(n) = digits else {
        let xq = finite_ratio("round_digits", x)?;
        return Ok(Number::Integer(round_half_even(&xq)));
    };
    let Some(exp) = x.get_exp() else {
        return Ok(Number::Real(x.clone()));
    };
    // A value with k fractional bits has exactly k fractional decimal digits
    let frac_bits = (i64::from(x.prec()) - i64::from(exp)).max(0);
    if i64::from(n) >= frac_bits {
        return Ok(Number::Real(x.clone()));
    }
    // 10^-n > 2^(exp+1) > 2|x|
    if n < 0 && 3 * i64::from(n.unsigned_abs()) > i64::from(exp) + 1 {
        return Ok(Number::Real(signed_zero(x.is_sign_negative(), x.prec())));
    }
    // 2|x| < 2^(exp+1) <= 2^-4n < 10^-n
    if n > 0 && i64::from(exp) + 1 <= -4 * i64::from(n) {
        return Ok(Number::Real(signed_zero(x.is_sign_negative(), x.prec())));
    }
    let xq = finite_ratio("round_digits", x)?;
    let scale = Rational::from(Integer::from(Integer::u_pow_u(10, n.unsigned_abs())));
    let scaled = if n >= 0 {
        Rational::from(&xq * &scale)
    } else {
        Rational::from(&xq / &scale)
    };
    let rounded = Rational::from(round_half_even(&scaled));
    let value = if n >= 0 {
        Rational::from(&rounded / &scale)
    } else {
        Rational::from(&rounded * &scale)
    };
    let result = Float::with_val_round(x.prec(), &value, Round::Nearest).0;
    if result.is_zero() {
        return Ok(Number::Real(signed_zero(x.is_sign_negative(), x.prec())));
    }
    Ok(Number::Real(result))
}

fn round_half_even(q: &Rational) -> Integer {
    let (fract, mut int) = q.clone().fract_floor(Integer::new());
    // 0 <= fract < 1
    let half = Rational::from((1, 2));
    match fract.cmp(&half) {
        Ordering::Greater => int += 1u32,
        Ordering::Equal if int.is_odd() => int += 1u32,
        _ => {}
    }
    int
}

// ============================================================================
// Exponent and sign
// ============================================================================

/// Exponent of a regular value (`x = m * 2^e`, `0.5 <= |m| < 1`); zero for
/// a zero.
pub fn get_exp(x: &Float) -> Result<i32> {
    if x.is_zero() {
        return Ok(0);
    }
    x.get_exp()
        .ok_or_else(|| Error::domain("get_exp", "value is not finite"))
}

/// `x` with its exponent replaced by `exp`.
///
/// Zero, infinities and NaN are returned unchanged. `exp` must lie in the
/// context's exponent range.
pub fn set_exp(x: &Float, exp: i32, ctx: &Context) -> Result<Float> {
    if !(ctx.emin()..=ctx.emax()).contains(&exp) {
        return Err(Error::domain(
            "set_exp",
            format!("exponent {} outside {}..={}", exp, ctx.emin(), ctx.emax()),
        ));
    }
    let Some(current) = x.get_exp() else {
        return Ok(x.clone());
    };
    let shift = i64::from(exp) - i64::from(current);
    let shift = i32::try_from(shift).map_err(|_| Error::domain("set_exp", "shift too large"))?;
    Ok(Float::with_val(x.prec(), x) << shift)
}

/// `x` with the sign of `y`.
pub fn copy_sign(x: &Float, y: &Float) -> Float {
    set_sign(x, y.is_sign_negative())
}

/// `x` with its sign bit set to `negative`.
pub fn set_sign(x: &Float, negative: bool) -> Float {
    let value = x.clone();
    if value.is_sign_negative() == negative {
        value
    } else {
        -value
    }
}

/// NaN at the context precision.
pub fn nan(ctx: &Context) -> Float {
    Float::with_val(ctx.precision(), Special::Nan)
}

/// Signed infinity at the context precision.
pub fn inf(negative: bool, ctx: &Context) -> Float {
    let special = if negative {
        Special::NegInfinity
    } else {
        Special::Infinity
    };
    Float::with_val(ctx.precision(), special)
}

/// Signed zero at the context precision.
pub fn zero(negative: bool, ctx: &Context) -> Float {
    signed_zero(negative, ctx.precision())
}

fn signed_zero(negative: bool, prec: u32) -> Float {
    let special = if negative {
        Special::NegZero
    } else {
        Special::Zero
    };
    Float::with_val(prec, special)
}
