// mpnum-core - Integer functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Exact integer roots, digit counts and integer-valued rounding.

use std::cmp::Ordering;

use rug::{Float, Integer, Rational};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::number::Number;

/// Integer square root, rounded down.
pub fn isqrt(x: &Integer) -> Result<Integer> {
    if x.cmp0() == Ordering::Less {
        return Err(Error::domain("isqrt", "square root of negative number"));
    }
    Ok(Integer::from(x.sqrt_ref()))
}

/// Integer square root and remainder `x - s*s`.
pub fn isqrt_rem(x: &Integer) -> Result<(Integer, Integer)> {
    if x.cmp0() == Ordering::Less {
        return Err(Error::domain(
            "isqrt_rem",
            "square root of negative number",
        ));
    }
    Ok(<(Integer, Integer)>::from(x.sqrt_rem_ref()))
}

/// The `n`th root truncated toward zero, and whether it is exact.
///
/// Odd roots of negative numbers are allowed.
pub fn iroot(x: &Integer, n: u32) -> Result<(Integer, bool)> {
    check_root("iroot", x, n)?;
    let (root, rem) = <(Integer, Integer)>::from(x.root_rem_ref(n));
    let exact = rem.cmp0() == Ordering::Equal;
    Ok((root, exact))
}

/// The `n`th root of a non-negative `x` and the remainder `x - root^n`.
pub fn iroot_rem(x: &Integer, n: u32) -> Result<(Integer, Integer)> {
    if x.cmp0() == Ordering::Less {
        return Err(Error::domain("iroot_rem", "root of negative number"));
    }
    check_root("iroot_rem", x, n)?;
    Ok(<(Integer, Integer)>::from(x.root_rem_ref(n)))
}

fn check_root(operation: &'static str, x: &Integer, n: u32) -> Result<()> {
    if n == 0 {
        return Err(Error::domain(operation, "n must be > 0"));
    }
    if n % 2 == 0 && x.cmp0() == Ordering::Less {
        return Err(Error::domain(operation, "even root of negative number"));
    }
    Ok(())
}

/// Number of digits of `|x|` in `base` (2..=62). Zero has one digit.
pub fn num_digits(x: &Integer, base: u32) -> Result<usize> {
    match base {
        2 => Ok(x.significant_bits().max(1) as usize),
        3..=36 => {
            let digits = x.to_string_radix(base as i32);
            Ok(digits.trim_start_matches('-').len())
        }
        37..=62 => Ok(digits_above(x, base)),
        _ => Err(Error::domain("num_digits", "base must be in 2..=62")),
    }
}

/// Smallest `k` with `base^k > |x|`, at least 1.
fn digits_above(x: &Integer, base: u32) -> usize {
    let mag = Integer::from(x.abs_ref());
    // |x| >= 2^(bits-1), so at least this many digits
    let bits = f64::from(mag.significant_bits().max(1));
    let mut k = (((bits - 1.0) / f64::from(base).log2()) as u32).max(1);
    while Integer::from(Integer::u_pow_u(base, k)) <= mag {
        k += 1;
    }
    while k > 1 && Integer::from(Integer::u_pow_u(base, k - 1)) > mag {
        k -= 1;
    }
    k as usize
}

/// Number of bits of `|x|`; zero for zero.
pub fn bit_length(x: &Integer) -> u32 {
    x.significant_bits()
}

pub fn is_even(x: &Integer) -> bool {
    x.is_even()
}

pub fn is_odd(x: &Integer) -> bool {
    x.is_odd()
}

/// Round to a multiple of `10^-digits`.
///
/// Non-negative `digits` leave an Integer unchanged. Ties go to the even
/// multiple, so `round_to(25, -1)` is 20 and `round_to(35, -1)` is 40.
pub fn round_to(x: &Integer, digits: i32) -> Integer {
    if digits >= 0 {
        return x.clone();
    }
    // 10^k > 2^(bits+1) > 2|x|
    if digits.unsigned_abs() > x.significant_bits() {
        return Integer::new();
    }
    let unit = Integer::from(Integer::u_pow_u(10, digits.unsigned_abs()));
    let (mut q, r) = <(Integer, Integer)>::from(x.div_rem_floor_ref(&unit));
    // 0 <= r < unit
    let twice = Integer::from(&r << 1u32);
    match twice.cmp(&unit) {
        Ordering::Greater => q += 1u32,
        Ordering::Equal if q.is_odd() => q += 1u32,
        _ => {}
    }
    q * unit
}

// ============================================================================
// Integer-valued rounding
// ============================================================================

/// How [`to_integral`] rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Floor,
    Ceil,
    Trunc,
}

/// Largest integer not above `x`.
///
/// Identity on Integers; Rationals become Integers; Reals stay Reals at the
/// context precision.
pub fn floor(x: &Number, ctx: &mut Context) -> Result<Number> {
    to_integral("floor", x, Direction::Floor, ctx)
}

/// Smallest integer not below `x`.
pub fn ceil(x: &Number, ctx: &mut Context) -> Result<Number> {
    to_integral("ceil", x, Direction::Ceil, ctx)
}

/// `x` with its fractional part removed.
pub fn trunc(x: &Number, ctx: &mut Context) -> Result<Number> {
    to_integral("trunc", x, Direction::Trunc, ctx)
}

fn to_integral(
    operation: &'static str,
    x: &Number,
    dir: Direction,
    ctx: &mut Context,
) -> Result<Number> {
    match x {
        Number::Integer(n) => Ok(Number::Integer(n.clone())),
        Number::Rational(q) => Ok(Number::Integer(rational_integral(q, dir))),
        Number::Real(f) => {
            let (value, ternary) = match dir {
                Direction::Floor => Float::with_val_round(
                    ctx.precision(),
                    f.floor_ref(),
                    ctx.rounding().into(),
                ),
                Direction::Ceil => Float::with_val_round(
                    ctx.precision(),
                    f.ceil_ref(),
                    ctx.rounding().into(),
                ),
                Direction::Trunc => Float::with_val_round(
                    ctx.precision(),
                    f.trunc_ref(),
                    ctx.rounding().into(),
                ),
            };
            ctx.signal_inexact(operation, ternary)?;
            Ok(Number::Real(value))
        }
        Number::Complex(_) => Err(Error::type_mismatch(operation, "real number", "complex")),
    }
}

fn rational_integral(q: &Rational, dir: Direction) -> Integer {
    match dir {
        Direction::Floor => Integer::from(q.floor_ref()),
        Direction::Ceil => Integer::from(q.ceil_ref()),
        Direction::Trunc => Integer::from(q.trunc_ref()),
    }
}
