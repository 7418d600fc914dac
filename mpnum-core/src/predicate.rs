// mpnum-core - Predicates
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Classification predicates. None of these consult or modify a context.

use std::cmp::Ordering;

use crate::classify::Operand;
use crate::compare::partial_cmp;
use crate::error::{Error, Result};
use crate::number::Number;

pub fn is_nan(x: &Number) -> bool {
    x.is_nan()
}

/// True for a Real infinity or a Complex with an infinite component.
pub fn is_infinite(x: &Number) -> bool {
    match x {
        Number::Real(f) => f.is_infinite(),
        Number::Complex(c) => c.real().is_infinite() || c.imag().is_infinite(),
        Number::Integer(_) | Number::Rational(_) => false,
    }
}

/// True unless `x` is NaN or infinite (in either Complex component).
pub fn is_finite(x: &Number) -> bool {
    match x {
        Number::Real(f) => f.is_finite(),
        Number::Complex(c) => c.real().is_finite() && c.imag().is_finite(),
        Number::Integer(_) | Number::Rational(_) => true,
    }
}

pub fn is_zero(x: &Number) -> bool {
    x.is_zero()
}

/// Sign bit of `x`: true for negative values including `-0.0` and `-inf`.
///
/// NaN reports the sign bit it carries. Complex values have no sign.
pub fn is_signed(x: &Number) -> Result<bool> {
    match x {
        Number::Integer(n) => Ok(n.cmp0() == Ordering::Less),
        Number::Rational(q) => Ok(q.cmp0() == Ordering::Less),
        Number::Real(f) => Ok(f.is_sign_negative()),
        Number::Complex(_) => Err(Error::type_mismatch("is_signed", "real number", "complex")),
    }
}

/// True for a finite non-zero value.
pub fn is_regular(x: &Number) -> Result<bool> {
    match x {
        Number::Integer(_) | Number::Rational(_) => Ok(!x.is_zero()),
        Number::Real(f) => Ok(f.is_normal()),
        Number::Complex(_) => Err(Error::type_mismatch("is_regular", "real number", "complex")),
    }
}

/// True if `x` has an integral value. A Complex qualifies when its
/// imaginary part is zero.
pub fn is_integer(x: &Number) -> bool {
    match x {
        Number::Integer(_) => true,
        Number::Rational(q) => *q.denom() == 1,
        Number::Real(f) => f.is_integer(),
        Number::Complex(c) => c.imag().is_zero() && c.real().is_integer(),
    }
}

/// True if `x < y` or `x > y`. False for equal or unordered pairs.
pub fn is_lessgreater<'a>(x: impl Into<Operand<'a>>, y: impl Into<Operand<'a>>) -> Result<bool> {
    Ok(matches!(
        partial_cmp(x, y)?,
        Some(Ordering::Less | Ordering::Greater)
    ))
}

/// True if either operand is NaN.
pub fn is_unordered<'a>(x: impl Into<Operand<'a>>, y: impl Into<Operand<'a>>) -> Result<bool> {
    Ok(partial_cmp(x, y)?.is_none())
}
