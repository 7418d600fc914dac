// mpnum-core - Numeric value type
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The numeric tower: `Number` and `TowerLevel`.
//!
//! A `Number` is one of four tower members. Exact members (Integer,
//! Rational) never consult a context. Inexact members (Real, Complex) carry
//! their own precision, fixed when the value was created.

use std::fmt;

use rug::{Complex, Float, Integer, Rational};

use crate::context::Context;
use crate::error::{Error, Result};

/// Position of a value in the numeric tower.
///
/// The derived ordering is the promotion order: the common level of two
/// operands is the maximum of their levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TowerLevel {
    Integer,
    Rational,
    Real,
    Complex,
}

impl TowerLevel {
    /// True for the levels whose operations are always exact.
    pub fn is_exact(self) -> bool {
        matches!(self, TowerLevel::Integer | TowerLevel::Rational)
    }

    pub fn name(self) -> &'static str {
        match self {
            TowerLevel::Integer => "integer",
            TowerLevel::Rational => "rational",
            TowerLevel::Real => "real",
            TowerLevel::Complex => "complex",
        }
    }
}

impl fmt::Display for TowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable arbitrary-precision number.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    /// Exact integer with a single canonical zero
    Integer(Integer),
    /// Exact rational, always in lowest terms with a positive denominator
    Rational(Rational),
    /// Binary floating point with its own precision and IEEE special values
    Real(Float),
    /// Pair of Reals, each with its own precision
    Complex(Complex),
}

impl Number {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an Integer.
    pub fn integer(n: impl Into<Integer>) -> Self {
        Number::Integer(n.into())
    }

    /// Create a Rational in lowest terms.
    ///
    /// The result stays at the Rational level even when the denominator
    /// reduces to one.
    pub fn rational(num: impl Into<Integer>, den: impl Into<Integer>) -> Result<Self> {
        let den = den.into();
        if den == 0 {
            return Err(Error::division_by_zero("rational"));
        }
        Ok(Number::Rational(Rational::from((num.into(), den))))
    }

    /// Create a Real holding `value` exactly (53 bits).
    pub fn real(value: f64) -> Self {
        Number::Real(Float::with_val(f64::MANTISSA_DIGITS, value))
    }

    /// Create a Real from `value` rounded to `prec` bits to nearest.
    ///
    /// Returns a domain error when `prec` is outside the kernel's range.
    pub fn real_with_prec(value: f64, prec: u32) -> Result<Self> {
        check_prec("real", prec)?;
        Ok(Number::Real(Float::with_val(prec, value)))
    }

    /// Create a Real from `value` at the working precision of `ctx`.
    ///
    /// Rounds with the context rounding mode. Dropped bits raise the
    /// Inexact flag, which fails the call if Inexact is trapped.
    pub fn real_in(ctx: &mut Context, value: f64) -> Result<Self> {
        let (float, dir) =
            Float::with_val_round(ctx.precision(), value, ctx.rounding().into());
        ctx.signal_inexact("real", dir)?;
        Ok(Number::Real(float))
    }

    /// Create a Complex holding both parts exactly (53 bits each).
    pub fn complex(re: f64, im: f64) -> Self {
        Number::Complex(Complex::with_val(f64::MANTISSA_DIGITS, (re, im)))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Tower level of this value.
    pub fn level(&self) -> TowerLevel {
        match self {
            Number::Integer(_) => TowerLevel::Integer,
            Number::Rational(_) => TowerLevel::Rational,
            Number::Real(_) => TowerLevel::Real,
            Number::Complex(_) => TowerLevel::Complex,
        }
    }

    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        self.level().name()
    }

    pub fn is_exact(&self) -> bool {
        self.level().is_exact()
    }

    /// True for a NaN Real or a Complex with a NaN component.
    pub fn is_nan(&self) -> bool {
        match self {
            Number::Real(f) => f.is_nan(),
            Number::Complex(c) => c.real().is_nan() || c.imag().is_nan(),
            _ => false,
        }
    }

    /// True for any zero: Integer 0, Rational 0, ±0 Real, ±0±0i Complex.
    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(n) => *n == 0,
            Number::Rational(q) => *q.numer() == 0,
            Number::Real(f) => f.is_zero(),
            Number::Complex(c) => c.real().is_zero() && c.imag().is_zero(),
        }
    }

    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Number::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            Number::Rational(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<&Float> {
        match self {
            Number::Real(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&Complex> {
        match self {
            Number::Complex(c) => Some(c),
            _ => None,
        }
    }

    /// Stored precision in bits for a Real, `None` for other levels.
    pub fn precision(&self) -> Option<u32> {
        self.as_real().map(Float::prec)
    }
}

/// Validate a precision against the kernel's limits.
pub(crate) fn check_prec(operation: &'static str, prec: u32) -> Result<()> {
    if (rug::float::prec_min()..=rug::float::prec_max()).contains(&prec) {
        Ok(())
    } else {
        Err(Error::domain(
            operation,
            format!(
                "precision {} outside {}..={}",
                prec,
                rug::float::prec_min(),
                rug::float::prec_max()
            ),
        ))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Rational(q) => write!(f, "{}", q),
            Number::Real(x) => write!(f, "{}", x),
            Number::Complex(c) => write!(f, "{}", c),
        }
    }
}

macro_rules! number_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::Integer(Integer::from(n))
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<Integer> for Number {
    fn from(n: Integer) -> Self {
        Number::Integer(n)
    }
}

impl From<Rational> for Number {
    fn from(q: Rational) -> Self {
        Number::Rational(q)
    }
}

impl From<Float> for Number {
    fn from(f: Float) -> Self {
        Number::Real(f)
    }
}

impl From<Complex> for Number {
    fn from(c: Complex) -> Self {
        Number::Complex(c)
    }
}
