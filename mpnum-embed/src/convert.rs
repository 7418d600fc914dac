// mpnum-embed - Type conversion traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type conversion between Rust values and [`Number`].
//!
//! This module provides the [`IntoNumber`] and [`FromNumber`] traits.
//!
//! # Built-in Conversions
//!
//! | Rust Type | Tower level |
//! |-----------|-------------|
//! | `i8`..`i128`, `u8`..`u128`, `isize`, `usize`, `Integer` | Integer |
//! | `Rational` | Rational |
//! | `f32`, `f64`, `Float` | Real (native floats at 53 bits, exactly) |
//! | `(f64, f64)`, `Complex` | Complex |
//!
//! Conversions out of the tower never round silently into a narrower
//! integer: an out-of-range or non-integral value is a conversion error.
//! Conversions to `f64` round to nearest.
//!
//! # Custom Conversions
//!
//! ```rust
//! use mpnum_embed::{FromNumber, IntoNumber, Number, Result};
//!
//! struct Cents(i64);
//!
//! impl IntoNumber for Cents {
//!     fn into_number(self) -> Number {
//!         Number::rational(self.0, 100).unwrap()
//!     }
//! }
//!
//! impl FromNumber for Cents {
//!     fn from_number(n: &Number) -> Result<Self> {
//!         let scaled = mpnum_embed::mul(n, 100)?;
//!         Ok(Cents(i64::from_number(&scaled)?))
//!     }
//! }
//!
//! let n = Cents(250).into_number();
//! assert_eq!(Cents::from_number(&n).unwrap().0, 250);
//! ```

use std::cmp::Ordering;

use mpnum_core::{Error, Number, Result, TowerLevel};
use rug::{Complex, Float, Integer, Rational};

/// Convert a Rust value into a [`Number`].
pub trait IntoNumber {
    fn into_number(self) -> Number;
}

/// Convert a [`Number`] into a Rust value.
pub trait FromNumber: Sized {
    fn from_number(n: &Number) -> Result<Self>;
}

/// Convenience wrapper around [`IntoNumber`].
pub fn to_number<T: IntoNumber>(value: T) -> Number {
    value.into_number()
}

/// Convenience wrapper around [`FromNumber`].
pub fn from_number<T: FromNumber>(n: &Number) -> Result<T> {
    T::from_number(n)
}

// ============================================================================
// IntoNumber implementations
// ============================================================================

impl IntoNumber for Number {
    fn into_number(self) -> Number {
        self
    }
}

macro_rules! into_number_integer {
    ($($t:ty),*) => {
        $(
            impl IntoNumber for $t {
                fn into_number(self) -> Number {
                    Number::Integer(Integer::from(self))
                }
            }
        )*
    };
}

into_number_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl IntoNumber for Integer {
    fn into_number(self) -> Number {
        Number::Integer(self)
    }
}

impl IntoNumber for Rational {
    fn into_number(self) -> Number {
        Number::Rational(self)
    }
}

impl IntoNumber for f64 {
    fn into_number(self) -> Number {
        Number::real(self)
    }
}

impl IntoNumber for f32 {
    fn into_number(self) -> Number {
        Number::real(f64::from(self))
    }
}

impl IntoNumber for Float {
    fn into_number(self) -> Number {
        Number::Real(self)
    }
}

impl IntoNumber for Complex {
    fn into_number(self) -> Number {
        Number::Complex(self)
    }
}

impl IntoNumber for (f64, f64) {
    fn into_number(self) -> Number {
        Number::complex(self.0, self.1)
    }
}

// ============================================================================
// FromNumber implementations
// ============================================================================

impl FromNumber for Number {
    fn from_number(n: &Number) -> Result<Self> {
        Ok(n.clone())
    }
}

/// The integral value of `n`, without rounding.
fn integral(n: &Number) -> Result<Integer> {
    match n {
        Number::Integer(i) => Ok(i.clone()),
        Number::Rational(q) if *q.denom() == 1 => Ok(q.numer().clone()),
        Number::Real(f) if f.is_integer() => f
            .to_integer()
            .ok_or_else(|| Error::conversion("real", TowerLevel::Integer, "value is not finite")),
        Number::Complex(_) => Err(Error::conversion(
            "complex",
            TowerLevel::Integer,
            "value is complex",
        )),
        other => Err(Error::conversion(
            other.type_name(),
            TowerLevel::Integer,
            "value is not integral",
        )),
    }
}

impl FromNumber for Integer {
    fn from_number(n: &Number) -> Result<Self> {
        integral(n)
    }
}

macro_rules! from_number_integer {
    ($($t:ty => $to:ident),*) => {
        $(
            impl FromNumber for $t {
                fn from_number(n: &Number) -> Result<Self> {
                    integral(n)?.$to().ok_or_else(|| {
                        Error::conversion(
                            n.type_name(),
                            TowerLevel::Integer,
                            concat!("value does not fit in ", stringify!($t)),
                        )
                    })
                }
            }
        )*
    };
}

from_number_integer!(
    i32 => to_i32,
    i64 => to_i64,
    i128 => to_i128,
    u32 => to_u32,
    u64 => to_u64,
    u128 => to_u128,
    usize => to_usize
);

impl FromNumber for Rational {
    fn from_number(n: &Number) -> Result<Self> {
        match n {
            Number::Integer(i) => Ok(Rational::from(i)),
            Number::Rational(q) => Ok(q.clone()),
            Number::Real(f) => f
                .to_rational()
                .ok_or_else(|| Error::conversion("real", TowerLevel::Rational, "value is not finite")),
            Number::Complex(_) => Err(Error::conversion(
                "complex",
                TowerLevel::Rational,
                "value is complex",
            )),
        }
    }
}

impl FromNumber for f64 {
    fn from_number(n: &Number) -> Result<Self> {
        match n {
            Number::Integer(i) => Ok(i.to_f64()),
            Number::Rational(q) => Ok(q.to_f64()),
            Number::Real(f) => Ok(f.to_f64()),
            Number::Complex(c) if c.imag().is_zero() => Ok(c.real().to_f64()),
            Number::Complex(_) => Err(Error::conversion(
                "complex",
                TowerLevel::Real,
                "imaginary part is not zero",
            )),
        }
    }
}

impl FromNumber for Float {
    /// Exact levels keep every bit: Integers use their significant bits,
    /// Rationals must have a power-of-two denominator.
    fn from_number(n: &Number) -> Result<Self> {
        match n {
            Number::Integer(i) => Ok(Float::with_val(i.significant_bits().max(1), i)),
            Number::Rational(q) => {
                let den = q.denom();
                if !den.is_power_of_two() {
                    return Err(Error::conversion(
                        "rational",
                        TowerLevel::Real,
                        "denominator is not a power of two",
                    ));
                }
                let prec = q.numer().significant_bits().max(1);
                Ok(Float::with_val(prec, q))
            }
            Number::Real(f) => Ok(f.clone()),
            Number::Complex(c) if c.imag().is_zero() => Ok(c.real().clone()),
            Number::Complex(_) => Err(Error::conversion(
                "complex",
                TowerLevel::Real,
                "imaginary part is not zero",
            )),
        }
    }
}

impl FromNumber for Complex {
    fn from_number(n: &Number) -> Result<Self> {
        match n {
            Number::Complex(c) => Ok(c.clone()),
            other => {
                let re = Float::from_number(other)?;
                Ok(Complex::with_val(re.prec(), re))
            }
        }
    }
}

impl FromNumber for bool {
    /// Truthiness: any non-zero value, NaN included.
    fn from_number(n: &Number) -> Result<Self> {
        Ok(!n.is_zero())
    }
}

impl FromNumber for Ordering {
    /// Sign of a non-NaN real value.
    fn from_number(n: &Number) -> Result<Self> {
        match n {
            Number::Integer(i) => Ok(i.cmp0()),
            Number::Rational(q) => Ok(q.cmp0()),
            Number::Real(f) => f
                .cmp0()
                .ok_or_else(|| Error::conversion("real", TowerLevel::Integer, "value is NaN")),
            Number::Complex(_) => Err(Error::type_mismatch("sign", "real number", "complex")),
        }
    }
}
