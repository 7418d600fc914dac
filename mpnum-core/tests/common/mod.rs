// mpnum-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for mpnum-core integration tests.
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Available Helpers
//!
//! - [`int`], [`rat`], [`real`], [`real_at`] - Build values
//! - [`run`] - Apply a binary operator under a context, no overrides
//! - [`HostFraction`], [`HostComplex`] - Foreign numbers for protocol tests
//!
//! # Macros
//!
//! - [`assert_number!`] - Assert an operation's value
//! - [`assert_raised!`] - Assert the exact flag set an operation raised

#![allow(dead_code)]

pub use mpnum_core::{
    BinaryOp, Complex, Context, ContextOverride, Error, Flag, Flags, Float, ForeignNumber,
    Integer, Number, Operand, Outcome, Rational, RoundingMode, TowerLevel, UnaryOp, apply,
};

pub fn int(n: i64) -> Number {
    Number::integer(n)
}

/// # Panics
///
/// Panics if `den` is zero.
pub fn rat(num: i64, den: i64) -> Number {
    Number::rational(num, den).expect("non-zero denominator")
}

/// Real at the default 53 bits.
pub fn real(v: f64) -> Number {
    Number::real(v)
}

/// Real rounded to `prec` bits.
pub fn real_at(v: f64, prec: u32) -> Number {
    Number::Real(Float::with_val(prec, v))
}

/// `2^e` as a Real at `prec` bits.
pub fn pow2(e: i32, prec: u32) -> Number {
    Number::Real(Float::with_val(prec, 1) << e)
}

/// Apply `op` to `x` and `y` without overrides.
pub fn run<'a>(
    op: BinaryOp,
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
    ctx: &mut Context,
) -> mpnum_core::Result<Outcome> {
    apply(op, x, y, ctx, None)
}

/// A foreign exact fraction exposing only the ratio capability.
#[derive(Debug, Clone)]
pub struct HostFraction {
    pub num: i64,
    pub den: i64,
}

impl ForeignNumber for HostFraction {
    fn type_name(&self) -> &'static str {
        "HostFraction"
    }

    fn as_ratio(&self) -> Option<(Integer, Integer)> {
        Some((Integer::from(self.num), Integer::from(self.den)))
    }
}

/// A foreign complex number in binary64.
#[derive(Debug, Clone)]
pub struct HostComplex {
    pub re: f64,
    pub im: f64,
}

impl ForeignNumber for HostComplex {
    fn type_name(&self) -> &'static str {
        "HostComplex"
    }

    fn as_complex_parts(&self) -> Option<(Float, Float)> {
        Some((Float::with_val(53, self.re), Float::with_val(53, self.im)))
    }
}

/// A foreign value with no numeric capability.
#[derive(Debug)]
pub struct Opaque;

impl ForeignNumber for Opaque {
    fn type_name(&self) -> &'static str {
        "Opaque"
    }
}

/// Assert that an operation succeeded with the expected value.
///
/// # Example
///
/// ```ignore
/// assert_number!(run(BinaryOp::Add, 1, 2, &mut ctx), int(3));
/// ```
#[macro_export]
macro_rules! assert_number {
    ($result:expr, $expected:expr) => {
        match $result {
            Ok(out) => pretty_assertions::assert_eq!(*out.value(), $expected),
            Err(e) => panic!("operation failed: {}", e),
        }
    };
}

/// Assert the exact set of flags an operation raised.
#[macro_export]
macro_rules! assert_raised {
    ($result:expr, $flags:expr) => {
        match $result {
            Ok(out) => pretty_assertions::assert_eq!(out.raised(), $flags),
            Err(e) => panic!("operation failed: {}", e),
        }
    };
}
