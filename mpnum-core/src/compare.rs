// mpnum-core - Comparison operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Comparisons across the tower.
//!
//! Comparisons are exact: a Rational is compared with a Real through the
//! kernel's mixed comparison, never by rounding one side first. A NaN on
//! either side makes the pair unordered. Comparisons never touch the
//! context's flags.

use std::cmp::Ordering;

use rug::{Float, Rational};
use tracing::trace;

use crate::classify::{Operand, classify_pair};
use crate::error::{Error, Result};
use crate::number::{Number, TowerLevel};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }
}

/// Evaluate `x op y`.
///
/// Unordered pairs (a NaN on either side) are unequal and satisfy no
/// ordering. Ordering a Complex is a type error; equality with a Complex
/// holds when its imaginary part is zero and the real parts are equal.
///
/// ```
/// use mpnum_core::{CompareOp, Number, compare};
///
/// let third = Number::rational(1, 3).unwrap();
/// assert!(compare(CompareOp::Lt, &third, 0.34).unwrap());
/// assert!(compare(CompareOp::Ne, f64::NAN, f64::NAN).unwrap());
/// ```
pub fn compare<'a>(
    op: CompareOp,
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
) -> Result<bool> {
    let (cx, cy, level) = classify_pair(&x.into(), &y.into())?;
    trace!(op = op.name(), %level, "dispatch compare");
    let (a, b) = (cx.to_number(), cy.to_number());

    match op {
        CompareOp::Eq => return Ok(numbers_equal(&a, &b)),
        CompareOp::Ne => return Ok(!numbers_equal(&a, &b)),
        _ => {}
    }
    if level == TowerLevel::Complex {
        return Err(Error::type_mismatch(op.name(), "real number", "complex"));
    }
    let Some(ord) = order(&a, &b) else {
        return Ok(false);
    };
    Ok(match op {
        CompareOp::Lt => ord.is_lt(),
        CompareOp::Le => ord.is_le(),
        CompareOp::Gt => ord.is_gt(),
        CompareOp::Ge => ord.is_ge(),
        CompareOp::Eq => ord.is_eq(),
        CompareOp::Ne => ord.is_ne(),
    })
}

/// Three-way comparison; `None` for an unordered pair.
pub fn partial_cmp<'a>(
    x: impl Into<Operand<'a>>,
    y: impl Into<Operand<'a>>,
) -> Result<Option<Ordering>> {
    let (cx, cy, level) = classify_pair(&x.into(), &y.into())?;
    if level == TowerLevel::Complex {
        return Err(Error::type_mismatch("partial_cmp", "real number", "complex"));
    }
    Ok(order(&cx.to_number(), &cy.to_number()))
}

fn order(a: &Number, b: &Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => Some(x.cmp(y)),
        (Number::Integer(x), Number::Rational(y)) => Some(Rational::from(x).cmp(y)),
        (Number::Rational(x), Number::Integer(y)) => Some(x.cmp(&Rational::from(y))),
        (Number::Rational(x), Number::Rational(y)) => Some(x.cmp(y)),
        (Number::Real(x), Number::Integer(y)) => x.partial_cmp(y),
        (Number::Real(x), Number::Rational(y)) => x.partial_cmp(y),
        (Number::Real(x), Number::Real(y)) => x.partial_cmp(y),
        (Number::Integer(_) | Number::Rational(_), Number::Real(_)) => {
            order(b, a).map(Ordering::reverse)
        }
        // No order on Complex
        _ => None,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a, b) {
        (Number::Complex(x), Number::Complex(y)) => x == y,
        (Number::Complex(c), other) | (other, Number::Complex(c)) => {
            c.imag().is_zero() && real_equals(c.real(), other)
        }
        _ => order(a, b) == Some(Ordering::Equal),
    }
}

fn real_equals(re: &Float, other: &Number) -> bool {
    match other {
        Number::Integer(n) => *re == *n,
        Number::Rational(q) => *re == *q,
        Number::Real(f) => re == f,
        Number::Complex(_) => false,
    }
}
