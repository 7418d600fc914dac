// mpnum-core - Operand classification
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Operand classification.
//!
//! Every dispatch call starts by placing both operands in the tower.
//! Internal values and native numbers are classified from their tag alone.
//! Foreign numbers expose the [`ForeignNumber`] capability trait; they are
//! probed once, in a fixed order, and the probed value is cached in the
//! returned [`Classified`] for the rest of the call.

use std::borrow::Cow;
use std::fmt;

use rug::{Complex, Float, Integer, Rational};
use tracing::trace;

use crate::error::{Error, Result};
use crate::number::{Number, TowerLevel};

/// Capability protocol for numeric objects from outside the tower.
///
/// Each accessor defaults to `None`. The classifier asks for a ratio first,
/// then complex parts, then an integer, then a real, and uses the first
/// capability that answers.
pub trait ForeignNumber: fmt::Debug {
    /// Name reported in type errors.
    fn type_name(&self) -> &'static str {
        "foreign number"
    }

    /// Numerator and denominator.
    fn as_ratio(&self) -> Option<(Integer, Integer)> {
        None
    }

    /// Real and imaginary parts.
    fn as_complex_parts(&self) -> Option<(Float, Float)> {
        None
    }

    fn as_integer(&self) -> Option<Integer> {
        None
    }

    fn as_real(&self) -> Option<Float> {
        None
    }
}

/// Anything that can be handed to the dispatcher.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A value already in the internal representation
    Number(&'a Number),
    /// Host-native signed integer
    Int(i128),
    /// Host-native unsigned integer
    UInt(u128),
    /// Host-native binary64 float
    Float(f64),
    /// Object implementing the numeric capability protocol
    Foreign(&'a dyn ForeignNumber),
    /// Non-numeric value, carrying its type name for the error message
    Unsupported(&'static str),
}

impl<'a> From<&'a Number> for Operand<'a> {
    fn from(n: &'a Number) -> Self {
        Operand::Number(n)
    }
}

impl<'a> From<&'a dyn ForeignNumber> for Operand<'a> {
    fn from(f: &'a dyn ForeignNumber) -> Self {
        Operand::Foreign(f)
    }
}

macro_rules! operand_from_native {
    ($variant:ident, $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Operand<'_> {
                fn from(n: $t) -> Self {
                    Operand::$variant(<$wide>::from(n))
                }
            }
        )*
    };
}

operand_from_native!(Int, i128: i8, i16, i32, i64, i128);
operand_from_native!(UInt, u128: u8, u16, u32, u64, u128);
operand_from_native!(Float, f64: f32, f64);

impl From<isize> for Operand<'_> {
    fn from(n: isize) -> Self {
        Operand::Int(n as i128)
    }
}

impl From<usize> for Operand<'_> {
    fn from(n: usize) -> Self {
        Operand::UInt(n as u128)
    }
}

/// Fine-grained operand type, keeping track of where the value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    Integer,
    Rational,
    Real,
    Complex,
    NativeInt,
    NativeFloat,
    ForeignInteger,
    ForeignRational,
    ForeignReal,
    ForeignComplex,
}

impl OperandType {
    /// Tower level used for promotion.
    pub fn level(self) -> TowerLevel {
        match self {
            OperandType::Integer | OperandType::NativeInt | OperandType::ForeignInteger => {
                TowerLevel::Integer
            }
            OperandType::Rational | OperandType::ForeignRational => TowerLevel::Rational,
            OperandType::Real | OperandType::NativeFloat | OperandType::ForeignReal => {
                TowerLevel::Real
            }
            OperandType::Complex | OperandType::ForeignComplex => TowerLevel::Complex,
        }
    }

    pub fn is_foreign(self) -> bool {
        matches!(
            self,
            OperandType::ForeignInteger
                | OperandType::ForeignRational
                | OperandType::ForeignReal
                | OperandType::ForeignComplex
        )
    }
}

#[derive(Debug, Clone)]
enum Source<'a> {
    Borrowed(&'a Number),
    Int(i128),
    UInt(u128),
    Float(f64),
    Probed(Number),
}

/// A classified operand: its type, its tower level and access to its value.
#[derive(Debug, Clone)]
pub struct Classified<'a> {
    kind: OperandType,
    source: Source<'a>,
}

impl<'a> Classified<'a> {
    pub fn kind(&self) -> OperandType {
        self.kind
    }

    pub fn level(&self) -> TowerLevel {
        self.kind.level()
    }

    /// The internal value, if the operand is internal or was probed.
    pub fn number(&self) -> Option<&Number> {
        match &self.source {
            Source::Borrowed(n) => Some(n),
            Source::Probed(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn native_int(&self) -> Option<Integer> {
        match self.source {
            Source::Int(i) => Some(Integer::from(i)),
            Source::UInt(u) => Some(Integer::from(u)),
            _ => None,
        }
    }

    pub(crate) fn native_float(&self) -> Option<f64> {
        match self.source {
            Source::Float(f) => Some(f),
            _ => None,
        }
    }

    /// The operand as an internal value, converting native numbers exactly.
    pub fn to_number(&self) -> Cow<'_, Number> {
        match &self.source {
            Source::Borrowed(n) => Cow::Borrowed(*n),
            Source::Probed(n) => Cow::Borrowed(n),
            Source::Int(i) => Cow::Owned(Number::Integer(Integer::from(*i))),
            Source::UInt(u) => Cow::Owned(Number::Integer(Integer::from(*u))),
            Source::Float(f) => Cow::Owned(Number::real(*f)),
        }
    }

    /// True for an exact (Integer or Rational level) zero.
    pub fn is_exact_zero(&self) -> bool {
        if !self.level().is_exact() {
            return false;
        }
        match &self.source {
            Source::Int(i) => *i == 0,
            Source::UInt(u) => *u == 0,
            Source::Borrowed(n) => n.is_zero(),
            Source::Probed(n) => n.is_zero(),
            Source::Float(_) => false,
        }
    }

    pub fn is_nan(&self) -> bool {
        match &self.source {
            Source::Float(f) => f.is_nan(),
            Source::Borrowed(n) => n.is_nan(),
            Source::Probed(n) => n.is_nan(),
            _ => false,
        }
    }

    /// True when the value is a whole number at the Integer or Rational
    /// level.
    pub(crate) fn is_exact_integral(&self) -> bool {
        match self.level() {
            TowerLevel::Integer => true,
            TowerLevel::Rational => self
                .number()
                .and_then(Number::as_rational)
                .is_some_and(|q| *q.denom() == 1),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            OperandType::NativeInt => "native int",
            OperandType::NativeFloat => "native float",
            other if other.is_foreign() => "foreign number",
            other => other.level().name(),
        }
    }
}

/// Place an operand in the tower.
pub fn classify<'a>(operand: &Operand<'a>) -> Result<Classified<'a>> {
    let (kind, source) = match *operand {
        Operand::Number(n) => {
            let kind = match n {
                Number::Integer(_) => OperandType::Integer,
                Number::Rational(_) => OperandType::Rational,
                Number::Real(_) => OperandType::Real,
                Number::Complex(_) => OperandType::Complex,
            };
            (kind, Source::Borrowed(n))
        }
        Operand::Int(i) => (OperandType::NativeInt, Source::Int(i)),
        Operand::UInt(u) => (OperandType::NativeInt, Source::UInt(u)),
        Operand::Float(f) => (OperandType::NativeFloat, Source::Float(f)),
        Operand::Foreign(obj) => probe(obj)?,
        Operand::Unsupported(type_name) => {
            return Err(Error::type_mismatch("classify", "number", type_name));
        }
    };
    Ok(Classified { kind, source })
}

fn probe<'a>(obj: &dyn ForeignNumber) -> Result<(OperandType, Source<'a>)> {
    if let Some((num, den)) = obj.as_ratio() {
        if den == 0 {
            return Err(Error::division_by_zero("classify"));
        }
        trace!(type_name = obj.type_name(), "foreign operand probed as rational");
        let q = Rational::from((num, den));
        return Ok((OperandType::ForeignRational, Source::Probed(Number::Rational(q))));
    }
    if let Some((re, im)) = obj.as_complex_parts() {
        trace!(type_name = obj.type_name(), "foreign operand probed as complex");
        let prec = (re.prec(), im.prec());
        let c = Complex::with_val(prec, (re, im));
        return Ok((OperandType::ForeignComplex, Source::Probed(Number::Complex(c))));
    }
    if let Some(n) = obj.as_integer() {
        trace!(type_name = obj.type_name(), "foreign operand probed as integer");
        return Ok((OperandType::ForeignInteger, Source::Probed(Number::Integer(n))));
    }
    if let Some(f) = obj.as_real() {
        trace!(type_name = obj.type_name(), "foreign operand probed as real");
        return Ok((OperandType::ForeignReal, Source::Probed(Number::Real(f))));
    }
    Err(Error::type_mismatch(
        "classify",
        "number",
        obj.type_name(),
    ))
}

/// Classify both operands and select their common tower level.
///
/// The level is the maximum of the two operand levels, so it does not depend
/// on operand order.
pub fn classify_pair<'a>(
    x: &Operand<'a>,
    y: &Operand<'a>,
) -> Result<(Classified<'a>, Classified<'a>, TowerLevel)> {
    let cx = classify(x)?;
    let cy = classify(y)?;
    let level = cx.level().max(cy.level());
    Ok((cx, cy, level))
}
