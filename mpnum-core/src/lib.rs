// mpnum-core - Numeric tower, evaluation context and operator dispatch
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # mpnum-core
//!
//! Arbitrary-precision Integer, Rational, Real and Complex numbers behind one
//! value model. Operands are classified into a four-level tower, promoted to
//! the higher level and handed to the `rug` kernel. Real and Complex results
//! are rounded under an explicit [`Context`] that records sticky flags and can
//! trap them.
//!
//! ```
//! use mpnum_core::{BinaryOp, Context, Flags, Number, apply};
//!
//! let mut ctx = Context::new();
//! let third = Number::rational(1, 3).unwrap();
//!
//! // Exact levels never round
//! let out = apply(BinaryOp::Mul, 6, &third, &mut ctx, None).unwrap();
//! assert_eq!(out.value(), &Number::rational(2, 1).unwrap());
//!
//! // Reals round at the context precision
//! let out = apply(BinaryOp::Div, 1.0, 3, &mut ctx, None).unwrap();
//! assert!(out.raised().contains(Flags::INEXACT));
//! assert!(ctx.flags().contains(Flags::INEXACT));
//! ```

pub mod classify;
pub mod coerce;
pub mod compare;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod integer;
mod kernel;
pub mod number;
pub mod outcome;
pub mod predicate;
pub mod real;

pub use classify::{Classified, ForeignNumber, Operand, OperandType, classify, classify_pair};
pub use coerce::{coerce, to_complex, to_integer, to_rational, to_real};
pub use compare::{CompareOp, compare, partial_cmp};
pub use context::{
    Context, ContextOverride, DEFAULT_PRECISION, Flag, Flags, RoundingMode, ScopedContext,
    emax_max, emin_min, max_precision,
};
pub use dispatch::{BinaryOp, UnaryOp, apply, apply_divmod, apply_unary};
pub use error::{Error, Result};
pub use number::{Number, TowerLevel};
pub use outcome::Outcome;

// Kernel types callers need to build values
pub use rug::{Complex, Float, Integer, Rational};
