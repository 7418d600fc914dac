// mpnum-embed - Host-facing API for mpnum
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # mpnum-embed
//!
//! A convenience layer over `mpnum-core` for host applications.
//!
//! It keeps one current [`Context`] per thread, so arithmetic can be written
//! without passing a context around, and converts between Rust values and
//! [`Number`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mpnum_embed::{Number, add, div, flags, Flags};
//!
//! assert_eq!(add(1, 2).unwrap(), Number::integer(3));
//! // Integer true division stays exact
//! assert_eq!(div(1, 3).unwrap(), Number::rational(1, 3).unwrap());
//! // Real division rounds and records Inexact on the current context
//! div(1.0, 3).unwrap();
//! assert!(flags().contains(Flags::INEXACT));
//! ```
//!
//! ## Local Contexts
//!
//! ```rust
//! use mpnum_embed::{ContextOverride, div, local_context};
//!
//! let wide = {
//!     let _guard = local_context(&ContextOverride::new().precision(256)).unwrap();
//!     div(1.0, 3).unwrap()
//! };
//! assert_eq!(wide.precision(), Some(256));
//! assert_eq!(div(1.0, 3).unwrap().precision(), Some(53));
//! ```

mod convert;
mod current;
mod ops;

pub use convert::{FromNumber, IntoNumber, from_number, to_number};
pub use current::{
    LocalContext, clear_flags, flags, get_context, local_context, set_context, with_context,
};
pub use ops::{
    abs, add, binary, binary_with, cmp, div, divmod, floordiv, modulo, mul, neg, pos, pow, sqrt,
    sub, unary,
};

// Re-export core types for convenience
pub use mpnum_core::{
    BinaryOp, CompareOp, Context, ContextOverride, Error, Flag, Flags, Number, Operand, Result,
    RoundingMode, TowerLevel, UnaryOp,
};
