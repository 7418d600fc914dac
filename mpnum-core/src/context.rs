// mpnum-core - Evaluation context
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The evaluation context for inexact (Real and Complex) operations.
//!
//! A [`Context`] holds the working precision, rounding mode, exponent range,
//! trap set and sticky status flags. It is a plain value passed by `&mut`
//! into every dispatch call; independent contexts can live on independent
//! threads.
//!
//! Temporary changes go through [`Context::scoped`], which returns a guard
//! that restores the previous configuration when dropped. Sticky flags
//! raised while the guard is alive are kept: only an explicit
//! [`Context::clear_flags`] lowers a flag.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use bitflags::bitflags;
use rug::float::Round;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Rounding
// ============================================================================

/// Rounding applied to Real and Complex results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round to nearest, ties to even
    #[default]
    ToNearest,
    ToZero,
    /// Toward positive infinity
    ToInf,
    /// Toward negative infinity
    ToNegInf,
    AwayFromZero,
}

impl RoundingMode {
    /// Rounding used for complex kernel calls, which have no away-from-zero
    /// mode. `AwayFromZero` falls back to `ToNearest`.
    pub(crate) fn complex_round(self) -> (Round, Round) {
        let round = match self {
            RoundingMode::AwayFromZero => Round::Nearest,
            other => other.into(),
        };
        (round, round)
    }
}

impl From<RoundingMode> for Round {
    fn from(mode: RoundingMode) -> Self {
        match mode {
            RoundingMode::ToNearest => Round::Nearest,
            RoundingMode::ToZero => Round::Zero,
            RoundingMode::ToInf => Round::Up,
            RoundingMode::ToNegInf => Round::Down,
            RoundingMode::AwayFromZero => Round::AwayZero,
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoundingMode::ToNearest => "to_nearest",
            RoundingMode::ToZero => "to_zero",
            RoundingMode::ToInf => "to_inf",
            RoundingMode::ToNegInf => "to_neg_inf",
            RoundingMode::AwayFromZero => "away_from_zero",
        })
    }
}

impl FromStr for RoundingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "to_nearest" | "nearest" => Ok(RoundingMode::ToNearest),
            "to_zero" | "zero" => Ok(RoundingMode::ToZero),
            "to_inf" | "up" => Ok(RoundingMode::ToInf),
            "to_neg_inf" | "down" => Ok(RoundingMode::ToNegInf),
            "away_from_zero" | "away" => Ok(RoundingMode::AwayFromZero),
            other => Err(Error::Config(format!("unknown rounding mode '{}'", other))),
        }
    }
}

// ============================================================================
// Flags
// ============================================================================

/// A single exceptional condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    InvalidOp,
    DivByZero,
    Overflow,
    Underflow,
    Inexact,
}

impl Flag {
    /// Every flag, most severe first.
    pub const ALL: [Flag; 5] = [
        Flag::InvalidOp,
        Flag::DivByZero,
        Flag::Overflow,
        Flag::Underflow,
        Flag::Inexact,
    ];

    pub fn bit(self) -> Flags {
        match self {
            Flag::InvalidOp => Flags::INVALID_OP,
            Flag::DivByZero => Flags::DIV_BY_ZERO,
            Flag::Overflow => Flags::OVERFLOW,
            Flag::Underflow => Flags::UNDERFLOW,
            Flag::Inexact => Flags::INEXACT,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flag::InvalidOp => "invalid operation",
            Flag::DivByZero => "division by zero",
            Flag::Overflow => "overflow",
            Flag::Underflow => "underflow",
            Flag::Inexact => "inexact",
        })
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "invalid_op" | "invalid" => Ok(Flag::InvalidOp),
            "div_by_zero" | "divzero" => Ok(Flag::DivByZero),
            "overflow" => Ok(Flag::Overflow),
            "underflow" => Ok(Flag::Underflow),
            "inexact" => Ok(Flag::Inexact),
            other => Err(Error::Config(format!("unknown flag '{}'", other))),
        }
    }
}

bitflags! {
    /// A set of [`Flag`]s, used both for traps and for sticky status.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        const INEXACT = 1 << 0;
        const UNDERFLOW = 1 << 1;
        const OVERFLOW = 1 << 2;
        const DIV_BY_ZERO = 1 << 3;
        const INVALID_OP = 1 << 4;
    }
}

impl Flags {
    /// Members of the set, most severe first.
    pub fn members(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |f| self.contains(f.bit()))
    }

    /// Most severe member of the set.
    pub fn first(self) -> Option<Flag> {
        self.members().next()
    }

    pub fn has(self, flag: Flag) -> bool {
        self.contains(flag.bit())
    }
}

impl From<Flag> for Flags {
    fn from(flag: Flag) -> Self {
        flag.bit()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        iter.into_iter().fold(Flags::empty(), |acc, f| acc | f.bit())
    }
}

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.members())
    }
}

impl<'de> Deserialize<'de> for Flags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let list = Vec::<Flag>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}

// ============================================================================
// Context
// ============================================================================

/// Default working precision in bits.
pub const DEFAULT_PRECISION: u32 = 53;

/// Mutable configuration for Real and Complex evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    precision: u32,
    real_prec: Option<u32>,
    imag_prec: Option<u32>,
    rounding: RoundingMode,
    emin: i32,
    emax: i32,
    subnormalize: bool,
    allow_complex: bool,
    traps: Flags,
    flags: Flags,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            precision: DEFAULT_PRECISION,
            real_prec: None,
            imag_prec: None,
            rounding: RoundingMode::ToNearest,
            emin: emin_min(),
            emax: emax_max(),
            subnormalize: false,
            allow_complex: false,
            traps: Flags::empty(),
            flags: Flags::empty(),
        }
    }
}

impl Context {
    /// Create a context with the documented defaults: 53 bits, round to
    /// nearest, the kernel's full exponent range, no traps, no flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context matching an IEEE 754 binary interchange format.
    ///
    /// Accepts 16, 32, 64, 128 and multiples of 32 above 128. Subnormal
    /// emulation is enabled.
    pub fn ieee(bits: u32) -> Result<Self> {
        let (precision, emax) = match bits {
            16 => (11, 16),
            32 => (24, 128),
            64 | 128 => ieee_wide(bits)?,
            _ if bits > 128 && bits % 32 == 0 => ieee_wide(bits)?,
            _ => {
                return Err(Error::invalid_context(format!(
                    "no IEEE interchange format with {} bits",
                    bits
                )));
            }
        };
        let emin = 4 - emax - precision as i32;

        let mut ctx = Context::new();
        ctx.set_precision(precision)?;
        ctx.set_exponent_range(emin, emax)?;
        ctx.subnormalize = true;
        Ok(ctx)
    }

    /// Build a context from TOML, starting from the defaults.
    ///
    /// ```
    /// use mpnum_core::{Context, RoundingMode};
    ///
    /// let ctx = Context::from_toml_str("precision = 100\nrounding = \"to_zero\"").unwrap();
    /// assert_eq!(ctx.precision(), 100);
    /// assert_eq!(ctx.rounding(), RoundingMode::ToZero);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let overrides = ContextOverride::from_toml_str(s)?;
        let mut ctx = Context::new();
        overrides.apply_to(&mut ctx)?;
        Ok(ctx)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn set_precision(&mut self, precision: u32) -> Result<()> {
        validate_prec("precision", precision)?;
        self.precision = precision;
        Ok(())
    }

    /// Precision of the real part of Complex results.
    pub fn real_prec(&self) -> u32 {
        self.real_prec.unwrap_or(self.precision)
    }

    /// Set the real-part precision; `None` follows `precision`.
    pub fn set_real_prec(&mut self, precision: Option<u32>) -> Result<()> {
        if let Some(p) = precision {
            validate_prec("real_prec", p)?;
        }
        self.real_prec = precision;
        Ok(())
    }

    /// Precision of the imaginary part of Complex results.
    pub fn imag_prec(&self) -> u32 {
        self.imag_prec.unwrap_or(self.precision)
    }

    /// Set the imaginary-part precision; `None` follows `precision`.
    pub fn set_imag_prec(&mut self, precision: Option<u32>) -> Result<()> {
        if let Some(p) = precision {
            validate_prec("imag_prec", p)?;
        }
        self.imag_prec = precision;
        Ok(())
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn set_rounding(&mut self, rounding: RoundingMode) {
        self.rounding = rounding;
    }

    pub fn emin(&self) -> i32 {
        self.emin
    }

    pub fn emax(&self) -> i32 {
        self.emax
    }

    pub fn set_emin(&mut self, emin: i32) -> Result<()> {
        self.set_exponent_range(emin, self.emax)
    }

    pub fn set_emax(&mut self, emax: i32) -> Result<()> {
        self.set_exponent_range(self.emin, emax)
    }

    /// Set both exponent bounds at once.
    ///
    /// Bounds use the kernel convention: a finite non-zero value is
    /// `m * 2^e` with `0.5 <= |m| < 1`.
    pub fn set_exponent_range(&mut self, emin: i32, emax: i32) -> Result<()> {
        let (lo, hi) = (emin_min(), emax_max());
        if emin < lo || emax > hi {
            return Err(Error::invalid_context(format!(
                "exponent range {}..={} outside {}..={}",
                emin, emax, lo, hi
            )));
        }
        if emin > emax {
            return Err(Error::invalid_context(format!(
                "emin {} is greater than emax {}",
                emin, emax
            )));
        }
        self.emin = emin;
        self.emax = emax;
        Ok(())
    }

    pub fn subnormalize(&self) -> bool {
        self.subnormalize
    }

    pub fn set_subnormalize(&mut self, on: bool) {
        self.subnormalize = on;
    }

    /// Whether Real operations may return Complex results (sqrt and pow of
    /// negative bases) instead of NaN.
    pub fn allow_complex(&self) -> bool {
        self.allow_complex
    }

    pub fn set_allow_complex(&mut self, on: bool) {
        self.allow_complex = on;
    }

    pub fn traps(&self) -> Flags {
        self.traps
    }

    pub fn set_traps(&mut self, traps: Flags) {
        self.traps = traps;
    }

    /// Enable or disable the trap for one flag.
    pub fn trap(&mut self, flag: Flag, on: bool) {
        self.traps.set(flag.bit(), on);
    }

    /// Sticky status flags raised since the last reset.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    /// Lower every sticky flag.
    pub fn clear_flags(&mut self) {
        self.flags = Flags::empty();
    }

    /// OR `flags` into the sticky set without consulting traps.
    pub fn raise(&mut self, flags: Flags) {
        self.flags |= flags;
    }

    /// Apply an override permanently.
    pub fn apply(&mut self, overrides: &ContextOverride) -> Result<()> {
        overrides.apply_to(self)
    }

    // ========================================================================
    // Signalling
    // ========================================================================

    /// Record `raised` in the sticky flags and fail if any of them is
    /// trapped.
    pub fn signal(&mut self, operation: &'static str, raised: Flags) -> Result<()> {
        if raised.is_empty() {
            return Ok(());
        }
        self.flags |= raised;
        debug!(operation, raised = ?raised, sticky = ?self.flags, "context flags raised");
        match (raised & self.traps).first() {
            Some(flag) => {
                debug!(operation, %flag, "trap enabled, aborting operation");
                Err(Error::Trapped { flag, operation })
            }
            None => Ok(()),
        }
    }

    /// Signal Inexact when the kernel's ternary value is not `Equal`.
    pub(crate) fn signal_inexact(&mut self, operation: &'static str, dir: Ordering) -> Result<()> {
        if dir == Ordering::Equal {
            Ok(())
        } else {
            self.signal(operation, Flags::INEXACT)
        }
    }

    // ========================================================================
    // Scoped overrides
    // ========================================================================

    /// Apply `overrides` until the returned guard is dropped.
    ///
    /// The previous configuration is restored on every exit path. Flags
    /// raised inside the scope stay raised.
    pub fn scoped(&mut self, overrides: &ContextOverride) -> Result<ScopedContext<'_>> {
        let saved = *self;
        overrides.apply_to(self)?;
        debug!(overrides = ?overrides, "context override entered");
        Ok(ScopedContext { ctx: self, saved })
    }

    /// Run `f` under `overrides`, restoring the configuration afterwards.
    pub fn with_override<R>(
        &mut self,
        overrides: &ContextOverride,
        f: impl FnOnce(&mut Context) -> Result<R>,
    ) -> Result<R> {
        let mut scope = self.scoped(overrides)?;
        f(&mut scope)
    }

    /// Snapshot of the configuration as an override record.
    pub fn config(&self) -> ContextOverride {
        ContextOverride {
            precision: Some(self.precision),
            real_prec: Some(self.real_prec),
            imag_prec: Some(self.imag_prec),
            rounding: Some(self.rounding),
            emin: Some(self.emin),
            emax: Some(self.emax),
            traps: Some(self.traps),
            subnormalize: Some(self.subnormalize),
            allow_complex: Some(self.allow_complex),
        }
    }
}

/// Precision and emax of the binary formats from 64 bits up.
fn ieee_wide(bits: u32) -> Result<(u32, i32)> {
    let precision = bits - (4.0 * f64::from(bits).log2()).round() as u32 + 13;
    let shift = bits - precision - 1;
    if shift >= 31 {
        return Err(Error::invalid_context(format!(
            "IEEE format with {} bits exceeds the exponent range",
            bits
        )));
    }
    Ok((precision, 1i32 << shift))
}

/// Largest `emax` any context accepts.
pub fn emax_max() -> i32 {
    rug::float::exp_max()
}

/// Smallest `emin` any context accepts.
pub fn emin_min() -> i32 {
    rug::float::exp_min()
}

/// Largest working precision any context accepts.
pub fn max_precision() -> u32 {
    rug::float::prec_max()
}

fn validate_prec(field: &str, precision: u32) -> Result<()> {
    let (lo, hi) = (rug::float::prec_min(), max_precision());
    if (lo..=hi).contains(&precision) {
        Ok(())
    } else {
        Err(Error::invalid_context(format!(
            "{} {} outside {}..={}",
            field, precision, lo, hi
        )))
    }
}

// ============================================================================
// Overrides
// ============================================================================

/// A partial context configuration.
///
/// Every field is optional; absent fields keep the enclosing context's
/// value. Used for one-shot overrides, scoped overrides and config files.
///
/// `real_prec` and `imag_prec` are doubly optional: `Some(None)` makes the
/// component follow `precision` again. Config files can only set a bit
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextOverride {
    pub precision: Option<u32>,
    pub real_prec: Option<Option<u32>>,
    pub imag_prec: Option<Option<u32>>,
    pub rounding: Option<RoundingMode>,
    pub emin: Option<i32>,
    pub emax: Option<i32>,
    pub traps: Option<Flags>,
    pub subnormalize: Option<bool>,
    pub allow_complex: Option<bool>,
}

impl ContextOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an override record from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn real_prec(mut self, precision: u32) -> Self {
        self.real_prec = Some(Some(precision));
        self
    }

    /// Make the real part follow `precision` again.
    pub fn clear_real_prec(mut self) -> Self {
        self.real_prec = Some(None);
        self
    }

    pub fn imag_prec(mut self, precision: u32) -> Self {
        self.imag_prec = Some(Some(precision));
        self
    }

    /// Make the imaginary part follow `precision` again.
    pub fn clear_imag_prec(mut self) -> Self {
        self.imag_prec = Some(None);
        self
    }

    pub fn rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = Some(rounding);
        self
    }

    pub fn emin(mut self, emin: i32) -> Self {
        self.emin = Some(emin);
        self
    }

    pub fn emax(mut self, emax: i32) -> Self {
        self.emax = Some(emax);
        self
    }

    pub fn traps(mut self, traps: Flags) -> Self {
        self.traps = Some(traps);
        self
    }

    pub fn subnormalize(mut self, on: bool) -> Self {
        self.subnormalize = Some(on);
        self
    }

    pub fn allow_complex(mut self, on: bool) -> Self {
        self.allow_complex = Some(on);
        self
    }

    /// Apply the set fields to `ctx`.
    ///
    /// Either every field is applied or, on a validation error, `ctx` is
    /// left untouched.
    pub fn apply_to(&self, ctx: &mut Context) -> Result<()> {
        let mut next = *ctx;
        if let Some(p) = self.precision {
            next.set_precision(p)?;
        }
        if let Some(p) = self.real_prec {
            next.set_real_prec(p)?;
        }
        if let Some(p) = self.imag_prec {
            next.set_imag_prec(p)?;
        }
        if let Some(r) = self.rounding {
            next.rounding = r;
        }
        if self.emin.is_some() || self.emax.is_some() {
            next.set_exponent_range(
                self.emin.unwrap_or(next.emin),
                self.emax.unwrap_or(next.emax),
            )?;
        }
        if let Some(t) = self.traps {
            next.traps = t;
        }
        if let Some(s) = self.subnormalize {
            next.subnormalize = s;
        }
        if let Some(a) = self.allow_complex {
            next.allow_complex = a;
        }
        *ctx = next;
        Ok(())
    }
}

// ============================================================================
// Scope guard
// ============================================================================

/// RAII guard returned by [`Context::scoped`].
///
/// Dereferences to the overridden context. Dropping it restores the saved
/// configuration while keeping the sticky flags.
pub struct ScopedContext<'a> {
    ctx: &'a mut Context,
    saved: Context,
}

impl Deref for ScopedContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for ScopedContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for ScopedContext<'_> {
    fn drop(&mut self) {
        let flags = self.ctx.flags;
        *self.ctx = self.saved;
        self.ctx.flags = flags;
        debug!(precision = self.ctx.precision, "context override restored");
    }
}
