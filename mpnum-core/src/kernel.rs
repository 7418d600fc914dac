// mpnum-core - Kernel adapter for inexact results
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runs Real and Complex kernel operations under a [`Context`].
//!
//! The kernel rounds to a precision with a rounding mode and reports a
//! ternary value (the rounded result compared with the exact one). This
//! module turns that into context semantics: it fits the result into the
//! context's exponent range, emulates subnormals and derives the flags the
//! operation raised. Signalling the flags is left to the caller.

use std::cmp::Ordering;

use rug::float::{Round, Special};
use rug::{Complex, Float, Integer};

use crate::context::{Context, Flags, RoundingMode};

/// A rounded Real result and the flags it raised.
#[derive(Debug)]
pub(crate) struct RealResult {
    pub value: Float,
    pub raised: Flags,
}

/// A rounded Complex result and the flags it raised.
#[derive(Debug)]
pub(crate) struct ComplexResult {
    pub value: Complex,
    pub raised: Flags,
}

/// Evaluate `op` at `prec` bits under `ctx`.
///
/// `op` receives a precision and rounding mode and returns the rounded value
/// with its ternary. It may be called a second time at a reduced precision
/// when subnormal emulation is on, so that the final result is rounded only
/// once. `operand_nan` suppresses InvalidOp for NaN results that came from
/// NaN inputs.
pub(crate) fn round_real<F>(ctx: &Context, prec: u32, operand_nan: bool, op: F) -> RealResult
where
    F: Fn(u32, Round) -> (Float, Ordering),
{
    let round: Round = ctx.rounding().into();
    let (mut value, mut dir) = op(prec, round);
    let mut raised = Flags::empty();

    if value.is_nan() {
        if !operand_nan {
            raised |= Flags::INVALID_OP;
        }
        return RealResult { value, raised };
    }

    let exp = value.get_exp().map(i64::from);
    if let (true, Some(exp)) = (ctx.subnormalize(), exp) {
        let emin = i64::from(ctx.emin());
        if exp >= emin && exp < emin + i64::from(prec) - 1 {
            // exp - emin + 1 lies in 1..prec
            let reduced = (exp - emin + 1) as u32;
            let (mut sub, sub_dir) = op(reduced, round);
            sub.set_prec(prec);
            if sub_dir != Ordering::Equal {
                raised |= Flags::UNDERFLOW;
            }
            value = sub;
            dir = sub_dir;
        }
    }

    raised |= fit_range(&mut value, dir, ctx.rounding(), ctx.emin(), ctx.emax());
    RealResult { value, raised }
}

/// Evaluate a Complex `op` under `ctx`.
///
/// Each component is rounded to its own precision (`real_prec`,
/// `imag_prec`) and range-checked independently. There is no subnormal
/// emulation for Complex results.
pub(crate) fn round_complex<F>(ctx: &Context, operand_nan: bool, op: F) -> ComplexResult
where
    F: FnOnce((u32, u32), (Round, Round)) -> (Complex, (Ordering, Ordering)),
{
    let rounding = match ctx.rounding() {
        RoundingMode::AwayFromZero => RoundingMode::ToNearest,
        other => other,
    };
    let (mut value, (dir_re, dir_im)) =
        op((ctx.real_prec(), ctx.imag_prec()), rounding.complex_round());
    let mut raised = Flags::empty();

    if (value.real().is_nan() || value.imag().is_nan()) && !operand_nan {
        raised |= Flags::INVALID_OP;
    }
    raised |= fit_range(value.mut_real(), dir_re, rounding, ctx.emin(), ctx.emax());
    raised |= fit_range(value.mut_imag(), dir_im, rounding, ctx.emin(), ctx.emax());
    ComplexResult { value, raised }
}

/// Fit a rounded value into `emin..=emax`, replacing it by the appropriate
/// special or extreme value when it falls outside.
///
/// Returns Inexact for any inexact result, plus Overflow or Underflow when
/// the exponent left the range.
pub(crate) fn fit_range(
    value: &mut Float,
    dir: Ordering,
    rounding: RoundingMode,
    emin: i32,
    emax: i32,
) -> Flags {
    let inexact = if dir == Ordering::Equal {
        Flags::empty()
    } else {
        Flags::INEXACT
    };
    if value.is_nan() {
        return Flags::empty();
    }
    if value.is_infinite() {
        // Infinity from finite operands that the kernel could not represent
        return if inexact.is_empty() {
            Flags::empty()
        } else {
            Flags::OVERFLOW | Flags::INEXACT
        };
    }
    let Some(exp) = value.get_exp() else {
        // Zero
        return if inexact.is_empty() {
            Flags::empty()
        } else {
            Flags::UNDERFLOW | Flags::INEXACT
        };
    };

    let negative = value.is_sign_negative();
    let prec = value.prec();
    if exp > emax {
        *value = overflow_value(negative, prec, rounding, emax);
        Flags::OVERFLOW | Flags::INEXACT
    } else if exp < emin {
        // Toward zero in magnitude when the kernel rounded the magnitude down
        let magnitude_dir = if negative { dir.reverse() } else { dir };
        let tie_breaks_up = exp == emin - 1
            && (!is_power_of_two(value) || magnitude_dir == Ordering::Less);
        *value = underflow_value(negative, prec, rounding, emin, tie_breaks_up);
        Flags::UNDERFLOW | Flags::INEXACT
    } else {
        inexact
    }
}

/// Result of an overflow: infinity, or the largest finite value when the
/// rounding direction points back toward zero.
fn overflow_value(negative: bool, prec: u32, rounding: RoundingMode, emax: i32) -> Float {
    let to_infinity = match rounding {
        RoundingMode::ToNearest | RoundingMode::AwayFromZero => true,
        RoundingMode::ToZero => false,
        RoundingMode::ToInf => !negative,
        RoundingMode::ToNegInf => negative,
    };
    if to_infinity {
        let special = if negative {
            Special::NegInfinity
        } else {
            Special::Infinity
        };
        return Float::with_val(prec, special);
    }
    // (2^p - 1) * 2^(emax - p)
    let ones = (Integer::from(1) << prec) - 1u32;
    let shift = i64::from(emax) - i64::from(prec);
    let max = Float::with_val(prec, ones) << shift as i32;
    if negative { -max } else { max }
}

/// Result of an underflow: a signed zero, or the smallest positive value
/// `2^(emin - 1)` with the operand's sign.
///
/// `nearest_up` tells round-to-nearest whether the value lies above half of
/// the smallest value.
fn underflow_value(
    negative: bool,
    prec: u32,
    rounding: RoundingMode,
    emin: i32,
    nearest_up: bool,
) -> Float {
    let to_min = match rounding {
        RoundingMode::ToNearest => nearest_up,
        RoundingMode::AwayFromZero => true,
        RoundingMode::ToZero => false,
        RoundingMode::ToInf => !negative,
        RoundingMode::ToNegInf => negative,
    };
    if to_min {
        let min = Float::with_val(prec, 1) << (emin - 1);
        if negative { -min } else { min }
    } else {
        let special = if negative {
            Special::NegZero
        } else {
            Special::Zero
        };
        Float::with_val(prec, special)
    }
}

fn is_power_of_two(value: &Float) -> bool {
    value
        .to_integer_exp()
        .is_some_and(|(m, _)| m.abs().is_power_of_two())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow2(e: i32) -> Float {
        Float::with_val(53, 1) << e
    }

    fn add(a: Float, b: Float) -> impl Fn(u32, Round) -> (Float, Ordering) {
        move |p, r| Float::with_val_round(p, &a + &b, r)
    }

    fn add_f64(a: f64, b: f64) -> impl Fn(u32, Round) -> (Float, Ordering) {
        add(Float::with_val(53, a), Float::with_val(53, b))
    }

    #[test]
    fn test_exact_result_raises_nothing() {
        let ctx = Context::new();
        let res = round_real(&ctx, 53, false, add_f64(1.0, 2.0));
        assert_eq!(res.value, 3.0);
        assert!(res.raised.is_empty());
    }

    #[test]
    fn test_rounded_result_is_inexact() {
        let ctx = Context::new();
        let res = round_real(&ctx, 24, false, add(pow2(0), pow2(-30)));
        assert_eq!(res.value, 1.0);
        assert_eq!(res.raised, Flags::INEXACT);
    }

    #[test]
    fn test_nan_from_finite_is_invalid() {
        let ctx = Context::new();
        let res = round_real(&ctx, 53, false, add_f64(f64::INFINITY, f64::NEG_INFINITY));
        assert!(res.value.is_nan());
        assert_eq!(res.raised, Flags::INVALID_OP);

        let res = round_real(&ctx, 53, true, add_f64(f64::NAN, 1.0));
        assert!(res.raised.is_empty());
    }

    #[test]
    fn test_overflow_to_infinity_or_max() {
        let mut ctx = Context::new();
        ctx.set_emax(10).unwrap();
        // 2^10 has exponent 11
        let res = round_real(&ctx, 53, false, add_f64(1024.0, 0.0));
        assert!(res.value.is_infinite());
        assert_eq!(res.raised, Flags::OVERFLOW | Flags::INEXACT);

        ctx.set_rounding(RoundingMode::ToZero);
        let res = round_real(&ctx, 4, false, add_f64(1024.0, 0.0));
        // (2^4 - 1) * 2^6
        assert_eq!(res.value, 960.0);
        assert_eq!(res.raised, Flags::OVERFLOW | Flags::INEXACT);
    }

    #[test]
    fn test_underflow_to_zero_or_min() {
        let mut ctx = Context::new();
        ctx.set_emin(-10).unwrap();
        let res = round_real(&ctx, 53, false, add(pow2(-20), pow2(-60)));
        assert!(res.value.is_zero());
        assert_eq!(res.raised, Flags::UNDERFLOW | Flags::INEXACT);

        ctx.set_rounding(RoundingMode::ToInf);
        let res = round_real(&ctx, 53, false, add(pow2(-20), pow2(-60)));
        assert_eq!(res.value, pow2(-11));
    }

    #[test]
    fn test_underflow_nearest_above_half_rounds_to_min() {
        let mut ctx = Context::new();
        ctx.set_emin(-10).unwrap();
        // 0.75 * 2^-11 lies above half of 2^-11
        let res = round_real(&ctx, 53, false, add(pow2(-12), pow2(-13)));
        assert_eq!(res.value, pow2(-11));
        // exactly half ties to zero
        let res = round_real(&ctx, 53, false, add(pow2(-13), pow2(-13)));
        assert!(res.value.is_zero());
    }

    #[test]
    fn test_subnormal_rounds_once_at_reduced_precision() {
        let ctx = Context::ieee(64).unwrap();
        // The smallest double subnormal plus a quarter of it rounds back down
        let res = round_real(&ctx, 53, false, add(pow2(-1074), pow2(-1076)));
        assert_eq!(res.value, pow2(-1074));
        assert_eq!(res.value.prec(), 53);
        assert_eq!(res.raised, Flags::UNDERFLOW | Flags::INEXACT);

        // An exact subnormal raises nothing
        let res = round_real(&ctx, 53, false, add(pow2(-1074), pow2(-1074)));
        assert_eq!(res.value, pow2(-1073));
        assert!(res.raised.is_empty());
    }

    #[test]
    fn test_complex_components_checked_independently() {
        let mut ctx = Context::new();
        ctx.set_emax(10).unwrap();
        let a = Complex::with_val(53, (4096.0, 1.0));
        let res = round_complex(&ctx, false, |p, r| Complex::with_val_round(p, &a, r));
        assert!(res.value.real().is_infinite());
        assert_eq!(*res.value.imag(), 1.0);
        assert_eq!(res.raised, Flags::OVERFLOW | Flags::INEXACT);
    }
}
