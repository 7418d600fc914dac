// mpnum-core - Property-based tests for the numeric tower
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for dispatch and rounding.
//!
//! Tests the following properties:
//! - Floor division identity `(a // b) * b + a % b == a` at the exact levels
//! - Level selection is symmetric under operand swap
//! - Rational -> Real at precision p stays within relative error 2^-p
//! - Sticky flags only grow until cleared
//! - Directed rounding brackets the exact result

mod common;

use common::*;
use mpnum_core::{CompareOp, TowerLevel, apply_divmod, compare};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_nonzero() -> impl Strategy<Value = i64> {
    prop_oneof![1i64..=i64::MAX, i64::MIN..=-1i64]
}

fn arb_finite() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("must be finite", |f| f.is_finite())
}

/// A value at any tower level.
fn arb_number() -> impl Strategy<Value = Number> {
    prop_oneof![
        any::<i64>().prop_map(int),
        (any::<i64>(), arb_nonzero()).prop_map(|(n, d)| rat(n, d)),
        arb_finite().prop_map(real),
        (arb_finite(), arb_finite()).prop_map(|(re, im)| Number::complex(re, im)),
    ]
}

fn arb_precision() -> impl Strategy<Value = u32> {
    2u32..512
}

// =============================================================================
// Exact levels
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Integer floor division and modulus recombine exactly
    #[test]
    fn integer_floor_identity(a in any::<i64>(), b in arb_nonzero()) {
        let mut ctx = Context::new();
        let (q, r) = apply_divmod(a, b, &mut ctx, None).unwrap();
        let back = run(BinaryOp::Mul, q.value(), b, &mut ctx).unwrap();
        let back = run(BinaryOp::Add, back.value(), r.value(), &mut ctx).unwrap();
        prop_assert_eq!(back.value(), &int(a));
        prop_assert!(ctx.flags().is_empty());
    }

    /// Rational floor division and modulus recombine exactly
    #[test]
    fn rational_floor_identity(
        an in any::<i32>(), ad in 1i64..10_000,
        bn in arb_nonzero(), bd in 1i64..10_000,
    ) {
        let (a, b) = (rat(i64::from(an), ad), rat(bn, bd));
        let mut ctx = Context::new();
        let (q, r) = apply_divmod(&a, &b, &mut ctx, None).unwrap();
        prop_assert_eq!(q.level(), TowerLevel::Integer);
        let back = run(BinaryOp::Mul, q.value(), &b, &mut ctx).unwrap();
        let back = run(BinaryOp::Add, back.value(), r.value(), &mut ctx).unwrap();
        prop_assert!(compare(CompareOp::Eq, back.value(), &a).unwrap());
        prop_assert!(ctx.flags().is_empty());
    }

    /// Exact division by zero never produces a value
    #[test]
    fn exact_zero_divisor(x in arb_number()) {
        let mut ctx = Context::new();
        for op in [BinaryOp::Div, BinaryOp::FloorDiv, BinaryOp::Mod] {
            let is_division_by_zero = matches!(
                run(op, &x, 0, &mut ctx),
                Err(Error::DivisionByZero { .. })
            );
            prop_assert!(is_division_by_zero);
        }
    }
}

// =============================================================================
// Level selection
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The result level does not depend on operand order
    #[test]
    fn level_is_symmetric(x in arb_number(), y in arb_number()) {
        let mut ctx = Context::new();
        for op in [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul] {
            let forward = run(op, &x, &y, &mut ctx).unwrap();
            let backward = run(op, &y, &x, &mut ctx).unwrap();
            prop_assert_eq!(forward.level(), backward.level());
            prop_assert_eq!(forward.level(), x.level().max(y.level()));
        }
    }
}

// =============================================================================
// Rounding
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Rational -> Real -> Rational has relative error at most 2^-p
    #[test]
    fn rational_to_real_error_bound(
        n in arb_nonzero(), d in arb_nonzero(), p in arb_precision(),
    ) {
        let q = Rational::from((n, d));
        let mut ctx = Context::new();
        ctx.set_precision(p).unwrap();
        // Adding a Real zero forces the conversion
        let out = run(BinaryOp::Add, &Number::Rational(q.clone()), 0.0, &mut ctx).unwrap();
        let back = out.value().as_real().unwrap().to_rational().unwrap();

        let err = Rational::from(&back - &q).abs();
        let bound = Rational::from(q.abs_ref()) >> p;
        prop_assert!(err <= bound, "error {} above bound {}", err, bound);
    }

    /// ToNegInf and ToInf results bracket the exact quotient
    #[test]
    fn directed_rounding_brackets(a in any::<i32>(), b in arb_nonzero(), p in arb_precision()) {
        let exact = Rational::from((a, b));
        let mut ctx = Context::new();
        ctx.set_precision(p).unwrap();

        ctx.set_rounding(RoundingMode::ToNegInf);
        let lo = run(BinaryOp::Div, f64::from(a), b, &mut ctx).unwrap();
        ctx.set_rounding(RoundingMode::ToInf);
        let hi = run(BinaryOp::Div, f64::from(a), b, &mut ctx).unwrap();

        let lo = lo.value().as_real().unwrap();
        let hi = hi.value().as_real().unwrap();
        prop_assert!(*lo <= exact);
        prop_assert!(*hi >= exact);
    }

    /// Sticky flags never shrink without clear_flags
    #[test]
    fn sticky_flags_are_monotonic(values in prop::collection::vec((arb_finite(), arb_finite()), 1..20)) {
        let mut ctx = Context::ieee(32).unwrap();
        let mut seen = Flags::empty();
        for (x, y) in values {
            for op in [BinaryOp::Add, BinaryOp::Mul, BinaryOp::Div] {
                let out = run(op, x, y, &mut ctx).unwrap();
                prop_assert!(ctx.flags().contains(seen));
                prop_assert!(ctx.flags().contains(out.raised()));
                seen = ctx.flags();
            }
        }
    }
}
