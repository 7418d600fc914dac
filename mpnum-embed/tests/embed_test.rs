// mpnum-embed integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tests for the mpnum-embed host API.

use mpnum_embed::{
    ContextOverride, Error, Flag, Flags, FromNumber, IntoNumber, Number, RoundingMode, add,
    clear_flags, div, divmod, flags, get_context, local_context, mul, pow, set_context, sqrt, sub,
    with_context,
};
use pretty_assertions::assert_eq;

// =============================================================================
// Type Conversion Edge Cases (boundary values)
// =============================================================================

mod type_conversion {
    use super::*;

    #[test]
    fn native_integers_never_overflow() {
        let sum = add(i64::MAX, i64::MAX).unwrap();
        let back = i128::from_number(&sum).unwrap();
        assert_eq!(back, 2 * i128::from(i64::MAX));
        assert!(i64::from_number(&sum).is_err());

        let product = mul(u64::MAX, u64::MAX).unwrap();
        assert_eq!(u128::from_number(&product).unwrap(), u128::from(u64::MAX) * u128::from(u64::MAX));
    }

    #[test]
    fn float_boundary_values() {
        let inf = div(1.0, 0.0).unwrap();
        let inf = f64::from_number(&inf).unwrap();
        assert!(inf.is_infinite() && inf.is_sign_positive());

        let neg_inf = f64::from_number(&div(-1.0, 0.0).unwrap()).unwrap();
        assert!(neg_inf.is_infinite() && neg_inf.is_sign_negative());
        clear_flags();
    }

    #[test]
    fn round_trip_through_number() {
        let n = (1.5, -2.0).into_number();
        assert_eq!(n, Number::complex(1.5, -2.0));
        assert_eq!(f64::from_number(&0.1f64.into_number()).unwrap(), 0.1);
        assert!(i32::from_number(&Number::complex(1.0, 0.0)).is_err());
    }
}

// =============================================================================
// Current context
// =============================================================================

mod current_context {
    use super::*;

    #[test]
    fn local_context_restores_on_error() {
        let before = get_context();
        let result = (|| -> mpnum_embed::Result<Number> {
            let _guard = local_context(&ContextOverride::new().precision(200))?;
            div(5, 0)
        })();
        assert!(matches!(result, Err(Error::DivisionByZero { .. })));
        assert_eq!(get_context(), before);
    }

    #[test]
    fn traps_on_the_current_context() {
        let _guard = local_context(&ContextOverride::new().traps(Flags::INEXACT)).unwrap();
        let err = div(1.0, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::Trapped {
                flag: Flag::Inexact,
                ..
            }
        ));
        // Exact work is unaffected
        assert_eq!(div(1, 4).unwrap(), Number::rational(1, 4).unwrap());
        clear_flags();
    }

    #[test]
    fn with_context_mutations_persist() {
        with_context(|ctx| ctx.set_rounding(RoundingMode::ToZero));
        assert_eq!(get_context().rounding(), RoundingMode::ToZero);
        set_context(mpnum_embed::Context::new());
    }

    #[test]
    fn flags_accumulate_across_calls() {
        clear_flags();
        sub(f64::INFINITY, f64::INFINITY).unwrap();
        sqrt(2).unwrap();
        assert_eq!(flags(), Flags::INVALID_OP | Flags::INEXACT);
        clear_flags();
        assert!(flags().is_empty());
    }
}

// =============================================================================
// Operators
// =============================================================================

mod operators {
    use super::*;

    #[test]
    fn exact_results() {
        assert_eq!(
            mul(6, &Number::rational(1, 3).unwrap()).unwrap(),
            Number::rational(2, 1).unwrap()
        );
        assert_eq!(pow(2, -2).unwrap(), Number::rational(1, 4).unwrap());
        let (q, r) = divmod(&Number::rational(7, 2).unwrap(), 1).unwrap();
        assert_eq!(q, Number::integer(3));
        assert_eq!(r, Number::rational(1, 2).unwrap());
    }

    #[test]
    fn complex_power() {
        let i = Number::complex(0.0, 1.0);
        let v = pow(&i, 2).unwrap();
        assert_eq!(f64::from_number(&v).unwrap(), -1.0);
    }
}
