// mpnum-core - Operation results
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The value returned by the dispatcher, with the level it was computed at
//! and the flags the call raised.

use crate::context::Flags;
use crate::number::{Number, TowerLevel};

/// Result of one dispatch call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    value: Number,
    raised: Flags,
    newly_raised: Flags,
}

impl Outcome {
    /// Wrap `value`. `sticky_before` is the context's flag set before the
    /// call; flags in it are not counted as newly raised.
    pub(crate) fn new(value: Number, raised: Flags, sticky_before: Flags) -> Self {
        Outcome {
            value,
            raised,
            newly_raised: raised - sticky_before,
        }
    }

    pub fn value(&self) -> &Number {
        &self.value
    }

    pub fn into_value(self) -> Number {
        self.value
    }

    /// Tower level of the result.
    pub fn level(&self) -> TowerLevel {
        self.value.level()
    }

    /// Every flag this call raised.
    pub fn raised(&self) -> Flags {
        self.raised
    }

    /// Flags this call raised that were not already sticky.
    pub fn newly_raised(&self) -> Flags {
        self.newly_raised
    }

    /// True if no rounding took place.
    pub fn is_exact(&self) -> bool {
        !self.raised.contains(Flags::INEXACT)
    }
}

impl From<Outcome> for Number {
    fn from(outcome: Outcome) -> Self {
        outcome.value
    }
}
