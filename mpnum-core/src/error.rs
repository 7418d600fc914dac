// mpnum-core - Error types for the numeric core
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for operand classification, coercion and dispatch.
//!
//! Sticky context flags are not errors. A flag only becomes an [`Error`]
//! when the active context traps it, in which case the operation fails with
//! [`Error::Trapped`] and produces no value.

use thiserror::Error;

use crate::context::Flag;
use crate::number::TowerLevel;

/// Result type for numeric operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while classifying, coercing or computing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Operand is not part of the numeric tower and exposes no numeric protocol
    #[error("{operation}: expected {expected}, got {got}")]
    TypeMismatch {
        operation: &'static str,
        expected: &'static str,
        got: String,
    },
    /// A coercion would lose information the caller did not ask to lose
    #[error("cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: &'static str,
        to: TowerLevel,
        reason: &'static str,
    },
    /// Exact (Integer/Rational) division or modulus by zero
    #[error("{operation}: division by zero")]
    DivisionByZero { operation: &'static str },
    /// Argument outside the operation's domain
    #[error("{operation}: {message}")]
    Domain {
        operation: &'static str,
        message: String,
    },
    /// A context condition was raised while its trap was enabled
    #[error("{operation}: {flag} trapped")]
    Trapped {
        flag: Flag,
        operation: &'static str,
    },
    /// Rejected context configuration
    #[error("invalid context: {0}")]
    InvalidContext(String),
    /// Malformed configuration text
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a type mismatch for an operand of the given type.
    pub fn type_mismatch(
        operation: &'static str,
        expected: &'static str,
        got: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            operation,
            expected,
            got: got.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(from: &'static str, to: TowerLevel, reason: &'static str) -> Self {
        Error::Conversion { from, to, reason }
    }

    /// Create a division by zero error.
    pub fn division_by_zero(operation: &'static str) -> Self {
        Error::DivisionByZero { operation }
    }

    /// Create a domain error.
    pub fn domain(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Domain {
            operation,
            message: message.into(),
        }
    }

    /// Create an invalid context error.
    pub fn invalid_context(message: impl Into<String>) -> Self {
        Error::InvalidContext(message.into())
    }

    /// True if this error was produced by an enabled trap.
    pub fn is_trap(&self) -> bool {
        matches!(self, Error::Trapped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::division_by_zero("div").to_string(),
            "div: division by zero"
        );
        assert_eq!(
            Error::type_mismatch("add", "number", "string").to_string(),
            "add: expected number, got string"
        );
        assert_eq!(
            Error::conversion("rational", TowerLevel::Integer, "value is not integral")
                .to_string(),
            "cannot convert rational to integer: value is not integral"
        );
        assert_eq!(
            Error::Trapped {
                flag: Flag::Overflow,
                operation: "mul"
            }
            .to_string(),
            "mul: overflow trapped"
        );
    }

    #[test]
    fn test_is_trap() {
        assert!(
            Error::Trapped {
                flag: Flag::Inexact,
                operation: "add"
            }
            .is_trap()
        );
        assert!(!Error::division_by_zero("div").is_trap());
    }
}
