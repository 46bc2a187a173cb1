//! # Core Error Types
//!
//! Errors raised by the validated constructors in this crate. Domain
//! crates define their own error enums; this one only covers the
//! foundational types.

use thiserror::Error;

/// Errors from foundational type construction and arithmetic.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A validated constructor rejected its input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Minor-unit arithmetic overflowed the `i64` range.
    #[error("amount arithmetic overflow: {lhs} {op} {rhs}")]
    AmountOverflow {
        /// Left operand in minor units.
        lhs: i64,
        /// The operation that overflowed (`+` or `-`).
        op: char,
        /// Right operand in minor units.
        rhs: i64,
    },
}
