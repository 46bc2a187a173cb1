//! # Money Primitives — Integer Minor Units
//!
//! All amounts in the system are `i64` values in the smallest currency
//! unit (paise, cents). PKR 250.00 is stored as `25000`. Floats never
//! appear in the money path.
//!
//! Arithmetic on amounts goes through the checked helpers below so that
//! an overflow surfaces as an error instead of a silent wrap.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// ISO 4217 currency code — exactly three ASCII uppercase letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and wrap a currency code (e.g., `"PKR"`, `"USD"`).
    ///
    /// Lowercase input is accepted and normalized to uppercase.
    pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
        let code = raw.into().trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::Validation(format!(
                "currency code must be three ASCII letters, got {code:?}"
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Add two minor-unit amounts, failing on `i64` overflow.
pub fn checked_add_minor(lhs: i64, rhs: i64) -> Result<i64, CoreError> {
    lhs.checked_add(rhs).ok_or(CoreError::AmountOverflow {
        lhs,
        op: '+',
        rhs,
    })
}

/// Subtract two minor-unit amounts, failing on `i64` overflow.
pub fn checked_sub_minor(lhs: i64, rhs: i64) -> Result<i64, CoreError> {
    lhs.checked_sub(rhs).ok_or(CoreError::AmountOverflow {
        lhs,
        op: '-',
        rhs,
    })
}
