//! # Invoice Calculator
//!
//! `subtotal = deposit + service_charge`
//! `tax      = round_half_up(subtotal * rate / 100)`
//! `total    = subtotal + tax`
//! `due      = total - amount_paid`
//!
//! The deposit is collected at booking creation, so `amount_paid` equals
//! the deposit by construction and `due` is what the final payment intent
//! must collect.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use karigar_core::{BookingId, CurrencyCode, Timestamp};

/// Errors from invoice computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// An input amount was negative.
    #[error("negative amount for {field}: {amount}")]
    NegativeAmount {
        /// Which input was negative.
        field: &'static str,
        /// The offending value in minor units.
        amount: i64,
    },

    /// Tax rate outside the supported 0..=100 percent range.
    #[error("tax rate out of range: {rate_percent}% (supported: 0..=100)")]
    TaxRateOutOfRange {
        /// The offending rate.
        rate_percent: u32,
    },

    /// Intermediate arithmetic exceeded the `i64` range.
    #[error("invoice arithmetic overflow (subtotal {subtotal_minor} minor units)")]
    Overflow {
        /// The subtotal that triggered the overflow.
        subtotal_minor: i64,
    },
}

/// A computed invoice for one booking.
///
/// Derived data — computed once per booking at the moment the completion
/// transition commits, then never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// The booking this invoice settles.
    pub booking_id: BookingId,
    /// Deposit collected at creation, minor units.
    pub deposit_minor: i64,
    /// Service charge entered by the partner, minor units.
    pub service_charge_minor: i64,
    /// Applied tax rate in whole percent.
    pub tax_rate_percent: u32,
    /// Computed tax, minor units.
    pub tax_minor: i64,
    /// Tax-inclusive total, minor units.
    pub total_minor: i64,
    /// Already collected (the deposit), minor units.
    pub amount_paid_minor: i64,
    /// Still owed, minor units.
    pub amount_due_minor: i64,
    /// Invoice currency.
    pub currency: CurrencyCode,
    /// When the invoice was computed.
    pub computed_at: Timestamp,
}

/// Compute the invoice for a booking.
///
/// Pure: no side effects, identical output for identical input (modulo
/// the `computed_at` stamp). See the module docs for the formula.
pub fn compute_invoice(
    booking_id: BookingId,
    deposit_minor: i64,
    service_charge_minor: i64,
    tax_rate_percent: u32,
    amount_paid_minor: i64,
    currency: CurrencyCode,
) -> Result<Invoice, BillingError> {
    for (field, amount) in [
        ("deposit", deposit_minor),
        ("service_charge", service_charge_minor),
        ("amount_paid", amount_paid_minor),
    ] {
        if amount < 0 {
            return Err(BillingError::NegativeAmount { field, amount });
        }
    }
    if tax_rate_percent > 100 {
        return Err(BillingError::TaxRateOutOfRange {
            rate_percent: tax_rate_percent,
        });
    }

    let subtotal = deposit_minor
        .checked_add(service_charge_minor)
        .ok_or(BillingError::Overflow {
            subtotal_minor: i64::MAX,
        })?;

    // Half-up rounding at the minor-unit boundary. Inputs are non-negative
    // i64 and the rate is at most 100, so the i128 product cannot overflow.
    let tax_wide = (subtotal as i128 * tax_rate_percent as i128 + 50) / 100;
    let tax = i64::try_from(tax_wide).map_err(|_| BillingError::Overflow {
        subtotal_minor: subtotal,
    })?;

    let total = subtotal.checked_add(tax).ok_or(BillingError::Overflow {
        subtotal_minor: subtotal,
    })?;
    let due = total
        .checked_sub(amount_paid_minor)
        .ok_or(BillingError::Overflow {
            subtotal_minor: subtotal,
        })?;

    Ok(Invoice {
        booking_id,
        deposit_minor,
        service_charge_minor,
        tax_rate_percent,
        tax_minor: tax,
        total_minor: total,
        amount_paid_minor,
        amount_due_minor: due,
        currency,
        computed_at: Timestamp::now(),
    })
}
