//! # On-Site OTP Vault
//!
//! Proof of presence for the `ACCEPTED → IN_PROGRESS` gate: the customer
//! is issued a 6-digit code and reads it to the partner on-site. Codes do
//! not expire; re-issuing replaces the previous code, and the code is
//! cleared when the gated transition commits.

use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

use karigar_core::BookingId;

/// Per-booking OTP storage.
#[derive(Debug, Default)]
pub struct OtpVault {
    codes: Mutex<HashMap<BookingId, String>>,
}

impl OtpVault {
    /// Issue a fresh 6-digit code for a booking, replacing any previous one.
    pub fn issue(&self, booking_id: BookingId) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));
        self.codes.lock().insert(booking_id, code.clone());
        code
    }

    /// Check a supplied code against the stored one, in constant time.
    pub fn verify(&self, booking_id: &BookingId, supplied: &str) -> bool {
        let codes = self.codes.lock();
        match codes.get(booking_id) {
            Some(code) => code.as_bytes().ct_eq(supplied.as_bytes()).into(),
            None => false,
        }
    }

    /// Remove the code after the gated transition commits.
    pub fn clear(&self, booking_id: &BookingId) {
        self.codes.lock().remove(booking_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_verify_clear_roundtrip() {
        let vault = OtpVault::default();
        let booking = BookingId::new();
        let code = vault.issue(booking);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert!(vault.verify(&booking, &code));
        vault.clear(&booking);
        assert!(!vault.verify(&booking, &code));
    }

    #[test]
    fn reissue_invalidates_previous_code() {
        let vault = OtpVault::default();
        let booking = BookingId::new();
        let first = vault.issue(booking);
        let second = vault.issue(booking);
        assert!(vault.verify(&booking, &second));
        if first != second {
            assert!(!vault.verify(&booking, &first));
        }
    }

    #[test]
    fn wrong_code_and_unknown_booking_fail() {
        let vault = OtpVault::default();
        let booking = BookingId::new();
        vault.issue(booking);
        assert!(!vault.verify(&booking, "000000x"));
        assert!(!vault.verify(&BookingId::new(), "123456"));
    }
}
