//! # Webhook Signature Verification
//!
//! The gateway signs each webhook delivery with an HMAC-SHA256 over the
//! exact request body bytes, hex-encoded into a signature header. The
//! verifier recomputes the MAC with the shared secret and compares in
//! constant time (`subtle`); parsing the JSON happens only after the
//! signature checks out, so a forged body is never even deserialized.
//!
//! Deliveries are at-least-once and may arrive out of order. Verification
//! is stateless — deduplication is the payment ledger's job.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use karigar_core::{CurrencyCode, IntentId, RefundId};

type HmacSha256 = Hmac<Sha256>;

/// Errors from webhook verification and parsing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signature header did not match the payload MAC.
    #[error("webhook signature mismatch")]
    InvalidSignature,

    /// The signature header was not valid hex of the right length.
    #[error("malformed webhook signature header: {reason}")]
    MalformedSignature {
        /// What was wrong with the header.
        reason: String,
    },

    /// The (verified) payload was not a well-formed event.
    #[error("malformed webhook payload: {reason}")]
    MalformedPayload {
        /// Parse failure detail.
        reason: String,
    },
}

/// The payment event kinds the gateway delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    /// Payment for an order was captured.
    Captured,
    /// Payment for an order failed.
    Failed,
    /// A refund settled back to the customer.
    RefundProcessed,
}

impl std::fmt::Display for WebhookEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Captured => write!(f, "captured"),
            Self::Failed => write!(f, "failed"),
            Self::RefundProcessed => write!(f, "refund_processed"),
        }
    }
}

/// A verified, parsed webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// What happened.
    pub event: WebhookEventKind,
    /// The gateway order the event refers to.
    pub order_id: IntentId,
    /// The refund the event refers to (refund events only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<RefundId>,
    /// Event amount in minor units.
    pub amount_minor: i64,
    /// Event currency.
    pub currency: CurrencyCode,
    /// Gateway-side payment reference (e.g. `pay_…`), if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
}

/// Verifies webhook deliveries against the shared gateway secret.
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret.
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Build a verifier from the shared secret configured with the gateway.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify `signature_hex` against the raw body bytes.
    ///
    /// The body must be the exact wire bytes — re-serializing parsed JSON
    /// would change the byte sequence and break the MAC.
    pub fn verify(&self, raw_body: &[u8], signature_hex: &str) -> Result<(), WebhookError> {
        let supplied =
            hex::decode(signature_hex.trim()).map_err(|e| WebhookError::MalformedSignature {
                reason: format!("not valid hex: {e}"),
            })?;
        if supplied.len() != 32 {
            return Err(WebhookError::MalformedSignature {
                reason: format!("expected 32 MAC bytes, got {}", supplied.len()),
            });
        }

        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(raw_body);
        let expected = mac.finalize().into_bytes();

        if expected.ct_eq(supplied.as_slice()).into() {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Verify the delivery, then parse the payload into a [`WebhookEvent`].
    pub fn verify_and_parse(
        &self,
        raw_body: &[u8],
        signature_hex: &str,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify(raw_body, signature_hex)?;
        serde_json::from_slice(raw_body).map_err(|e| WebhookError::MalformedPayload {
            reason: e.to_string(),
        })
    }

    /// Compute the hex signature for a body. Test and tooling helper —
    /// the service never signs outbound traffic.
    pub fn sign_hex(&self, raw_body: &[u8]) -> String {
        let mut mac = match <HmacSha256 as Mac>::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length; unreachable in practice.
            Err(_) => return String::new(),
        };
        mac.update(raw_body);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test_0123456789";

    fn captured_body() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "event": "captured",
            "order_id": "order_abc",
            "amount_minor": 98_900,
            "currency": "PKR",
            "payment_ref": "pay_xyz",
        }))
        .unwrap()
    }

    #[test]
    fn valid_signature_verifies_and_parses() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = captured_body();
        let sig = verifier.sign_hex(&body);

        let event = verifier.verify_and_parse(&body, &sig).unwrap();
        assert_eq!(event.event, WebhookEventKind::Captured);
        assert_eq!(event.order_id.as_str(), "order_abc");
        assert_eq!(event.amount_minor, 98_900);
    }

    #[test]
    fn tampered_body_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = captured_body();
        let sig = verifier.sign_hex(&body);

        let mut tampered = body.clone();
        // Flip one byte of the amount.
        let pos = tampered.iter().position(|&b| b == b'9').unwrap();
        tampered[pos] = b'1';

        assert!(matches!(
            verifier.verify_and_parse(&tampered, &sig),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = WebhookVerifier::new(b"whsec_other".to_vec());
        let verifier = WebhookVerifier::new(SECRET);
        let body = captured_body();
        let sig = signer.sign_hex(&body);
        assert!(matches!(
            verifier.verify(&body, &sig),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn malformed_signature_header_is_distinguished() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = captured_body();
        assert!(matches!(
            verifier.verify(&body, "not-hex!"),
            Err(WebhookError::MalformedSignature { .. })
        ));
        assert!(matches!(
            verifier.verify(&body, "abcd"),
            Err(WebhookError::MalformedSignature { .. })
        ));
    }

    #[test]
    fn refund_event_parses_refund_id() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = serde_json::to_vec(&serde_json::json!({
            "event": "refund_processed",
            "order_id": "order_abc",
            "refund_id": "rfnd_1",
            "amount_minor": 25_000,
            "currency": "PKR",
        }))
        .unwrap();
        let sig = verifier.sign_hex(&body);
        let event = verifier.verify_and_parse(&body, &sig).unwrap();
        assert_eq!(event.event, WebhookEventKind::RefundProcessed);
        assert_eq!(event.refund_id.unwrap().as_str(), "rfnd_1");
    }

    #[test]
    fn garbage_after_valid_signature_is_malformed_payload() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = b"not json at all".to_vec();
        let sig = verifier.sign_hex(&body);
        assert!(matches!(
            verifier.verify_and_parse(&body, &sig),
            Err(WebhookError::MalformedPayload { .. })
        ));
    }
}
