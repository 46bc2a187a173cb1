//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from the orchestrator, wallet, and gateway to HTTP
//! status codes with a JSON error body. Internal error details are never
//! exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use karigar_booking::OrchestratorError;
use karigar_gateway::{GatewayError, WebhookError};
use karigar_ledger::LedgerError;
use karigar_wallet::WalletError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication failure — missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict with current resource state: illegal transition or
    /// unsatisfied gate (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The payment gateway is unreachable or not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::ServiceUnavailable { .. }
            | GatewayError::Timeout { .. }
            | GatewayError::NotConfigured { .. } => Self::ServiceUnavailable(err.to_string()),
            GatewayError::OrderRejected { .. } | GatewayError::RefundRejected { .. } => {
                Self::Validation(err.to_string())
            }
            GatewayError::RefundNotFound { .. } => Self::NotFound(err.to_string()),
        }
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        match &err {
            WalletError::UnknownPartner { .. } => Self::NotFound(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::UnknownIntent { .. } | LedgerError::UnknownRefund { .. } => {
                Self::NotFound(err.to_string())
            }
            LedgerError::DuplicateIntent { .. } | LedgerError::NotCaptured { .. } => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match &err {
            WebhookError::InvalidSignature | WebhookError::MalformedSignature { .. } => {
                Self::Unauthorized(err.to_string())
            }
            WebhookError::MalformedPayload { .. } => Self::Validation(err.to_string()),
        }
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::BookingNotFound { .. } => Self::NotFound(err.to_string()),
            OrchestratorError::State(_)
            | OrchestratorError::GateNotSatisfied { .. }
            | OrchestratorError::ServiceChargeNotSet { .. } => Self::Conflict(err.to_string()),
            OrchestratorError::Validation { .. } | OrchestratorError::Billing(_) => {
                Self::Validation(err.to_string())
            }
            OrchestratorError::Gateway(e) => e.into(),
            OrchestratorError::Ledger(e) => e.into(),
            OrchestratorError::Wallet(e) => e.into(),
            OrchestratorError::Webhook(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use karigar_state::{BookingState, StateError};

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::NotFound("x".into()).status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_and_code().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Validation("x".into()).status_and_code().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::ServiceUnavailable("x".into()).status_and_code().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn illegal_transition_maps_to_conflict() {
        let err: AppError = OrchestratorError::State(StateError::IllegalTransition {
            from: BookingState::Created,
            to: BookingState::Completed,
        })
        .into();
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn gate_not_satisfied_maps_to_conflict() {
        let err: AppError = OrchestratorError::GateNotSatisfied {
            gate: "payment",
            reason: "no captured final payment".into(),
        }
        .into();
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_signature_maps_to_unauthorized() {
        let err: AppError = WebhookError::InvalidSignature.into();
        assert_eq!(err.status_and_code().0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn gateway_outage_maps_to_service_unavailable() {
        let err: AppError = GatewayError::ServiceUnavailable {
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(err.status_and_code().0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn wallet_errors_map_to_validation() {
        let err: AppError = WalletError::InsufficientBalance {
            available_minor: 100,
            requested_minor: 500,
        }
        .into();
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
        let err: AppError = WalletError::BelowMinimum {
            minimum_minor: 50_000,
            requested_minor: 10,
        }
        .into();
        assert_eq!(err.status_and_code().0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn internal_error_details_do_not_leak() {
        let (status, body) = response_parts(AppError::Internal("db password wrong".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("password"));
    }

    #[tokio::test]
    async fn conflict_body_carries_message() {
        let (status, body) = response_parts(AppError::Conflict("already completed".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "CONFLICT");
        assert!(body.error.message.contains("already completed"));
    }
}
