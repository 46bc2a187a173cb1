//! # Authentication Middleware
//!
//! Single bearer token for all authenticated routes, compared in constant
//! time. Health probes and the gateway webhook are mounted outside this
//! middleware; the webhook authenticates via its HMAC signature instead.

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Bearer token configuration injected as an extension.
#[derive(Clone)]
pub struct AuthConfig {
    /// The expected token.
    pub token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token.
        f.debug_struct("AuthConfig").finish_non_exhaustive()
    }
}

/// Reject requests without a valid `Authorization: Bearer <token>` header.
pub async fn auth_middleware(
    Extension(config): Extension<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let supplied = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let authorized = match supplied {
        Some(token) => token.as_bytes().ct_eq(config.token.as_bytes()).into(),
        None => false,
    };

    if authorized {
        next.run(request).await
    } else {
        AppError::Unauthorized("missing or invalid bearer token".into()).into_response()
    }
}
