//! # karigar-api — Axum API Service
//!
//! HTTP surface for the marketplace back end: booking lifecycle,
//! payment intents, refunds, the gateway webhook, and partner wallets.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                | Auth                |
//! |------------------------|-----------------------|---------------------|
//! | `/v1/bookings/*`       | [`routes::bookings`]  | bearer token        |
//! | `/v1/refunds/*`        | [`routes::refunds`]   | bearer token        |
//! | `/v1/wallets/*`        | [`routes::wallets`]   | bearer token        |
//! | `/v1/webhooks/gateway` | [`routes::webhooks`]  | HMAC signature      |
//! | `/health/*`            | this module           | none                |

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router.
///
/// Health probes and the gateway webhook are mounted outside the auth
/// middleware: probes carry no credentials, and the webhook is
/// authenticated by its HMAC signature over the raw body.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Body size limit: 1 MiB. No route carries larger payloads.
    let api = Router::new()
        .merge(routes::bookings::router())
        .merge(routes::refunds::router())
        .merge(routes::wallets::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route(
            "/v1/webhooks/gateway",
            post(routes::webhooks::gateway_webhook),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe — 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the service can serve traffic.
///
/// Checks the in-memory stores are reachable and, when configured, that
/// the database answers a trivial query.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.orchestrator.ledger().entry_count();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
