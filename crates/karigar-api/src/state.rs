//! # Application State
//!
//! Shared state for the Axum application: the orchestrator with its
//! collaborators, the optional Postgres pool, and the configuration.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use karigar_booking::{BookingOrchestrator, OrchestratorConfig, TracingSink};
use karigar_core::{CoreError, CurrencyCode};
use karigar_gateway::{
    GatewayError, HttpGatewayConfig, HttpPaymentGateway, MockGateway, PaymentGateway,
    WebhookVerifier,
};
use karigar_ledger::PaymentLedger;
use karigar_wallet::{WalletConfig, WalletService};

use crate::config::{ApiConfig, GatewayMode};

/// Errors wiring up the application state.
#[derive(Debug, Error)]
pub enum StateBuildError {
    /// The configured currency code is invalid.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The live gateway adapter rejected its configuration.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Arc<ApiConfig>,
    /// The booking orchestrator and its collaborators.
    pub orchestrator: Arc<BookingOrchestrator>,
    /// Postgres pool when `DATABASE_URL` is configured.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Build the full object graph from configuration.
    pub fn new(config: ApiConfig, db_pool: Option<PgPool>) -> Result<Self, StateBuildError> {
        let currency = CurrencyCode::new(&config.currency)?;
        let gateway: Arc<dyn PaymentGateway> = match &config.gateway {
            GatewayMode::Mock => Arc::new(MockGateway::new()),
            GatewayMode::Live {
                base_url,
                key_id,
                key_secret,
            } => Arc::new(HttpPaymentGateway::new(HttpGatewayConfig {
                base_url: base_url.clone(),
                key_id: key_id.clone(),
                key_secret: key_secret.clone(),
                timeout_secs: 30,
            })?),
        };

        let orchestrator = BookingOrchestrator::new(
            OrchestratorConfig {
                tax_rate_percent: config.tax_rate_percent,
                currency,
            },
            Arc::new(PaymentLedger::new()),
            Arc::new(WalletService::new(WalletConfig {
                min_withdrawal_minor: config.min_withdrawal_minor,
                hold_period_days: config.hold_period_days,
            })),
            gateway,
            Arc::new(TracingSink),
            WebhookVerifier::new(config.webhook_secret.as_bytes().to_vec()),
        );

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            db_pool,
        })
    }
}
