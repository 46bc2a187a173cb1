//! # Service Configuration
//!
//! All configuration comes from `KARIGAR_*` environment variables. The
//! auth token and webhook secret have no defaults; a deployment that
//! omits them fails to start rather than running open.

use thiserror::Error;

/// Configuration errors raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required environment variable {var}")]
    MissingVar {
        /// The variable name.
        var: &'static str,
    },

    /// A variable is set but could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: &'static str,
        /// What was wrong.
        reason: String,
    },
}

/// Which payment gateway adapter to construct.
#[derive(Debug, Clone)]
pub enum GatewayMode {
    /// In-process deterministic mock, for development and tests.
    Mock,
    /// Live HTTP adapter against the external gateway.
    Live {
        /// Gateway API base URL.
        base_url: String,
        /// API key identifier.
        key_id: String,
        /// API key secret.
        key_secret: String,
    },
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Bearer token required on authenticated routes.
    pub auth_token: String,
    /// Shared secret for webhook HMAC verification.
    pub webhook_secret: String,
    /// Invoice tax rate, whole percent.
    pub tax_rate_percent: u32,
    /// ISO 4217 currency code for all bookings.
    pub currency: String,
    /// Smallest accepted withdrawal, minor units.
    pub min_withdrawal_minor: i64,
    /// Days completion credits stay in hold.
    pub hold_period_days: u32,
    /// Gateway adapter selection.
    pub gateway: GatewayMode,
}

fn parsed_var<T: std::str::FromStr>(
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn required_var(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar { var })
}

impl ApiConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gateway = match std::env::var("KARIGAR_GATEWAY_BASE_URL") {
            Ok(base_url) => GatewayMode::Live {
                base_url,
                key_id: required_var("KARIGAR_GATEWAY_KEY_ID")?,
                key_secret: required_var("KARIGAR_GATEWAY_KEY_SECRET")?,
            },
            Err(_) => {
                tracing::warn!(
                    "KARIGAR_GATEWAY_BASE_URL not set, using the in-process mock gateway"
                );
                GatewayMode::Mock
            }
        };

        Ok(Self {
            bind_addr: std::env::var("KARIGAR_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            auth_token: required_var("KARIGAR_AUTH_TOKEN")?,
            webhook_secret: required_var("KARIGAR_WEBHOOK_SECRET")?,
            tax_rate_percent: parsed_var("KARIGAR_TAX_RATE_PERCENT", 18)?,
            currency: std::env::var("KARIGAR_CURRENCY").unwrap_or_else(|_| "PKR".to_string()),
            min_withdrawal_minor: parsed_var("KARIGAR_MIN_WITHDRAWAL_MINOR", 50_000)?,
            hold_period_days: parsed_var("KARIGAR_HOLD_PERIOD_DAYS", 7)?,
            gateway,
        })
    }
}
