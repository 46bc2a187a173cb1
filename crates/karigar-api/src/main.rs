//! Service entry point: tracing, configuration, optional Postgres
//! hydration, and the Axum server.

use tracing_subscriber::EnvFilter;

use karigar_api::config::ApiConfig;
use karigar_api::state::AppState;
use karigar_api::{app, db};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let pool = db::init_pool().await?;
    let state = AppState::new(config, pool)?;

    if let Some(pool) = &state.db_pool {
        db::hydrate(pool, &state.orchestrator).await?;
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
