//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx. When `DATABASE_URL` is set,
//! bookings, ledger rows, and wallet state are written through after each
//! mutation and reloaded at startup. When absent, the service runs
//! in-memory only (development and testing).
//!
//! Write-through is best-effort: the in-memory stores are the source of
//! truth for a running process, and a failed write is logged rather than
//! failing the request that triggered it.

pub mod bookings;
pub mod ledger;
pub mod wallets;

use sqlx::postgres::{PgPool, PgPoolOptions};

use karigar_booking::BookingOrchestrator;
use karigar_core::BookingId;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Write through everything a booking mutation can touch: the booking
/// row, its ledger intents and entries, and the assigned partner's
/// wallet. Failures are logged, not propagated.
pub async fn persist_booking_bundle(
    pool: &Option<PgPool>,
    orchestrator: &BookingOrchestrator,
    booking_id: BookingId,
) {
    let Some(pool) = pool else {
        return;
    };
    let booking = match orchestrator.booking(booking_id) {
        Ok(b) => b,
        Err(_) => return,
    };

    if let Err(e) = bookings::save_booking(pool, &booking).await {
        tracing::warn!(booking_id = %booking_id, error = %e, "booking write-through failed");
    }
    for intent in orchestrator
        .ledger()
        .all_intents()
        .iter()
        .filter(|i| i.booking_id == booking_id)
    {
        if let Err(e) = ledger::save_intent(pool, intent).await {
            tracing::warn!(intent_id = %intent.intent_id, error = %e, "intent write-through failed");
        }
    }
    for entry in orchestrator.ledger().entries_for_booking(&booking_id) {
        if let Err(e) = ledger::save_entry(pool, &entry).await {
            tracing::warn!(seq = entry.seq, error = %e, "ledger entry write-through failed");
        }
    }
    if let Some(partner) = booking.partner {
        if let Some(account) = orchestrator.wallet().account(&partner) {
            if let Err(e) = wallets::save_account(pool, &account).await {
                tracing::warn!(partner_id = %partner, error = %e, "wallet write-through failed");
            }
        }
        for txn in orchestrator.wallet().transactions_for_partner(&partner) {
            if let Err(e) = wallets::save_transaction(pool, &txn).await {
                tracing::warn!(txn_id = %txn.txn_id, error = %e, "wallet txn write-through failed");
            }
        }
    }
}

/// Reload persisted state into the orchestrator's in-memory stores.
pub async fn hydrate(
    pool: &PgPool,
    orchestrator: &BookingOrchestrator,
) -> Result<(), sqlx::Error> {
    let loaded = bookings::load_all_bookings(pool).await?;
    let booking_count = loaded.len();
    for booking in loaded {
        orchestrator.restore_booking(booking);
    }

    let entries = ledger::load_all_entries(pool).await?;
    let intents = ledger::load_all_intents(pool).await?;
    let refunds = ledger::load_all_refunds(pool).await?;
    let entry_count = entries.len();
    orchestrator.ledger().restore(entries, intents, refunds);

    let accounts = wallets::load_all_accounts(pool).await?;
    let transactions = wallets::load_all_transactions(pool).await?;
    let account_count = accounts.len();
    orchestrator.wallet().restore(accounts, transactions);

    tracing::info!(
        bookings = booking_count,
        ledger_entries = entry_count,
        wallet_accounts = account_count,
        "state hydrated from database"
    );
    Ok(())
}
