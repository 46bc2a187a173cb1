//! Wallet persistence: account balances (upsert) and the transaction
//! trail (insert-only).

use sqlx::postgres::PgPool;
use sqlx::Row;

use karigar_wallet::{WalletAccount, WalletTransaction};

/// Save a wallet account (upsert on partner id).
pub async fn save_account(pool: &PgPool, account: &WalletAccount) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO wallet_accounts (partner_id, balance_hold, balance_available, total_earned, total_withdrawn, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (partner_id) DO UPDATE SET
            balance_hold = EXCLUDED.balance_hold,
            balance_available = EXCLUDED.balance_available,
            total_earned = EXCLUDED.total_earned,
            total_withdrawn = EXCLUDED.total_withdrawn,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(account.partner_id.as_uuid())
    .bind(account.balance_hold)
    .bind(account.balance_available)
    .bind(account.total_earned)
    .bind(account.total_withdrawn)
    .bind(account.updated_at.as_datetime())
    .execute(pool)
    .await?;
    Ok(())
}

/// Save a wallet transaction. Insert-only.
pub async fn save_transaction(
    pool: &PgPool,
    txn: &WalletTransaction,
) -> Result<(), sqlx::Error> {
    let data = serde_json::to_value(txn)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize wallet txn: {e}")))?;

    sqlx::query(
        "INSERT INTO wallet_transactions (txn_id, partner_id, kind, amount_minor, created_at, data)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (txn_id) DO NOTHING",
    )
    .bind(txn.txn_id.as_uuid())
    .bind(txn.partner_id.as_uuid())
    .bind(txn.kind.to_string())
    .bind(txn.amount_minor)
    .bind(txn.created_at.as_datetime())
    .bind(&data)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all wallet accounts for hydration.
pub async fn load_all_accounts(pool: &PgPool) -> Result<Vec<WalletAccount>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT partner_id, balance_hold, balance_available, total_earned, total_withdrawn, updated_at
         FROM wallet_accounts",
    )
    .fetch_all(pool)
    .await?;

    let mut accounts = Vec::with_capacity(rows.len());
    for row in rows {
        let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;
        accounts.push(WalletAccount {
            partner_id: karigar_core::PartnerId(row.try_get("partner_id")?),
            balance_hold: row.try_get("balance_hold")?,
            balance_available: row.try_get("balance_available")?,
            total_earned: row.try_get("total_earned")?,
            total_withdrawn: row.try_get("total_withdrawn")?,
            updated_at: karigar_core::Timestamp::from_utc(updated_at),
        });
    }
    Ok(accounts)
}

/// Load all wallet transactions for hydration, oldest first.
pub async fn load_all_transactions(
    pool: &PgPool,
) -> Result<Vec<WalletTransaction>, sqlx::Error> {
    let rows = sqlx::query("SELECT txn_id, data FROM wallet_transactions ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    let mut txns = Vec::with_capacity(rows.len());
    for row in rows {
        let id: uuid::Uuid = row.try_get("txn_id")?;
        let data: serde_json::Value = row.try_get("data")?;
        txns.push(
            serde_json::from_value(data)
                .map_err(|e| sqlx::Error::Protocol(format!("corrupt wallet txn {id}: {e}")))?,
        );
    }
    Ok(txns)
}
