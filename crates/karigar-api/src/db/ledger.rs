//! Payment ledger persistence: intents, refunds, and the append-only
//! entry trail. Entries are insert-only (`ON CONFLICT DO NOTHING`), the
//! database never rewrites one.

use sqlx::postgres::PgPool;
use sqlx::Row;

use karigar_core::{BookingId, IntentId, PartnerId, Timestamp};
use karigar_ledger::{LedgerEntry, LedgerEventKind, PaymentIntent, Refund};

/// Save a payment intent (upsert on intent id; status takes last write).
pub async fn save_intent(pool: &PgPool, intent: &PaymentIntent) -> Result<(), sqlx::Error> {
    let data = serde_json::to_value(intent)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize intent: {e}")))?;

    sqlx::query(
        "INSERT INTO payment_intents (intent_id, booking_id, purpose, status, amount_minor, created_at, data)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (intent_id) DO UPDATE SET
            status = EXCLUDED.status,
            data = EXCLUDED.data",
    )
    .bind(intent.intent_id.as_str())
    .bind(intent.booking_id.as_uuid())
    .bind(intent.purpose.to_string())
    .bind(intent.status.to_string())
    .bind(intent.amount_minor)
    .bind(intent.created_at.as_datetime())
    .bind(&data)
    .execute(pool)
    .await?;
    Ok(())
}

/// Save a ledger entry. Insert-only.
pub async fn save_entry(pool: &PgPool, entry: &LedgerEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO ledger_entries (seq, booking_id, partner_id, intent_id, kind, amount_minor, metadata, recorded_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (seq) DO NOTHING",
    )
    .bind(entry.seq as i64)
    .bind(entry.booking_id.as_uuid())
    .bind(entry.partner_id.as_ref().map(|p| *p.as_uuid()))
    .bind(entry.intent_id.as_ref().map(|i| i.as_str().to_string()))
    .bind(entry.kind.to_string())
    .bind(entry.amount_minor)
    .bind(&entry.metadata)
    .bind(entry.recorded_at.as_datetime())
    .execute(pool)
    .await?;
    Ok(())
}

/// Save a refund (upsert on refund id; status takes last write).
pub async fn save_refund(pool: &PgPool, refund: &Refund) -> Result<(), sqlx::Error> {
    let data = serde_json::to_value(refund)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize refund: {e}")))?;

    sqlx::query(
        "INSERT INTO refunds (refund_id, intent_id, amount_minor, status, created_at, data)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (refund_id) DO UPDATE SET
            status = EXCLUDED.status,
            data = EXCLUDED.data",
    )
    .bind(refund.refund_id.as_str())
    .bind(refund.intent_id.as_str())
    .bind(refund.amount_minor)
    .bind(refund.status.to_string())
    .bind(refund.created_at.as_datetime())
    .bind(&data)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all ledger entries, in sequence order.
pub async fn load_all_entries(pool: &PgPool) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT seq, booking_id, partner_id, intent_id, kind, amount_minor, metadata, recorded_at
         FROM ledger_entries ORDER BY seq",
    )
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let seq: i64 = row.try_get("seq")?;
        let kind_raw: String = row.try_get("kind")?;
        let kind = parse_kind(&kind_raw)
            .ok_or_else(|| sqlx::Error::Protocol(format!("unknown entry kind {kind_raw:?}")))?;
        let intent_id: Option<String> = row.try_get("intent_id")?;
        let intent_id = intent_id
            .map(IntentId::new)
            .transpose()
            .map_err(|e| sqlx::Error::Protocol(format!("corrupt intent id in entry {seq}: {e}")))?;
        let recorded_at: chrono::DateTime<chrono::Utc> = row.try_get("recorded_at")?;

        entries.push(LedgerEntry {
            seq: seq as u64,
            booking_id: BookingId(row.try_get("booking_id")?),
            partner_id: row
                .try_get::<Option<uuid::Uuid>, _>("partner_id")?
                .map(PartnerId),
            intent_id,
            kind,
            amount_minor: row.try_get("amount_minor")?,
            metadata: row.try_get("metadata")?,
            recorded_at: Timestamp::from_utc(recorded_at),
        });
    }
    Ok(entries)
}

fn parse_kind(raw: &str) -> Option<LedgerEventKind> {
    match raw {
        "intent_created" => Some(LedgerEventKind::IntentCreated),
        "captured" => Some(LedgerEventKind::Captured),
        "failed" => Some(LedgerEventKind::Failed),
        "refund_initiated" => Some(LedgerEventKind::RefundInitiated),
        "refund_processed" => Some(LedgerEventKind::RefundProcessed),
        _ => None,
    }
}

/// Load all payment intents for hydration.
pub async fn load_all_intents(pool: &PgPool) -> Result<Vec<PaymentIntent>, sqlx::Error> {
    load_json_column(pool, "SELECT intent_id AS id, data FROM payment_intents").await
}

/// Load all refunds for hydration.
pub async fn load_all_refunds(pool: &PgPool) -> Result<Vec<Refund>, sqlx::Error> {
    load_json_column(pool, "SELECT refund_id AS id, data FROM refunds").await
}

async fn load_json_column<T: serde::de::DeserializeOwned>(
    pool: &PgPool,
    query: &str,
) -> Result<Vec<T>, sqlx::Error> {
    let rows = sqlx::query(query).fetch_all(pool).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.try_get("id")?;
        let data: serde_json::Value = row.try_get("data")?;
        out.push(
            serde_json::from_value(data)
                .map_err(|e| sqlx::Error::Protocol(format!("corrupt row {id}: {e}")))?,
        );
    }
    Ok(out)
}
