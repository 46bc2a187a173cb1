//! Booking persistence.
//!
//! Queryable columns for the fields operators filter on, plus the full
//! serialized aggregate in a JSONB column so the transition log survives
//! restarts byte-for-byte.

use sqlx::postgres::PgPool;
use sqlx::Row;

use karigar_state::Booking;

/// Save a booking (upsert on booking id).
pub async fn save_booking(pool: &PgPool, booking: &Booking) -> Result<(), sqlx::Error> {
    let data = serde_json::to_value(booking)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize booking: {e}")))?;

    sqlx::query(
        "INSERT INTO bookings (booking_id, customer_id, partner_id, state, currency, deposit_minor, service_charge_minor, created_at, data)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (booking_id) DO UPDATE SET
            partner_id = EXCLUDED.partner_id,
            state = EXCLUDED.state,
            service_charge_minor = EXCLUDED.service_charge_minor,
            data = EXCLUDED.data",
    )
    .bind(booking.id.as_uuid())
    .bind(booking.customer.as_uuid())
    .bind(booking.partner.as_ref().map(|p| *p.as_uuid()))
    .bind(booking.state().name())
    .bind(booking.currency.as_str())
    .bind(booking.deposit_minor)
    .bind(booking.service_charge_minor)
    .bind(booking.created_at.as_datetime())
    .bind(&data)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all bookings for hydration.
pub async fn load_all_bookings(pool: &PgPool) -> Result<Vec<Booking>, sqlx::Error> {
    let rows = sqlx::query("SELECT booking_id, data FROM bookings ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    let mut bookings = Vec::with_capacity(rows.len());
    for row in rows {
        let id: uuid::Uuid = row.try_get("booking_id")?;
        let data: serde_json::Value = row.try_get("data")?;
        let booking: Booking = serde_json::from_value(data)
            .map_err(|e| sqlx::Error::Protocol(format!("corrupt booking {id}: {e}")))?;
        bookings.push(booking);
    }
    Ok(bookings)
}
