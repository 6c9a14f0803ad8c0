use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use turnstile_booking::repository::BookingRepository;
use turnstile_booking::{Booking, BookingError, BookingStatus};
use uuid::Uuid;

use crate::{db_err, enum_str};

pub struct PostgresBookingRepository {
    pub pool: PgPool,
}

/// Status values as stored; must match the serde renames on `BookingStatus`.
fn status_str(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::PendingPayment => "PENDING_PAYMENT",
        BookingStatus::Confirmed => "CONFIRMED",
        BookingStatus::PaymentFailed => "PAYMENT_FAILED",
        BookingStatus::Expired => "EXPIRED",
        BookingStatus::Cancelled => "CANCELLED",
    }
}

fn booking_from_row(row: sqlx::postgres::PgRow) -> Result<Booking, BookingError> {
    let to_storage = |e: serde_json::Error| BookingError::Storage(e.to_string());
    let status: String = row.get("status");
    let payment_status: String = row.get("payment_status");
    Ok(Booking {
        id: row.get("id"),
        reference: row.get("reference"),
        location_id: row.get("location_id"),
        visit_date: row.get("visit_date"),
        contact: serde_json::from_value(row.get("contact")).map_err(to_storage)?,
        tickets: serde_json::from_value(row.get("tickets")).map_err(to_storage)?,
        offer_tickets: serde_json::from_value(row.get("offer_tickets")).map_err(to_storage)?,
        addons: serde_json::from_value(row.get("addons")).map_err(to_storage)?,
        promo_code: row.get("promo_code"),
        price: serde_json::from_value(row.get("price")).map_err(to_storage)?,
        payment_status: serde_json::from_value(serde_json::Value::String(payment_status))
            .map_err(to_storage)?,
        status: serde_json::from_value(serde_json::Value::String(status)).map_err(to_storage)?,
        cancel_reason: row.get("cancel_reason"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingError> {
        let to_storage = |e: serde_json::Error| BookingError::Storage(e.to_string());
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, reference, location_id, visit_date, contact, tickets,
                offer_tickets, addons, promo_code, price, payment_status,
                status, cancel_reason, created_at, expires_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.location_id)
        .bind(booking.visit_date)
        .bind(serde_json::to_value(&booking.contact).map_err(to_storage)?)
        .bind(serde_json::to_value(&booking.tickets).map_err(to_storage)?)
        .bind(serde_json::to_value(&booking.offer_tickets).map_err(to_storage)?)
        .bind(serde_json::to_value(&booking.addons).map_err(to_storage)?)
        .bind(&booking.promo_code)
        .bind(serde_json::to_value(&booking.price).map_err(to_storage)?)
        .bind(enum_str(&booking.payment_status)?)
        .bind(status_str(booking.status))
        .bind(&booking.cancel_reason)
        .bind(booking.created_at)
        .bind(booking.expires_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(booking_from_row).transpose()
    }

    async fn fetch_by_reference(&self, reference: &str) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query("SELECT * FROM bookings WHERE reference = $1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(booking_from_row).transpose()
    }

    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, BookingError> {
        // The WHERE status guard is what makes confirm-vs-expire races
        // resolve to a single winner.
        let updated = sqlx::query(
            "UPDATE bookings SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(status_str(from))
        .bind(status_str(to))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(updated.rows_affected() == 1)
    }

    async fn update(&self, booking: &Booking) -> Result<(), BookingError> {
        let to_storage = |e: serde_json::Error| BookingError::Storage(e.to_string());
        sqlx::query(
            r#"
            UPDATE bookings
            SET tickets = $2, offer_tickets = $3, promo_code = $4, price = $5,
                payment_status = $6, cancel_reason = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(serde_json::to_value(&booking.tickets).map_err(to_storage)?)
        .bind(serde_json::to_value(&booking.offer_tickets).map_err(to_storage)?)
        .bind(&booking.promo_code)
        .bind(serde_json::to_value(&booking.price).map_err(to_storage)?)
        .bind(enum_str(&booking.payment_status)?)
        .bind(&booking.cancel_reason)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_stale(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, BookingError> {
        let rows = sqlx::query(
            "SELECT * FROM bookings WHERE status = 'PENDING_PAYMENT' AND expires_at < $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(booking_from_row).collect()
    }

    async fn next_reference(&self) -> Result<u64, BookingError> {
        let row = sqlx::query("SELECT nextval('booking_reference_seq') AS seq")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let seq: i64 = row.get("seq");
        Ok(seq as u64)
    }
}
