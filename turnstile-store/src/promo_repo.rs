use async_trait::async_trait;
use sqlx::{PgPool, Row};
use turnstile_booking::repository::{OfferRepository, PromoRepository};
use turnstile_booking::BookingError;
use turnstile_offer::{BirthdayOffer, PromoCode};
use uuid::Uuid;

use crate::{db_err, enum_from_str, enum_str};

pub struct PostgresPromoRepository {
    pub pool: PgPool,
}

pub struct PostgresOfferRepository {
    pub pool: PgPool,
}

#[async_trait]
impl PromoRepository for PostgresPromoRepository {
    async fn list_active(&self) -> Result<Vec<PromoCode>, BookingError> {
        let rows = sqlx::query("SELECT * FROM promo_codes WHERE is_active")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|row| {
                let kind: String = row.get("discount_kind");
                let used_count: i32 = row.get("used_count");
                let usage_limit: Option<i32> = row.get("usage_limit");
                Ok(PromoCode {
                    id: row.get("id"),
                    code: row.get("code"),
                    discount_kind: enum_from_str(&kind, "discount kind")?,
                    discount_value: row.get("discount_value"),
                    min_order_amount: row.get("min_order_amount"),
                    max_discount: row.get("max_discount"),
                    usage_limit: usage_limit.map(|v| v as u32),
                    used_count: used_count as u32,
                    valid_from: row.get("valid_from"),
                    valid_until: row.get("valid_until"),
                    is_active: row.get("is_active"),
                })
            })
            .collect()
    }

    async fn try_consume(&self, code: &str) -> Result<bool, BookingError> {
        // Conditional increment: the usage cap can never be overshot even
        // under concurrent confirmations.
        let updated = sqlx::query(
            r#"
            UPDATE promo_codes
            SET used_count = used_count + 1
            WHERE code = $1 AND is_active
              AND (usage_limit IS NULL OR used_count < usage_limit)
            "#,
        )
        .bind(PromoCode::normalize(code))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(updated.rows_affected() == 1)
    }

    async fn create(&self, promo: &PromoCode) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO promo_codes (
                id, code, discount_kind, discount_value, min_order_amount,
                max_discount, usage_limit, used_count, valid_from, valid_until, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(promo.id)
        .bind(PromoCode::normalize(&promo.code))
        .bind(enum_str(&promo.discount_kind)?)
        .bind(promo.discount_value)
        .bind(promo.min_order_amount)
        .bind(promo.max_discount)
        .bind(promo.usage_limit.map(|v| v as i32))
        .bind(promo.used_count as i32)
        .bind(promo.valid_from)
        .bind(promo.valid_until)
        .bind(promo.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn list_active(&self) -> Result<Vec<BirthdayOffer>, BookingError> {
        let rows = sqlx::query("SELECT * FROM birthday_offers WHERE is_active")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|row| {
                let kind: String = row.get("discount_kind");
                let reference_ticket: String = row.get("reference_ticket");
                let per_booking_cap: i32 = row.get("per_booking_cap");
                let total_usage_cap: Option<i32> = row.get("total_usage_cap");
                let used_count: i32 = row.get("used_count");
                Ok(BirthdayOffer {
                    id: row.get("id"),
                    name: row.get("name"),
                    discount_kind: enum_from_str(&kind, "discount kind")?,
                    discount_value: row.get("discount_value"),
                    reference_ticket: enum_from_str(&reference_ticket, "ticket type")?,
                    days_before: row.get("days_before"),
                    days_after: row.get("days_after"),
                    min_age: row.get("min_age"),
                    max_age: row.get("max_age"),
                    per_booking_cap: per_booking_cap as u32,
                    total_usage_cap: total_usage_cap.map(|v| v as u32),
                    used_count: used_count as u32,
                    valid_from: row.get("valid_from"),
                    valid_until: row.get("valid_until"),
                    is_active: row.get("is_active"),
                })
            })
            .collect()
    }

    async fn try_record_usage(&self, offer_id: Uuid, quantity: u32) -> Result<bool, BookingError> {
        // Conditional increment, same shape as the promo consume: the cap
        // holds even under concurrent confirmations.
        let updated = sqlx::query(
            r#"
            UPDATE birthday_offers
            SET used_count = used_count + $2
            WHERE id = $1 AND is_active
              AND (total_usage_cap IS NULL OR used_count + $2 <= total_usage_cap)
            "#,
        )
        .bind(offer_id)
        .bind(quantity as i32)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(updated.rows_affected() == 1)
    }

    async fn create(&self, offer: &BirthdayOffer) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO birthday_offers (
                id, name, discount_kind, discount_value, reference_ticket,
                days_before, days_after, min_age, max_age, per_booking_cap,
                total_usage_cap, used_count, valid_from, valid_until, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(offer.id)
        .bind(&offer.name)
        .bind(enum_str(&offer.discount_kind)?)
        .bind(offer.discount_value)
        .bind(enum_str(&offer.reference_ticket)?)
        .bind(offer.days_before)
        .bind(offer.days_after)
        .bind(offer.min_age)
        .bind(offer.max_age)
        .bind(offer.per_booking_cap as i32)
        .bind(offer.total_usage_cap.map(|v| v as i32))
        .bind(offer.used_count as i32)
        .bind(offer.valid_from)
        .bind(offer.valid_until)
        .bind(offer.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
