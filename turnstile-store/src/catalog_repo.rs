use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use turnstile_booking::repository::CatalogRepository;
use turnstile_booking::BookingError;
use turnstile_catalog::{Addon, RateCard, SeasonalRate, TicketCatalog, TicketType};
use uuid::Uuid;

use crate::{db_err, enum_from_str, enum_str};

pub struct PostgresCatalogRepository {
    pub pool: PgPool,
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn rate_card(&self) -> Result<RateCard, BookingError> {
        let price_rows = sqlx::query("SELECT ticket_type, price FROM ticket_prices")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let mut prices = HashMap::new();
        for row in price_rows {
            let ticket: String = row.get("ticket_type");
            prices.insert(
                enum_from_str(&ticket, "ticket type")?,
                row.get::<Decimal, _>("price"),
            );
        }

        let season_rows = sqlx::query(
            "SELECT id, name, starts_on, ends_on, prices, is_active FROM seasonal_rates WHERE is_active",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let mut seasons = Vec::new();
        for row in season_rows {
            seasons.push(SeasonalRate {
                id: row.get("id"),
                name: row.get("name"),
                starts_on: row.get("starts_on"),
                ends_on: row.get("ends_on"),
                prices: serde_json::from_value(row.get("prices"))
                    .map_err(|e| BookingError::Storage(e.to_string()))?,
                is_active: row.get("is_active"),
            });
        }

        Ok(RateCard::new(TicketCatalog::new(prices), seasons))
    }

    async fn list_addons(&self) -> Result<Vec<Addon>, BookingError> {
        let rows = sqlx::query(
            "SELECT id, name, price, is_active, display_order FROM addons WHERE is_active ORDER BY display_order",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|row| Addon {
                id: row.get("id"),
                name: row.get("name"),
                price: row.get("price"),
                is_active: row.get("is_active"),
                display_order: row.get("display_order"),
            })
            .collect())
    }

    async fn set_ticket_price(
        &self,
        ticket: TicketType,
        price: Decimal,
    ) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO ticket_prices (ticket_type, price) VALUES ($1, $2)
            ON CONFLICT (ticket_type) DO UPDATE SET price = EXCLUDED.price
            "#,
        )
        .bind(enum_str(&ticket)?)
        .bind(price)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn create_addon(&self, addon: &Addon) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO addons (id, name, price, is_active, display_order)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(addon.id)
        .bind(&addon.name)
        .bind(addon.price)
        .bind(addon.is_active)
        .bind(addon.display_order)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn day_special(
        &self,
        location_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, BookingError> {
        let row = sqlx::query(
            "SELECT special_price FROM availability_days WHERE location_id = $1 AND date = $2",
        )
        .bind(location_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.and_then(|r| r.get("special_price")))
    }
}
