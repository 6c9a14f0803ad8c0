use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use turnstile_booking::repository::AvailabilityRepository;
use turnstile_booking::BookingError;
use turnstile_catalog::AvailabilityDay;
use uuid::Uuid;

use crate::db_err;

pub struct PostgresAvailabilityRepository {
    pub pool: PgPool,
}

impl PostgresAvailabilityRepository {
    /// Materialize the day row from the location default if absent.
    /// Uses ON CONFLICT DO NOTHING so concurrent creators cannot collide.
    async fn ensure_day(&self, location_id: Uuid, date: NaiveDate) -> Result<(), BookingError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO availability_days (location_id, date, total_capacity)
            SELECT id, $2, default_capacity FROM locations WHERE id = $1 AND is_active
            ON CONFLICT (location_id, date) DO NOTHING
            "#,
        )
        .bind(location_id)
        .bind(date)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if inserted.rows_affected() == 0 {
            // Either the day already exists or the location is unknown.
            let exists = sqlx::query("SELECT 1 AS one FROM availability_days WHERE location_id = $1 AND date = $2")
                .bind(location_id)
                .bind(date)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
            if exists.is_none() {
                return Err(BookingError::UnknownLocation(location_id));
            }
        }
        Ok(())
    }

    async fn fetch_day(
        &self,
        location_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityDay>, BookingError> {
        let row = sqlx::query(
            r#"
            SELECT location_id, date, total_capacity, reserved_count, special_price, is_blackout
            FROM availability_days WHERE location_id = $1 AND date = $2
            "#,
        )
        .bind(location_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(day_from_row))
    }
}

fn day_from_row(row: sqlx::postgres::PgRow) -> AvailabilityDay {
    AvailabilityDay {
        location_id: row.get("location_id"),
        date: row.get("date"),
        total_capacity: row.get("total_capacity"),
        reserved_count: row.get("reserved_count"),
        special_price: row.get("special_price"),
        is_blackout: row.get("is_blackout"),
    }
}

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepository {
    async fn get_range(
        &self,
        location_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, BookingError> {
        // Days with no row yet are presented from the location default
        // without being materialized; reads never write.
        let default_capacity: i32 = sqlx::query(
            "SELECT default_capacity FROM locations WHERE id = $1 AND is_active",
        )
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(|row| row.get("default_capacity"))
        .ok_or(BookingError::UnknownLocation(location_id))?;

        let rows = sqlx::query(
            r#"
            SELECT location_id, date, total_capacity, reserved_count, special_price, is_blackout
            FROM availability_days
            WHERE location_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date
            "#,
        )
        .bind(location_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut by_date: std::collections::BTreeMap<NaiveDate, AvailabilityDay> =
            rows.into_iter().map(day_from_row).map(|d| (d.date, d)).collect();

        let mut days = Vec::new();
        let mut date = from;
        while date <= to {
            let day = by_date
                .remove(&date)
                .unwrap_or_else(|| {
                    AvailabilityDay::from_template(location_id, date, default_capacity)
                });
            days.push(day);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(days)
    }

    async fn try_reserve(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        count: u32,
    ) -> Result<(), BookingError> {
        self.ensure_day(location_id, date).await?;

        // The WHERE clause is the serialization point: concurrent reservers
        // race on the row and only those that still fit succeed.
        let updated = sqlx::query(
            r#"
            UPDATE availability_days
            SET reserved_count = reserved_count + $3
            WHERE location_id = $1 AND date = $2
              AND NOT is_blackout
              AND reserved_count + $3 <= total_capacity
            "#,
        )
        .bind(location_id)
        .bind(date)
        .bind(count as i32)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 1 {
            return Ok(());
        }

        // Lost the conditional update; report why.
        let day = self
            .fetch_day(location_id, date)
            .await?
            .ok_or(BookingError::UnknownLocation(location_id))?;
        if day.is_blackout {
            Err(BookingError::BlackoutDate)
        } else {
            Err(BookingError::InsufficientCapacity {
                requested: count,
                available: (day.total_capacity - day.reserved_count).max(0) as u32,
            })
        }
    }

    async fn release(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        count: u32,
    ) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            UPDATE availability_days
            SET reserved_count = GREATEST(reserved_count - $3, 0)
            WHERE location_id = $1 AND date = $2
            "#,
        )
        .bind(location_id)
        .bind(date)
        .bind(count as i32)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn set_override(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        capacity: Option<i32>,
        special_price: Option<Decimal>,
        is_blackout: Option<bool>,
    ) -> Result<AvailabilityDay, BookingError> {
        self.ensure_day(location_id, date).await?;

        if let Some(new_capacity) = capacity {
            // Shrinking below the already reserved count would strand holds.
            let updated = sqlx::query(
                r#"
                UPDATE availability_days SET total_capacity = $3
                WHERE location_id = $1 AND date = $2 AND reserved_count <= $3
                "#,
            )
            .bind(location_id)
            .bind(date)
            .bind(new_capacity)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            if updated.rows_affected() == 0 {
                let day = self
                    .fetch_day(location_id, date)
                    .await?
                    .ok_or(BookingError::UnknownLocation(location_id))?;
                return Err(BookingError::CapacityBelowReserved {
                    requested: new_capacity,
                    reserved: day.reserved_count,
                });
            }
        }
        if special_price.is_some() {
            sqlx::query(
                "UPDATE availability_days SET special_price = $3 WHERE location_id = $1 AND date = $2",
            )
            .bind(location_id)
            .bind(date)
            .bind(special_price)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        }
        if let Some(blackout) = is_blackout {
            sqlx::query(
                "UPDATE availability_days SET is_blackout = $3 WHERE location_id = $1 AND date = $2",
            )
            .bind(location_id)
            .bind(date)
            .bind(blackout)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        }

        self.fetch_day(location_id, date)
            .await?
            .ok_or(BookingError::UnknownLocation(location_id))
    }
}
