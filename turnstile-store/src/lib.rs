pub mod app_config;
pub mod availability_repo;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod memory;
pub mod promo_repo;

pub use app_config::Config;
pub use availability_repo::PostgresAvailabilityRepository;
pub use booking_repo::PostgresBookingRepository;
pub use catalog_repo::PostgresCatalogRepository;
pub use database::DbClient;
pub use memory::MemoryStore;
pub use promo_repo::{PostgresOfferRepository, PostgresPromoRepository};

use turnstile_booking::BookingError;

pub(crate) fn db_err(err: sqlx::Error) -> BookingError {
    BookingError::Storage(err.to_string())
}

/// Serialize a SCREAMING_SNAKE_CASE enum to its bare string form for a
/// TEXT column.
pub(crate) fn enum_str<T: serde::Serialize>(value: &T) -> Result<String, BookingError> {
    match serde_json::to_value(value).map_err(|e| BookingError::Storage(e.to_string()))? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(BookingError::Storage(format!(
            "expected string-encoded value, got {other}"
        ))),
    }
}

/// Inverse of [`enum_str`]: parse a TEXT column back into the enum.
pub(crate) fn enum_from_str<T: serde::de::DeserializeOwned>(
    value: &str,
    what: &str,
) -> Result<T, BookingError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| BookingError::Storage(format!("unknown {what}: {value}")))
}
