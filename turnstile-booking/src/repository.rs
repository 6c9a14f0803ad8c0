//! Storage seams for the lifecycle manager.
//!
//! Implementations live in the store crate: Postgres-backed for production
//! and in-memory for tests. The manager only ever talks to these traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use turnstile_catalog::{Addon, AvailabilityDay, RateCard, TicketType};
use turnstile_offer::{BirthdayOffer, PromoCode};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{Booking, BookingStatus};

/// Per-(location, date) capacity ledger.
///
/// `try_reserve` must serialize concurrent callers so the sum of successful
/// reservations never exceeds capacity.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn get_range(
        &self,
        location_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, BookingError>;

    async fn try_reserve(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        count: u32,
    ) -> Result<(), BookingError>;

    /// Idempotent decrement, floor-clamped at zero. Never fails on underflow.
    async fn release(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        count: u32,
    ) -> Result<(), BookingError>;

    /// Admin override of a day's capacity, special price or blackout flag.
    async fn set_override(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        capacity: Option<i32>,
        special_price: Option<Decimal>,
        is_blackout: Option<bool>,
    ) -> Result<AvailabilityDay, BookingError>;
}

/// Booking rows plus the atomic conditional transition the lifecycle
/// depends on.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<Booking>, BookingError>;

    async fn fetch_by_reference(&self, reference: &str) -> Result<Option<Booking>, BookingError>;

    /// Compare-and-set on status. Returns `true` iff the booking was in
    /// `from` and is now in `to`; a `false` means some concurrent caller
    /// won the transition first.
    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, BookingError>;

    /// Persist mutable fields (payment status, price snapshot, basket
    /// composition, cancel reason).
    async fn update(&self, booking: &Booking) -> Result<(), BookingError>;

    /// All `pending_payment` bookings whose hold lapsed before `now`.
    async fn list_stale(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, BookingError>;

    /// Next value of the booking reference sequence.
    async fn next_reference(&self) -> Result<u64, BookingError>;
}

/// Promo codes, including the transactional usage decrement.
#[async_trait]
pub trait PromoRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<PromoCode>, BookingError>;

    /// Increment `used_count` only if still under the usage limit.
    /// Returns `false` when the limit was reached first.
    async fn try_consume(&self, code: &str) -> Result<bool, BookingError>;

    async fn create(&self, promo: &PromoCode) -> Result<(), BookingError>;
}

/// Birthday offers, consulted read-only until confirmation.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<BirthdayOffer>, BookingError>;

    /// Increment `used_count` by `quantity` only while the total usage cap
    /// still holds. Returns `false` when the cap was spent first.
    async fn try_record_usage(&self, offer_id: Uuid, quantity: u32) -> Result<bool, BookingError>;

    async fn create(&self, offer: &BirthdayOffer) -> Result<(), BookingError>;
}

/// Prices and add-ons. Read-mostly; safe to cache with a short TTL.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn rate_card(&self) -> Result<RateCard, BookingError>;

    async fn list_addons(&self) -> Result<Vec<Addon>, BookingError>;

    async fn set_ticket_price(
        &self,
        ticket: TicketType,
        price: Decimal,
    ) -> Result<(), BookingError>;

    async fn create_addon(&self, addon: &Addon) -> Result<(), BookingError>;

    /// The day-level admin price override, if any.
    async fn day_special(
        &self,
        location_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, BookingError>;
}
