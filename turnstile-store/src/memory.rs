//! In-memory implementations of the storage traits.
//!
//! Backs tests and local development. The ledger mutex is the
//! serialization point for capacity mutations, mirroring what the
//! conditional UPDATE does in the Postgres repositories.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use turnstile_booking::repository::{
    AvailabilityRepository, BookingRepository, CatalogRepository, OfferRepository, PromoRepository,
};
use turnstile_booking::{Booking, BookingError, BookingStatus};
use turnstile_catalog::{
    Addon, AvailabilityDay, AvailabilityError, AvailabilityLedger, Location, RateCard,
};
use turnstile_offer::{BirthdayOffer, PromoCode};
use uuid::Uuid;

pub struct MemoryStore {
    ledger: Mutex<AvailabilityLedger>,
    bookings: Mutex<HashMap<Uuid, Booking>>,
    sequence: AtomicU64,
    promos: Mutex<Vec<PromoCode>>,
    offers: Mutex<Vec<BirthdayOffer>>,
    rate_card: Mutex<RateCard>,
    addons: Mutex<Vec<Addon>>,
}

impl MemoryStore {
    pub fn new(rate_card: RateCard) -> Self {
        Self {
            ledger: Mutex::new(AvailabilityLedger::new()),
            bookings: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            promos: Mutex::new(Vec::new()),
            offers: Mutex::new(Vec::new()),
            rate_card: Mutex::new(rate_card),
            addons: Mutex::new(Vec::new()),
        }
    }

    pub async fn register_location(&self, location: Location) {
        self.ledger.lock().await.register_location(location);
    }

    pub async fn seed_promo(&self, promo: PromoCode) {
        self.promos.lock().await.push(promo);
    }

    pub async fn seed_offer(&self, offer: BirthdayOffer) {
        self.offers.lock().await.push(offer);
    }

    pub async fn seed_addon(&self, addon: Addon) {
        self.addons.lock().await.push(addon);
    }

    pub async fn reserved_count(&self, location_id: Uuid, date: NaiveDate) -> i32 {
        self.ledger
            .lock()
            .await
            .day(location_id, date)
            .map(|d| d.reserved_count)
            .unwrap_or(0)
    }
}

fn map_availability(err: AvailabilityError) -> BookingError {
    match err {
        AvailabilityError::UnknownLocation(id) => BookingError::UnknownLocation(id),
        AvailabilityError::CapacityExceeded { requested, available } => {
            BookingError::InsufficientCapacity {
                requested: requested.max(0) as u32,
                available: available.max(0) as u32,
            }
        }
        AvailabilityError::BlackoutDate(_) => BookingError::BlackoutDate,
        AvailabilityError::CapacityBelowReserved { requested, reserved } => {
            BookingError::CapacityBelowReserved { requested, reserved }
        }
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn get_range(
        &self,
        location_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityDay>, BookingError> {
        self.ledger
            .lock()
            .await
            .get_range(location_id, from, to)
            .map_err(map_availability)
    }

    async fn try_reserve(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        count: u32,
    ) -> Result<(), BookingError> {
        self.ledger
            .lock()
            .await
            .try_reserve(location_id, date, count as i32)
            .map(|_| ())
            .map_err(map_availability)
    }

    async fn release(
        &self,
        location_id: Uuid,
        date: NaiveDate,
        count: u32,
    ) -> Result<(), BookingError> {
        self.ledger.lock().await.release(location_id, date, count as i32);
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
        self.ledger
            .lock()
            .await
            .set_override(location_id, date, capacity, is_blackout, special_price)
            .map_err(map_availability)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert(&self, booking: &Booking) -> Result<(), BookingError> {
        self.bookings.lock().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Booking>, BookingError> {
        Ok(self.bookings.lock().await.get(&id).cloned())
    }

    async fn fetch_by_reference(&self, reference: &str) -> Result<Option<Booking>, BookingError> {
        Ok(self
            .bookings
            .lock()
            .await
            .values()
            .find(|b| b.reference == reference)
            .cloned())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, BookingError> {
        // Holding the map lock across check-and-set is the in-memory
        // equivalent of the conditional UPDATE.
        let mut bookings = self.bookings.lock().await;
        match bookings.get_mut(&id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(BookingError::BookingNotFound(id)),
        }
    }

    async fn update(&self, booking: &Booking) -> Result<(), BookingError> {
        let mut bookings = self.bookings.lock().await;
        let stored = bookings
            .get_mut(&booking.id)
            .ok_or(BookingError::BookingNotFound(booking.id))?;
        stored.tickets = booking.tickets.clone();
        stored.offer_tickets = booking.offer_tickets.clone();
        stored.promo_code = booking.promo_code.clone();
        stored.price = booking.price.clone();
        stored.payment_status = booking.payment_status.clone();
        stored.cancel_reason = booking.cancel_reason.clone();
        stored.updated_at = booking.updated_at;
        Ok(())
    }

    async fn list_stale(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, BookingError> {
        Ok(self
            .bookings
            .lock()
            .await
            .values()
            .filter(|b| b.status == BookingStatus::PendingPayment && b.expires_at < now)
            .cloned()
            .collect())
    }

    async fn next_reference(&self) -> Result<u64, BookingError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl PromoRepository for MemoryStore {
    async fn list_active(&self) -> Result<Vec<PromoCode>, BookingError> {
        Ok(self
            .promos
            .lock()
            .await
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn try_consume(&self, code: &str) -> Result<bool, BookingError> {
        let normalized = PromoCode::normalize(code);
        let mut promos = self.promos.lock().await;
        match promos
            .iter_mut()
            .find(|p| p.code == normalized && p.is_active)
        {
            Some(promo) if !promo.usage_exhausted() => {
                promo.used_count += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create(&self, promo: &PromoCode) -> Result<(), BookingError> {
        self.promos.lock().await.push(promo.clone());
        Ok(())
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn list_active(&self) -> Result<Vec<BirthdayOffer>, BookingError> {
        Ok(self
            .offers
            .lock()
            .await
            .iter()
            .filter(|o| o.is_active)
            .cloned()
            .collect())
    }

    async fn try_record_usage(&self, offer_id: Uuid, quantity: u32) -> Result<bool, BookingError> {
        let mut offers = self.offers.lock().await;
        match offers.iter_mut().find(|o| o.id == offer_id && o.is_active) {
            Some(offer)
                if offer
                    .total_usage_cap
                    .map_or(true, |cap| offer.used_count + quantity <= cap) =>
            {
                offer.used_count += quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create(&self, offer: &BirthdayOffer) -> Result<(), BookingError> {
        self.offers.lock().await.push(offer.clone());
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn rate_card(&self) -> Result<RateCard, BookingError> {
        Ok(self.rate_card.lock().await.clone())
    }

    async fn list_addons(&self) -> Result<Vec<Addon>, BookingError> {
        Ok(self
            .addons
            .lock()
            .await
            .iter()
            .filter(|a| a.is_active)
            .cloned()
            .collect())
    }

    async fn set_ticket_price(
        &self,
        ticket: turnstile_catalog::TicketType,
        price: Decimal,
    ) -> Result<(), BookingError> {
        self.rate_card.lock().await.set_base_price(ticket, price);
        Ok(())
    }

    async fn create_addon(&self, addon: &Addon) -> Result<(), BookingError> {
        self.addons.lock().await.push(addon.clone());
        Ok(())
    }

    async fn day_special(
        &self,
        location_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, BookingError> {
        Ok(self
            .ledger
            .lock()
            .await
            .day(location_id, date)
            .and_then(|d| d.special_price))
    }
}
