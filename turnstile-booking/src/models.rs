use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use turnstile_catalog::TicketType;
use turnstile_core::payment::PaymentStatus;
use turnstile_offer::{PriceQuote, QuoteRequest};
use turnstile_shared::pii::Masked;
use uuid::Uuid;

/// Booking status in the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    PaymentFailed,
    Expired,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states hold no capacity and accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::PendingPayment | BookingStatus::Confirmed)
    }
}

/// Customer contact captured on the booking.
///
/// Email and phone are masked in logs and debug output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    /// Required when the booking carries birthday-offer tickets.
    pub birthday: Option<NaiveDate>,
}

/// What a customer submits to create a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub location_id: Uuid,
    pub visit_date: NaiveDate,
    pub contact: ContactInfo,
    pub tickets: BTreeMap<TicketType, u32>,
    pub offer_tickets: BTreeMap<Uuid, u32>,
    pub addons: BTreeMap<Uuid, u32>,
    pub promo_code: Option<String>,
}

impl BookingRequest {
    pub fn headcount(&self) -> u32 {
        self.tickets.values().sum::<u32>() + self.offer_tickets.values().sum::<u32>()
    }

    /// The pricing view of this request.
    pub fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            visit_date: self.visit_date,
            tickets: self.tickets.clone(),
            offer_tickets: self.offer_tickets.clone(),
            addons: self.addons.clone(),
            promo_code: self.promo_code.clone(),
        }
    }
}

/// The single source of truth for a customer's reservation.
///
/// Owned exclusively by the lifecycle manager; the pricing snapshot is
/// immutable once the booking is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Human-readable reference, e.g. `TRN-000042`.
    pub reference: String,
    pub location_id: Uuid,
    pub visit_date: NaiveDate,
    pub contact: ContactInfo,
    pub tickets: BTreeMap<TicketType, u32>,
    pub offer_tickets: BTreeMap<Uuid, u32>,
    pub addons: BTreeMap<Uuid, u32>,
    pub promo_code: Option<String>,
    pub price: PriceQuote,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        request: BookingRequest,
        reference: String,
        price: PriceQuote,
        hold: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference,
            location_id: request.location_id,
            visit_date: request.visit_date,
            contact: request.contact,
            tickets: request.tickets,
            offer_tickets: request.offer_tickets,
            addons: request.addons,
            promo_code: request.promo_code,
            price,
            payment_status: PaymentStatus::Unpaid,
            status: BookingStatus::PendingPayment,
            cancel_reason: None,
            created_at: now,
            expires_at: now + hold,
            updated_at: now,
        }
    }

    pub fn headcount(&self) -> u32 {
        self.tickets.values().sum::<u32>() + self.offer_tickets.values().sum::<u32>()
    }

    /// The pricing view of the booking, for authoritative repricing.
    pub fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            visit_date: self.visit_date,
            tickets: self.tickets.clone(),
            offer_tickets: self.offer_tickets.clone(),
            addons: self.addons.clone(),
            promo_code: self.promo_code.clone(),
        }
    }
}

/// Builds `PREFIX-000042` style booking references from a store sequence.
pub fn format_reference(prefix: &str, sequence: u64) -> String {
    format!("{}-{:06}", prefix, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_prefixed_and_padded() {
        assert_eq!(format_reference("TRN", 42), "TRN-000042");
        assert_eq!(format_reference("TRN", 1_234_567), "TRN-1234567");
    }

    #[test]
    fn terminal_states() {
        assert!(!BookingStatus::PendingPayment.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::PaymentFailed.is_terminal());
        assert!(BookingStatus::Expired.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }
}
