//! Booking lifecycle orchestration.
//!
//! validate -> reserve capacity -> persist `pending_payment` -> await
//! payment -> `confirmed` / `payment_failed`, with a periodic sweep that
//! reclaims capacity from lapsed holds. Every transition out of
//! `pending_payment` goes through the store's conditional compare-and-set,
//! so a confirmation racing the sweep resolves to exactly one winner and
//! capacity is released at most once.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use turnstile_catalog::TicketType;
use turnstile_core::notify::NotificationSink;
use turnstile_core::payment::{PaymentOutcome, PaymentStatus};
use turnstile_offer::quote::{price_quote, GroupDiscountPolicy, PricingInputs};
use turnstile_offer::{rules, PriceQuote, QuoteRequest};
use turnstile_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, BookingExpiredEvent,
};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{format_reference, Booking, BookingRequest, BookingStatus};
use crate::repository::{
    AvailabilityRepository, BookingRepository, CatalogRepository, OfferRepository, PromoRepository,
};

/// Tunable lifecycle limits, loaded from configuration.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Minimum tickets (regular + offer) per booking.
    pub min_tickets: u32,
    /// Maximum tickets per booking.
    pub max_tickets: u32,
    /// How long a `pending_payment` hold lives before the sweep reclaims it.
    pub hold_minutes: i64,
    /// Booking reference prefix, e.g. `TRN`.
    pub reference_prefix: String,
    pub group_discount: GroupDiscountPolicy,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_tickets: 1,
            max_tickets: 50,
            hold_minutes: 30,
            reference_prefix: "TRN".to_string(),
            group_discount: GroupDiscountPolicy::default(),
        }
    }
}

/// Drives bookings through their lifecycle. The only writer of booking
/// state and the only caller of capacity reserve/release.
pub struct BookingManager {
    availability: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
    promos: Arc<dyn PromoRepository>,
    offers: Arc<dyn OfferRepository>,
    catalog: Arc<dyn CatalogRepository>,
    notifier: Arc<dyn NotificationSink>,
    policy: BookingPolicy,
}

impl BookingManager {
    pub fn new(
        availability: Arc<dyn AvailabilityRepository>,
        bookings: Arc<dyn BookingRepository>,
        promos: Arc<dyn PromoRepository>,
        offers: Arc<dyn OfferRepository>,
        catalog: Arc<dyn CatalogRepository>,
        notifier: Arc<dyn NotificationSink>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            availability,
            bookings,
            promos,
            offers,
            catalog,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Price a request without touching capacity. Pure given the current
    /// rule set; callers may invoke this with unlimited parallelism.
    pub async fn quote(
        &self,
        location_id: Uuid,
        request: &QuoteRequest,
    ) -> Result<PriceQuote, BookingError> {
        let rate_card = self.catalog.rate_card().await?;
        let addons = self.catalog.list_addons().await?;
        let offers = self.offers.list_active().await?;
        let promos = self.promos.list_active().await?;
        let day_special = self
            .catalog
            .day_special(location_id, request.visit_date)
            .await?;

        let inputs = PricingInputs {
            rate_card: &rate_card,
            day_special,
            addons: &addons,
            offers: &offers,
            promos: &promos,
            policy: &self.policy.group_discount,
            now: Utc::now(),
        };
        Ok(price_quote(request, &inputs)?)
    }

    /// Create a `pending_payment` booking, reserving capacity atomically.
    ///
    /// All validation happens before the reservation; if persisting the
    /// booking row fails after the reservation succeeded, the reservation
    /// is compensated with a release before the error propagates.
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let headcount = request.headcount();
        if headcount < self.policy.min_tickets || headcount > self.policy.max_tickets {
            return Err(BookingError::InvalidTicketQuantity {
                count: headcount,
                min: self.policy.min_tickets,
                max: self.policy.max_tickets,
            });
        }
        for (&addon_id, &quantity) in &request.addons {
            if quantity > headcount {
                return Err(BookingError::AddonQuantityExceedsHeadcount {
                    addon_id,
                    quantity,
                    headcount,
                });
            }
        }

        if !request.offer_tickets.is_empty() {
            let birthday = request
                .contact
                .birthday
                .ok_or(BookingError::BirthdayRequired)?;
            let offers = self.offers.list_active().await?;
            for (&offer_id, &quantity) in &request.offer_tickets {
                let offer = offers
                    .iter()
                    .find(|o| o.id == offer_id)
                    .ok_or(turnstile_offer::PricingError::UnknownOffer(offer_id))?;
                rules::check_offer_eligibility(offer, birthday, request.visit_date, quantity)?;
            }
        }

        // Authoritative price; a client-supplied total is never trusted.
        let price = self.quote(request.location_id, &request.quote_request()).await?;

        self.availability
            .try_reserve(request.location_id, request.visit_date, headcount)
            .await?;

        let sequence = match self.bookings.next_reference().await {
            Ok(seq) => seq,
            Err(err) => {
                self.compensate_release(request.location_id, request.visit_date, headcount)
                    .await;
                return Err(err);
            }
        };
        let reference = format_reference(&self.policy.reference_prefix, sequence);
        let booking = Booking::new(
            request,
            reference,
            price,
            Duration::minutes(self.policy.hold_minutes),
        );

        if let Err(err) = self.bookings.insert(&booking).await {
            self.compensate_release(booking.location_id, booking.visit_date, headcount)
                .await;
            return Err(err);
        }

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            headcount,
            total = %booking.price.final_total,
            "booking created, awaiting payment"
        );
        Ok(booking)
    }

    /// Apply a payment outcome to a `pending_payment` booking.
    ///
    /// Gateway failures are recorded as a terminal state, never raised to
    /// the customer-facing caller.
    pub async fn confirm_payment(
        &self,
        booking_id: Uuid,
        outcome: PaymentOutcome,
    ) -> Result<Booking, BookingError> {
        let mut booking = self
            .bookings
            .fetch(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        match outcome {
            PaymentOutcome::Success => {
                let won = self
                    .bookings
                    .transition(booking_id, BookingStatus::PendingPayment, BookingStatus::Confirmed)
                    .await?;
                if !won {
                    return Err(BookingError::BookingNotPending(booking_id));
                }
                booking.status = BookingStatus::Confirmed;
                booking.payment_status = PaymentStatus::Success;

                // Usage counters are re-checked against the authoritative
                // store here; the counts consulted at creation time are
                // stale by definition. A late exhaustion reprices the
                // booking instead of failing the paid customer.
                if !booking.offer_tickets.is_empty() {
                    let offers = self.offers.list_active().await?;
                    let offer_ids: Vec<Uuid> = booking.offer_tickets.keys().copied().collect();
                    let mut converted = false;
                    for offer_id in offer_ids {
                        let quantity = booking.offer_tickets[&offer_id];
                        if self.offers.try_record_usage(offer_id, quantity).await? {
                            continue;
                        }
                        warn!(booking_id = %booking_id, %offer_id, "offer cap exhausted after quote, charging full price");
                        // The seats stay in the booking as full-price
                        // tickets of the offer's reference type, so the
                        // headcount and capacity accounting are unchanged.
                        let reference = offers
                            .iter()
                            .find(|o| o.id == offer_id)
                            .map(|o| o.reference_ticket)
                            .unwrap_or(TicketType::General);
                        booking.offer_tickets.remove(&offer_id);
                        *booking.tickets.entry(reference).or_insert(0) += quantity;
                        converted = true;
                    }
                    if converted {
                        booking.price =
                            self.quote(booking.location_id, &booking.quote_request()).await?;
                    }
                }
                if let Some(code) = booking.promo_code.clone() {
                    if !self.promos.try_consume(&code).await? {
                        warn!(booking_id = %booking_id, "promo exhausted after quote, repricing without it");
                        booking.promo_code = None;
                        booking.price =
                            self.quote(booking.location_id, &booking.quote_request()).await?;
                    }
                }
                booking.updated_at = Utc::now();
                self.bookings.update(&booking).await?;

                self.notify_confirmed(&booking).await;
                info!(booking_id = %booking_id, reference = %booking.reference, "booking confirmed");
            }
            PaymentOutcome::Failure => {
                let won = self
                    .bookings
                    .transition(
                        booking_id,
                        BookingStatus::PendingPayment,
                        BookingStatus::PaymentFailed,
                    )
                    .await?;
                if !won {
                    return Err(BookingError::BookingNotPending(booking_id));
                }
                booking.status = BookingStatus::PaymentFailed;
                booking.payment_status = PaymentStatus::Failed;
                booking.updated_at = Utc::now();
                self.bookings.update(&booking).await?;
                self.availability
                    .release(booking.location_id, booking.visit_date, booking.headcount())
                    .await?;
                info!(booking_id = %booking_id, "payment failed, capacity released");
            }
        }
        Ok(booking)
    }

    /// Cancel from `pending_payment` or `confirmed`, releasing capacity.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        let mut booking = self
            .bookings
            .fetch(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.status.is_terminal() {
            return Err(BookingError::BookingNotCancellable(booking_id));
        }
        let won = self
            .bookings
            .transition(booking_id, booking.status, BookingStatus::Cancelled)
            .await?;
        if !won {
            return Err(BookingError::BookingNotCancellable(booking_id));
        }
        booking.status = BookingStatus::Cancelled;
        booking.cancel_reason = reason;
        booking.updated_at = Utc::now();
        self.bookings.update(&booking).await?;
        self.availability
            .release(booking.location_id, booking.visit_date, booking.headcount())
            .await?;

        let event = BookingCancelledEvent {
            booking_id: booking.id,
            reference: booking.reference.clone(),
            reason: booking.cancel_reason.clone(),
            timestamp: Utc::now().timestamp(),
        };
        if let Err(err) = self.notifier.booking_cancelled(&event).await {
            warn!(booking_id = %booking.id, error = %err, "cancellation notification failed");
        }
        info!(booking_id = %booking_id, "booking cancelled");
        Ok(booking)
    }

    /// Expire lapsed `pending_payment` holds and reclaim their capacity.
    ///
    /// Safe to run concurrently with `confirm_payment` for the same
    /// booking: the conditional transition picks exactly one winner, and
    /// only the winner releases capacity. Per-booking storage errors are
    /// logged and retried on the next run.
    pub async fn expire_stale_bookings(&self) -> Result<u32, BookingError> {
        let stale = self.bookings.list_stale(Utc::now()).await?;
        let mut expired = 0;
        for mut booking in stale {
            let won = match self
                .bookings
                .transition(booking.id, BookingStatus::PendingPayment, BookingStatus::Expired)
                .await
            {
                Ok(won) => won,
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "expiry transition failed, will retry");
                    continue;
                }
            };
            if !won {
                // Lost to a concurrent confirmation; nothing to release.
                continue;
            }
            booking.status = BookingStatus::Expired;
            booking.updated_at = Utc::now();
            if let Err(err) = self.bookings.update(&booking).await {
                warn!(booking_id = %booking.id, error = %err, "expiry update failed");
            }
            if let Err(err) = self
                .availability
                .release(booking.location_id, booking.visit_date, booking.headcount())
                .await
            {
                warn!(booking_id = %booking.id, error = %err, "capacity release failed on expiry");
            }
            let event = BookingExpiredEvent {
                booking_id: booking.id,
                reference: booking.reference.clone(),
                released_headcount: booking.headcount(),
                timestamp: Utc::now().timestamp(),
            };
            if let Err(err) = self.notifier.booking_expired(&event).await {
                warn!(booking_id = %booking.id, error = %err, "expiry notification failed");
            }
            expired += 1;
        }
        if expired > 0 {
            info!(expired, "stale bookings swept");
        }
        Ok(expired)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .fetch(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    pub async fn get_booking_by_reference(
        &self,
        reference: &str,
    ) -> Result<Booking, BookingError> {
        self.bookings
            .fetch_by_reference(reference)
            .await?
            .ok_or_else(|| BookingError::ReferenceNotFound(reference.to_string()))
    }

    /// Notification failures never roll back a transition.
    async fn notify_confirmed(&self, booking: &Booking) {
        let event = BookingConfirmedEvent {
            booking_id: booking.id,
            reference: booking.reference.clone(),
            final_total: booking.price.final_total,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(err) = self.notifier.booking_confirmed(&event).await {
            warn!(booking_id = %booking.id, error = %err, "confirmation notification failed");
        }
    }

    /// Best-effort rollback of a reservation after a later step failed.
    async fn compensate_release(&self, location_id: Uuid, date: chrono::NaiveDate, count: u32) {
        if let Err(err) = self.availability.release(location_id, date, count).await {
            warn!(%location_id, %date, count, error = %err, "compensating release failed");
        }
    }
}
