use turnstile_offer::{OfferError, PricingError};
use uuid::Uuid;

/// Everything that can go wrong between a booking request and a terminal
/// booking state.
///
/// Validation variants are raised before any capacity mutation; storage
/// variants may surface after a compensating release has already run.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: u32, available: u32 },

    #[error("Date is blacked out for bookings")]
    BlackoutDate,

    #[error("Ticket count {count} outside the allowed {min}..={max} per booking")]
    InvalidTicketQuantity { count: u32, min: u32, max: u32 },

    #[error("Add-on quantity {quantity} exceeds booking headcount {headcount}")]
    AddonQuantityExceedsHeadcount { addon_id: Uuid, quantity: u32, headcount: u32 },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Offer not eligible: {0}")]
    OfferIneligible(#[from] OfferError),

    #[error("Birthday date is required for offer tickets")]
    BirthdayRequired,

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("No booking with reference {0}")]
    ReferenceNotFound(String),

    #[error("Booking {0} is not awaiting payment")]
    BookingNotPending(Uuid),

    #[error("Booking {0} cannot be cancelled from its current state")]
    BookingNotCancellable(Uuid),

    #[error("Capacity {requested} is below the already reserved count {reserved}")]
    CapacityBelowReserved { requested: i32, reserved: i32 },

    #[error("Unknown location: {0}")]
    UnknownLocation(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),
}
