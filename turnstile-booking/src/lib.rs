pub mod error;
pub mod manager;
pub mod models;
pub mod repository;

pub use error::BookingError;
pub use manager::{BookingManager, BookingPolicy};
pub use models::{Booking, BookingRequest, BookingStatus, ContactInfo};
pub use repository::{
    AvailabilityRepository, BookingRepository, CatalogRepository, OfferRepository, PromoRepository,
};
