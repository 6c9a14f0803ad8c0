use std::sync::Arc;
use turnstile_booking::repository::{
    AvailabilityRepository, CatalogRepository, OfferRepository, PromoRepository,
};
use turnstile_booking::BookingManager;
use turnstile_core::payment::PaymentAdapter;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<BookingManager>,
    /// Availability reads and admin surfaces bypass the lifecycle manager.
    pub availability: Arc<dyn AvailabilityRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub promos: Arc<dyn PromoRepository>,
    pub offers: Arc<dyn OfferRepository>,
    pub payments: Arc<dyn PaymentAdapter>,
    pub currency: String,
}
