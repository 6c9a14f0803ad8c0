use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};
use turnstile_booking::BookingManager;

/// Periodic sweep that expires lapsed `pending_payment` holds.
///
/// Errors are logged and retried on the next tick; a booking that cannot
/// be expired on time simply stays pending a little longer.
pub async fn start_expiry_worker(manager: Arc<BookingManager>, interval_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(interval_seconds));
    info!(interval_seconds, "expiry worker started");

    loop {
        ticker.tick().await;
        match manager.expire_stale_bookings().await {
            Ok(0) => {}
            Ok(expired) => info!(expired, "expiry sweep reclaimed holds"),
            Err(err) => error!(error = %err, "expiry sweep failed, retrying next tick"),
        }
    }
}
