use async_trait::async_trait;
use turnstile_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, BookingExpiredEvent,
};

/// Downstream notification collaborator (email/SMS, QR delivery).
///
/// Invoked after a booking transition has been committed; a sink failure is
/// logged by the caller and never rolls the transition back.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn booking_confirmed(
        &self,
        event: &BookingConfirmedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn booking_cancelled(
        &self,
        event: &BookingCancelledEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn booking_expired(
        &self,
        event: &BookingExpiredEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Sink that only records notifications in the log stream.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn booking_confirmed(
        &self,
        event: &BookingConfirmedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(booking_id = %event.booking_id, reference = %event.reference, "notify: booking confirmed");
        Ok(())
    }

    async fn booking_cancelled(
        &self,
        event: &BookingCancelledEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(booking_id = %event.booking_id, reference = %event.reference, "notify: booking cancelled");
        Ok(())
    }

    async fn booking_expired(
        &self,
        event: &BookingExpiredEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(booking_id = %event.booking_id, reference = %event.reference, "notify: booking expired");
        Ok(())
    }
}
