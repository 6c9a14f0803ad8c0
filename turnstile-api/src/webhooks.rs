use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use turnstile_core::payment::PaymentOutcome;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentCallback {
    pub booking_id: Uuid,
    pub outcome: PaymentOutcome,
    pub gateway_reference: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(handle_payment_callback))
}

/// POST /v1/webhooks/payments
/// Receives the gateway's payment outcome for a booking.
async fn handle_payment_callback(
    State(state): State<AppState>,
    Json(payload): Json<PaymentCallback>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(
        booking_id = %payload.booking_id,
        outcome = ?payload.outcome,
        gateway_reference = ?payload.gateway_reference,
        "payment callback received"
    );

    match state
        .manager
        .confirm_payment(payload.booking_id, payload.outcome)
        .await
    {
        Ok(_) => Ok(StatusCode::OK),
        // Late callbacks for already-settled bookings are acknowledged so
        // the gateway stops retrying.
        Err(turnstile_booking::BookingError::BookingNotPending(_)) => Ok(StatusCode::OK),
        Err(turnstile_booking::BookingError::BookingNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            tracing::error!(booking_id = %payload.booking_id, error = %err, "payment callback failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
