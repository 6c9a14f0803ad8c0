use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use turnstile_booking::{Booking, BookingRequest, BookingStatus};
use turnstile_core::payment::PaymentStatus;
use turnstile_offer::PriceQuote;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub reference: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub price: PriceQuote,
    pub expires_at: DateTime<Utc>,
    /// Payment intent the client completes before the hold lapses.
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route(
            "/v1/bookings/by-reference/{reference}",
            get(get_booking_by_reference),
        )
        .route("/v1/bookings/{booking_id}/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.manager.create_booking(request).await?;

    // A failed intent creation leaves the hold in place; the client can
    // retry payment until the hold lapses.
    let payment_intent_id = match state
        .payments
        .create_intent(booking.id, booking.price.final_total, &state.currency)
        .await
    {
        Ok(intent) => Some(intent.id),
        Err(err) => {
            info!(booking_id = %booking.id, error = %err, "payment intent creation failed");
            None
        }
    };

    Ok(Json(response(booking, payment_intent_id)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.manager.get_booking(booking_id).await?;
    Ok(Json(response(booking, None)))
}

async fn get_booking_by_reference(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.manager.get_booking_by_reference(&reference).await?;
    Ok(Json(response(booking, None)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<CancelBody>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.manager.cancel_booking(booking_id, body.reason).await?;
    Ok(Json(response(booking, None)))
}

fn response(booking: Booking, payment_intent_id: Option<String>) -> BookingResponse {
    BookingResponse {
        booking_id: booking.id,
        reference: booking.reference,
        status: booking.status,
        payment_status: booking.payment_status,
        price: booking.price,
        expires_at: booking.expires_at,
        payment_intent_id,
    }
}
