use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use turnstile_booking::BookingError;
use turnstile_offer::PricingError;

#[derive(Debug)]
pub enum ApiError {
    Booking(BookingError),
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Booking(err) => (booking_status(&err), err.to_string()),
            ApiError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

fn booking_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::BookingNotFound(_)
        | BookingError::ReferenceNotFound(_)
        | BookingError::Pricing(PricingError::PromoNotFound) => StatusCode::NOT_FOUND,
        BookingError::InsufficientCapacity { .. }
        | BookingError::BookingNotPending(_)
        | BookingError::BookingNotCancellable(_)
        | BookingError::CapacityBelowReserved { .. } => StatusCode::CONFLICT,
        BookingError::Storage(msg) => {
            tracing::error!("Storage error: {}", msg);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}
