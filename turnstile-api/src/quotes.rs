use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Deserialize;
use turnstile_offer::{PriceQuote, QuoteRequest};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteBody {
    pub location_id: Uuid,
    #[serde(flatten)]
    pub request: QuoteRequest,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/quotes", post(create_quote))
}

/// Price a basket without reserving anything. The returned breakdown is
/// advisory; the booking call recomputes it authoritatively.
async fn create_quote(
    State(state): State<AppState>,
    Json(body): Json<QuoteBody>,
) -> Result<Json<PriceQuote>, ApiError> {
    let quote = state.manager.quote(body.location_id, &body.request).await?;
    Ok(Json(quote))
}
