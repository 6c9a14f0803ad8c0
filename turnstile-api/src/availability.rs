use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use turnstile_catalog::{AvailabilityDay, DayStatus};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Customer-facing view of one day; remaining counts are exposed as a
/// coarse status so clients cannot scrape exact load.
#[derive(Debug, Serialize)]
pub struct AvailabilityDayView {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub special_price: Option<Decimal>,
}

impl From<AvailabilityDay> for AvailabilityDayView {
    fn from(day: AvailabilityDay) -> Self {
        Self {
            date: day.date,
            status: day.status(),
            special_price: day.special_price,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/locations/{location_id}/availability",
        get(get_availability),
    )
}

async fn get_availability(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<AvailabilityDayView>>, ApiError> {
    let days = state
        .availability
        .get_range(location_id, params.from, params.to)
        .await?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}
