use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{post, put},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use turnstile_catalog::{Addon, TicketType};
use turnstile_offer::{BirthdayOffer, DiscountKind, PromoCode};
use uuid::Uuid;

use crate::availability::AvailabilityDayView;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DayOverrideBody {
    pub capacity: Option<i32>,
    pub special_price: Option<Decimal>,
    pub is_blackout: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TicketPriceBody {
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateAddonBody {
    pub name: String,
    pub price: Decimal,
    pub display_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreatePromoBody {
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_order_amount: Decimal,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOfferBody {
    pub name: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    pub reference_ticket: TicketType,
    pub days_before: i64,
    pub days_after: i64,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub per_booking_cap: u32,
    pub total_usage_cap: Option<u32>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/admin/locations/{location_id}/days/{date}",
            put(override_day),
        )
        .route("/v1/admin/ticket-prices/{ticket_type}", put(set_ticket_price))
        .route("/v1/admin/addons", post(create_addon))
        .route("/v1/admin/promos", post(create_promo))
        .route("/v1/admin/offers", post(create_offer))
}

async fn set_ticket_price(
    State(state): State<AppState>,
    Path(ticket_type): Path<TicketType>,
    Json(body): Json<TicketPriceBody>,
) -> Result<StatusCode, ApiError> {
    state.catalog.set_ticket_price(ticket_type, body.price).await?;
    info!(?ticket_type, price = %body.price, "ticket price updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn create_addon(
    State(state): State<AppState>,
    Json(body): Json<CreateAddonBody>,
) -> Result<Json<Addon>, ApiError> {
    let addon = Addon::new(body.name, body.price, body.display_order);
    state.catalog.create_addon(&addon).await?;
    Ok(Json(addon))
}

async fn create_promo(
    State(state): State<AppState>,
    Json(body): Json<CreatePromoBody>,
) -> Result<Json<PromoCode>, ApiError> {
    let promo = PromoCode {
        id: Uuid::new_v4(),
        code: PromoCode::normalize(&body.code),
        discount_kind: body.discount_kind,
        discount_value: body.discount_value,
        min_order_amount: body.min_order_amount,
        max_discount: body.max_discount,
        usage_limit: body.usage_limit,
        used_count: 0,
        valid_from: body.valid_from,
        valid_until: body.valid_until,
        is_active: true,
    };
    state.promos.create(&promo).await?;
    info!(code = %promo.code, "promo code created");
    Ok(Json(promo))
}

async fn create_offer(
    State(state): State<AppState>,
    Json(body): Json<CreateOfferBody>,
) -> Result<Json<BirthdayOffer>, ApiError> {
    let offer = BirthdayOffer {
        id: Uuid::new_v4(),
        name: body.name,
        discount_kind: body.discount_kind,
        discount_value: body.discount_value,
        reference_ticket: body.reference_ticket,
        days_before: body.days_before,
        days_after: body.days_after,
        min_age: body.min_age,
        max_age: body.max_age,
        per_booking_cap: body.per_booking_cap,
        total_usage_cap: body.total_usage_cap,
        used_count: 0,
        valid_from: body.valid_from,
        valid_until: body.valid_until,
        is_active: true,
    };
    state.offers.create(&offer).await?;
    info!(offer = %offer.name, "birthday offer created");
    Ok(Json(offer))
}

/// Admin override of a single day's capacity, special price or blackout
/// flag. Shrinking capacity below the reserved count is rejected.
async fn override_day(
    State(state): State<AppState>,
    Path((location_id, date)): Path<(Uuid, NaiveDate)>,
    Json(body): Json<DayOverrideBody>,
) -> Result<Json<AvailabilityDayView>, ApiError> {
    let day = state
        .availability
        .set_override(
            location_id,
            date,
            body.capacity,
            body.special_price,
            body.is_blackout,
        )
        .await?;
    info!(%location_id, %date, "availability day overridden");
    Ok(Json(day.into()))
}
