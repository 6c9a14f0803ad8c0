//! Router tests over the in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use turnstile_api::{app, AppState};
use turnstile_booking::{BookingManager, BookingPolicy};
use turnstile_catalog::{Location, RateCard, TicketCatalog, TicketType};
use turnstile_core::notify::LogNotificationSink;
use turnstile_core::payment::MockPaymentAdapter;
use turnstile_store::MemoryStore;
use uuid::Uuid;

fn rate_card() -> RateCard {
    let mut prices = HashMap::new();
    prices.insert(TicketType::General, dec!(400));
    prices.insert(TicketType::Child, dec!(280));
    prices.insert(TicketType::Senior, dec!(320));
    RateCard::new(TicketCatalog::new(prices), vec![])
}

async fn test_app() -> (axum::Router, Uuid) {
    let store = Arc::new(MemoryStore::new(rate_card()));
    let location = Location::new("Riverfront Museum", 100);
    let location_id = location.id;
    store.register_location(location).await;

    let manager = Arc::new(BookingManager::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(LogNotificationSink),
        BookingPolicy::default(),
    ));
    let state = AppState {
        manager,
        availability: store.clone(),
        catalog: store.clone(),
        promos: store.clone(),
        offers: store,
        payments: Arc::new(MockPaymentAdapter),
        currency: "INR".to_string(),
    };
    (app(state), location_id)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn availability_range_reports_day_status() {
    let (app, location_id) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/v1/locations/{location_id}/availability?from=2026-09-12&to=2026-09-14"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let days = body_json(response).await;
    assert_eq!(days.as_array().unwrap().len(), 3);
    assert_eq!(days[0]["status"], "AVAILABLE");
    assert_eq!(days[0]["date"], "2026-09-12");
}

#[tokio::test]
async fn quote_returns_group_discount_breakdown() {
    let (app, location_id) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/v1/quotes",
            json!({
                "location_id": location_id,
                "visit_date": "2026-09-12",
                "tickets": {"GENERAL": 10, "CHILD": 5},
                "offer_tickets": {},
                "addons": {},
                "promo_code": null
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let quote = body_json(response).await;
    assert_eq!(quote["subtotal"], json!("5400"));
    assert_eq!(quote["group_discount"], json!("270"));
    assert_eq!(quote["final_total"], json!("5130.00"));
}

#[tokio::test]
async fn booking_flow_create_confirm_fetch() {
    let (app, location_id) = test_app().await;

    let create = app
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "location_id": location_id,
                "visit_date": "2026-09-12",
                "contact": {
                    "name": "Asha Rao",
                    "email": "asha@example.com",
                    "phone": "+91-98765-43210",
                    "birthday": null
                },
                "tickets": {"GENERAL": 2},
                "offer_tickets": {},
                "addons": {},
                "promo_code": null
            }),
        ))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);
    let created = body_json(create).await;
    assert_eq!(created["status"], "PENDING_PAYMENT");
    assert_eq!(created["reference"], "TRN-000001");
    let booking_id = created["booking_id"].as_str().unwrap().to_string();

    let webhook = app
        .clone()
        .oneshot(post_json(
            "/v1/webhooks/payments",
            json!({
                "booking_id": booking_id,
                "outcome": "SUCCESS",
                "gateway_reference": "pi_test_123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(webhook.status(), StatusCode::OK);

    let fetched = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/bookings/{booking_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let booking = body_json(fetched).await;
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["payment_status"], "SUCCESS");
}

#[tokio::test]
async fn oversized_booking_is_rejected() {
    let (app, location_id) = test_app().await;

    let response = app
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "location_id": location_id,
                "visit_date": "2026-09-12",
                "contact": {
                    "name": "Asha Rao",
                    "email": "asha@example.com",
                    "phone": "+91-98765-43210",
                    "birthday": null
                },
                "tickets": {"GENERAL": 51},
                "offer_tickets": {},
                "addons": {},
                "promo_code": null
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Ticket count"));
}

#[tokio::test]
async fn admin_created_promo_applies_to_quotes() {
    let (app, location_id) = test_app().await;

    let created = app
        .clone()
        .oneshot(post_json(
            "/v1/admin/promos",
            json!({
                "code": "launch10",
                "discount_kind": "PERCENTAGE",
                "discount_value": 10
            }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let promo = body_json(created).await;
    assert_eq!(promo["code"], "LAUNCH10");

    let response = app
        .oneshot(post_json(
            "/v1/quotes",
            json!({
                "location_id": location_id,
                "visit_date": "2026-09-12",
                "tickets": {"GENERAL": 1},
                "offer_tickets": {},
                "addons": {},
                "promo_code": "launch10"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quote = body_json(response).await;
    assert_eq!(quote["promo_discount"], json!("40"));
    assert_eq!(quote["final_total"], json!("360.00"));
}

#[tokio::test]
async fn admin_blackout_then_booking_conflict() {
    let (app, location_id) = test_app().await;

    let blackout = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/admin/locations/{location_id}/days/2026-09-12"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"capacity": null, "special_price": null, "is_blackout": true})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(blackout.status(), StatusCode::OK);
    let day = body_json(blackout).await;
    assert_eq!(day["status"], "SOLD_OUT");

    let response = app
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "location_id": location_id,
                "visit_date": "2026-09-12",
                "contact": {
                    "name": "Asha Rao",
                    "email": "asha@example.com",
                    "phone": "+91-98765-43210",
                    "birthday": null
                },
                "tickets": {"GENERAL": 2},
                "offer_tickets": {},
                "addons": {},
                "promo_code": null
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
