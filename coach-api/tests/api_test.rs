use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use coach_api::middleware::issue_token;
use coach_api::state::{AppState, AuthConfig, RateLimit};
use coach_api::app;
use coach_core::clock::FixedClock;
use coach_core::identity::Principal;
use coach_order::{EngineSettings, InMemoryStore, Stores};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    admin: String,
}

impl TestApp {
    fn new() -> Self {
        let stores = Stores::shared(Arc::new(InMemoryStore::new()));
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap()));
        let state = AppState::new(
            stores,
            clock,
            EngineSettings::default(),
            AuthConfig {
                secret: SECRET.to_string(),
            },
            None,
            RateLimit {
                requests: 100,
                window_seconds: 60,
            },
        );
        Self {
            router: app(state),
            admin: token(&Principal::admin(Uuid::new_v4())),
        }
    }

    async fn call(&self, method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Adds a 40-seat bus and a daily Pune to Goa route at 500 per seat.
    async fn seed(&self) -> (String, String) {
        let (status, bus) = self
            .call(
                Method::POST,
                "/api/admin/buses",
                Some(&self.admin),
                Some(json!({
                    "name": "Night Rider",
                    "busNumber": "mh12ab1234",
                    "busType": "Sleeper",
                    "totalSeats": 40,
                    "amenities": ["WiFi", "Blanket"],
                    "operator": "Konkan Travels"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let bus_id = bus["data"]["id"].as_str().unwrap().to_string();

        let (status, route) = self
            .call(
                Method::POST,
                "/api/admin/routes",
                Some(&self.admin),
                Some(json!({
                    "busId": bus_id,
                    "source": "Pune",
                    "destination": "Goa",
                    "departureTime": "21:00",
                    "arrivalTime": "07:00",
                    "duration": "10h",
                    "distance": 450,
                    "price": 500
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let route_id = route["data"]["id"].as_str().unwrap().to_string();
        (bus_id, route_id)
    }
}

fn token(principal: &Principal) -> String {
    issue_token(SECRET, principal, 3600).unwrap()
}

fn booking_body(bus_id: &str, route_id: &str, seats: &[&str]) -> Value {
    json!({
        "busId": bus_id,
        "routeId": route_id,
        "journeyDate": "2025-06-01",
        "seats": seats.iter().map(|s| json!({
            "seatNumber": s,
            "passengerName": "Asha",
            "passengerAge": 29,
            "passengerGender": "Female"
        })).collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_booking_requires_token() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::POST, "/api/bookings", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.call(Method::GET, "/api/admin/stats", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_users() {
    let app = TestApp::new();
    let user = token(&Principal::user(Uuid::new_v4()));
    let (status, body) = app.call(Method::GET, "/api/admin/buses", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. Admin only.");
}

#[tokio::test]
async fn test_reserve_search_and_conflict() {
    let app = TestApp::new();
    let (bus_id, route_id) = app.seed().await;
    let user = token(&Principal::user(Uuid::new_v4()));

    let (status, body) = app
        .call(Method::POST, "/api/bookings", Some(&user), Some(booking_body(&bus_id, &route_id, &["A1", "A2"])))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["totalAmount"], 1000);
    assert_eq!(body["data"]["bookingStatus"], "confirmed");
    assert_eq!(body["data"]["paymentStatus"], "pending");
    assert!(body["data"]["bookingId"].as_str().unwrap().starts_with("BKG"));

    let (status, body) = app
        .call(Method::POST, "/api/bookings", Some(&user), Some(booking_body(&bus_id, &route_id, &["A1", "A3"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Seats A1 are already booked");

    let (status, body) = app
        .call(Method::GET, "/api/buses/search?source=pune&destination=goa&date=2025-06-01", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["availableSeats"], 38);

    let (status, _) = app.call(Method::GET, "/api/buses/search?source=pune", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_payload_is_bad_request() {
    let app = TestApp::new();
    let (bus_id, route_id) = app.seed().await;
    let user = token(&Principal::user(Uuid::new_v4()));

    let mut payload = booking_body(&bus_id, &route_id, &["A1"]);
    payload["seats"][0]["passengerAge"] = json!(0);
    let (status, body) = app.call(Method::POST, "/api/bookings", Some(&user), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let mut payload = booking_body(&bus_id, &route_id, &["A1"]);
    payload["seats"][0]["passengerGender"] = json!("unknown");
    let (status, _) = app.call(Method::POST, "/api/bookings", Some(&user), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_and_pay_permissions() {
    let app = TestApp::new();
    let (bus_id, route_id) = app.seed().await;
    let owner = token(&Principal::user(Uuid::new_v4()));

    let (_, body) = app
        .call(Method::POST, "/api/bookings", Some(&owner), Some(booking_body(&bus_id, &route_id, &["B1"])))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/bookings/{}/payment", id),
            Some(&app.admin),
            Some(json!({"paymentMethod": "card"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/bookings/{}/payment", id),
            Some(&owner),
            Some(json!({"paymentMethod": "card", "transactionId": "PAY-42"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["paymentStatus"], "completed");
    assert_eq!(body["data"]["transactionId"], "PAY-42");

    let (status, body) = app
        .call(Method::PUT, &format!("/api/bookings/{}/cancel", id), Some(&app.admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refundPercentage"], 90);
    assert_eq!(body["data"]["refundAmount"], 450);
    assert_eq!(body["data"]["booking"]["paymentStatus"], "refunded");

    let (status, body) = app
        .call(Method::PUT, &format!("/api/bookings/{}/cancel", id), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Booking is already cancelled");

    let (status, body) = app.call(Method::GET, "/api/admin/stats", Some(&app.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bookings"]["cancelled"], 1);
    assert_eq!(body["data"]["revenue"], 0);
}

#[tokio::test]
async fn test_seat_layout_and_seat_map() {
    let app = TestApp::new();
    let (bus_id, route_id) = app.seed().await;

    let seats: Vec<Value> = (1..=40)
        .map(|n| json!({"seatNumber": format!("S{}", n), "row": (n - 1) / 4 + 1, "column": (n - 1) % 4 + 1}))
        .collect();
    let (status, _) = app
        .call(
            Method::POST,
            "/api/admin/seat-layouts",
            Some(&app.admin),
            Some(json!({"busId": bus_id, "layout": "2x2", "seats": seats})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let user = token(&Principal::user(Uuid::new_v4()));
    let (status, body) = app
        .call(Method::POST, "/api/bookings", Some(&user), Some(booking_body(&bus_id, &route_id, &["S1", "X9"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid seat numbers: X9");

    let (status, _) = app
        .call(Method::POST, "/api/bookings", Some(&user), Some(booking_body(&bus_id, &route_id, &["S3"])))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/buses/{}/seats?routeId={}&date=2025-06-01", bus_id, route_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let booked: Vec<&str> = body["data"]["seats"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["isBooked"] == true)
        .map(|s| s["seatNumber"].as_str().unwrap())
        .collect();
    assert_eq!(booked, vec!["S3"]);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/admin/buses/{}", bus_id), Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_booking_filters() {
    let app = TestApp::new();
    let (bus_id, route_id) = app.seed().await;
    let user = token(&Principal::user(Uuid::new_v4()));
    app.call(Method::POST, "/api/bookings", Some(&user), Some(booking_body(&bus_id, &route_id, &["A1"])))
        .await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/admin/bookings?status=confirmed&date=2025-06-01&busId={}", bus_id),
            Some(&app.admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = app
        .call(Method::GET, "/api/admin/bookings?status=cancelled", Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, _) = app
        .call(Method::GET, "/api/admin/bookings?status=lost", Some(&app.admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
