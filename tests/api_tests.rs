mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use car_rental::create_app;
use car_rental::models::{booking::BookingStatus, car::CarStatus};
use car_rental::utils::clock::Clock;
use common::{at, TestEnv};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, header: (&str, Uuid), body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header(header.0, header.1.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn as_customer(method: &str, uri: &str, customer_id: Uuid) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-customer-id", customer_id.to_string())
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let env = TestEnv::new().await;
    let app = create_app(env.state());

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_booking_pay_and_list_flow() {
    let env = TestEnv::new().await;
    let car = env.car(50).await;
    let app = create_app(env.state());
    let customer = Uuid::new_v4();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings",
            ("x-customer-id", customer),
            json!({
                "car_id": car.id,
                "pickup_location_id": env.location.id,
                "dropoff_location_id": env.location.id,
                "pickup_at": "2024-01-10T10:00",
                "dropoff_at": "2024-01-12T11:00"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "Confirmed");
    // 49h -> 3 días a 50
    assert_eq!(body["data"]["price"], "150");
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/payments",
            ("x-customer-id", customer),
            json!({ "booking_id": booking_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["amount"], "150");

    let (status, body) = send(&app, as_customer("GET", "/api/bookings", customer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["payment_status"], "Paid");

    let (status, body) = send(
        &app,
        as_customer("DELETE", &format!("/api/bookings/{}", booking_id), customer),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NOT_CANCELLABLE");
}

#[tokio::test]
async fn test_conflicting_booking_returns_409() {
    let env = TestEnv::new().await;
    let car = env.car(50).await;
    env.booking(car.id, at(5, 0), at(8, 0), BookingStatus::InProgress, at(1, 0))
        .await;
    let app = create_app(env.state());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/bookings",
            ("x-customer-id", Uuid::new_v4()),
            json!({
                "car_id": car.id,
                "pickup_location_id": env.location.id,
                "dropoff_location_id": env.location.id,
                "pickup_at": "2024-01-07T00:00",
                "dropoff_at": "2024-01-10T00:00"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_invalid_range_and_missing_identity() {
    let env = TestEnv::new().await;
    let car = env.car(50).await;
    let app = create_app(env.state());

    let (status, body) = send(
        &app,
        get(&format!(
            "/api/cars/{}/availability?pickup_at=2024-01-10T10:00&dropoff_at=2024-01-09T10:00",
            car.id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");

    let (status, body) = send(&app, get("/api/bookings")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_search_hides_maintenance_cars_and_sweeps() {
    let env = TestEnv::new().await;
    let visible = env.car(30).await;
    env.car_with_status(20, CarStatus::Maintenance).await;
    let stale = env
        .booking(
            visible.id,
            at(10, 10),
            at(11, 10),
            BookingStatus::Confirmed,
            env.clock.now() - Duration::minutes(20),
        )
        .await;
    let app = create_app(env.state());

    let (status, body) = send(
        &app,
        get("/api/cars?pickup_at=2024-01-10T12:00&dropoff_at=2024-01-10T18:00"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let cars = body["data"].as_array().unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0]["id"], visible.id.to_string());
    assert_eq!(
        env.store.booking(stale.id).await.unwrap().status,
        BookingStatus::Cancelled
    );
}

#[tokio::test]
async fn test_model_availability_and_quote() {
    let env = TestEnv::new().await;
    let car = env.car(45).await;
    let app = create_app(env.state());

    let (status, body) = send(
        &app,
        get(&format!(
            "/api/models/{}/available-car?location_id={}&pickup_at=2024-01-10T10:00&dropoff_at=2024-01-11T10:00",
            env.model.id, env.location.id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["car_id"], car.id.to_string());

    let (status, body) = send(
        &app,
        get(&format!(
            "/api/cars/{}/quote?pickup_at=2024-01-10T10:00&dropoff_at=2024-01-12T10:30",
            car.id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["billed_days"], 2);
    assert_eq!(body["data"]["amount"], "90");
}

#[tokio::test]
async fn test_staff_status_transition_and_sweep() {
    let env = TestEnv::new().await;
    let car = env.car(50).await;
    let booking = env
        .booking(car.id, at(3, 8), at(5, 8), BookingStatus::Confirmed, env.clock.now())
        .await;
    let app = create_app(env.state());
    let staff = env.staff_id;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/bookings/{}/status", booking.id),
            ("x-staff-id", staff),
            json!({ "status": "In Progress" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "In Progress");
    assert_eq!(env.store.car(car.id).await.unwrap().status, CarStatus::Rented);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/bookings/{}/status", booking.id),
            ("x-staff-id", staff),
            json!({ "status": "Finished" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let sweep = Request::builder()
        .method("POST")
        .uri("/api/admin/sweep")
        .header("x-staff-id", staff.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, sweep).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancelled"], json!([]));
}

#[tokio::test]
async fn test_admin_car_lifecycle() {
    let env = TestEnv::new().await;
    let app = create_app(env.state());
    let staff = env.staff_id;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/cars",
            ("x-staff-id", staff),
            json!({
                "model_id": env.model.id,
                "car_type_id": Uuid::new_v4(),
                "rate": "39.50",
                "seats": 4,
                "doors": 3,
                "suitcases": 1,
                "location_id": env.location.id,
                "fuel": { "fuel_type": "Petrol", "octane_rating": 95, "fuel_tank_capacity": "45" }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "Available");
    assert_eq!(body["data"]["fuel"]["fuel_type"], "Petrol");
    let car_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/cars",
            ("x-staff-id", staff),
            json!({
                "model_id": env.model.id,
                "car_type_id": Uuid::new_v4(),
                "rate": "39.50",
                "seats": 0,
                "doors": 3,
                "suitcases": 1,
                "location_id": env.location.id
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/cars/{}/status", car_id),
            ("x-staff-id", staff),
            json!({ "status": "Maintenance" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Maintenance");

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/cars/{}", car_id))
        .header("x-staff-id", staff.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_payment_override_clears_payment_for_any_non_paid_value() {
    let env = TestEnv::new().await;
    let car = env.car(50).await;
    let booking = env
        .booking(car.id, at(10, 10), at(12, 10), BookingStatus::Confirmed, env.clock.now())
        .await;
    let app = create_app(env.state());
    let staff = env.staff_id;
    let uri = format!("/api/admin/bookings/{}/payment-status", booking.id);

    let (status, body) = send(
        &app,
        json_request("PUT", &uri, ("x-staff-id", staff), json!({ "status": "Paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], "100");
    assert!(env.store.payment(booking.id).await.is_some());

    let (status, body) = send(
        &app,
        json_request("PUT", &uri, ("x-staff-id", staff), json!({ "status": "Unpaid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);
    assert!(env.store.payment(booking.id).await.is_none());
}

#[tokio::test]
async fn test_admin_lists_maintenance_cars_and_edits_a_car() {
    let env = TestEnv::new().await;
    let parked = env.car_with_status(20, CarStatus::Maintenance).await;
    let app = create_app(env.state());
    let staff = env.staff_id;

    let (_, body) = send(&app, get("/api/cars")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let list = Request::builder()
        .uri("/api/admin/cars")
        .header("x-staff-id", staff.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, list).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], parked.id.to_string());
    assert_eq!(body["data"][0]["status"], "Maintenance");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/cars/{}", parked.id),
            ("x-staff-id", staff),
            json!({
                "model_id": env.model.id,
                "car_type_id": Uuid::new_v4(),
                "rate": "25",
                "seats": 4,
                "doors": 5,
                "suitcases": 3,
                "location_id": env.location.id,
                "fuel": { "fuel_type": "Electric", "battery_range": 350 }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rate"], "25");
    assert_eq!(body["data"]["status"], "Maintenance");
    assert_eq!(body["data"]["fuel"]["fuel_type"], "Electric");

    let stored = env.store.car(parked.id).await.unwrap();
    assert_eq!(stored.seats, 4);
    assert_eq!(stored.suitcases, 3);
}
