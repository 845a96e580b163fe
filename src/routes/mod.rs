//! Rutas HTTP
//!
//! Cada módulo expone un `create_*_router()` que se anida en `create_app`.

pub mod admin_routes;
pub mod booking_routes;
pub mod car_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/cars", car_routes::create_car_router())
        .nest("/api/models", car_routes::create_model_router())
        .nest("/api/bookings", booking_routes::create_booking_router())
        .nest("/api/payments", booking_routes::create_payment_router())
        .nest("/api/admin", admin_routes::create_admin_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "car-rental",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
