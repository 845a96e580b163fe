//! Rutas del personal
//!
//! Todas exigen `X-Staff-Id`; el id solo se usa para trazar quién hizo el cambio.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::{BookingController, CarController};
use crate::dto::booking_dto::{UpdateBookingStatusRequest, UpdatePaymentStatusRequest};
use crate::dto::car_dto::{CreateCarRequest, UpdateCarRequest, UpdateCarStatusRequest};
use crate::dto::ApiResponse;
use crate::middleware::StaffId;
use crate::models::{
    booking::{Booking, BookingSummary},
    car::{Car, CarDetails},
    payment::Payment,
};
use crate::services::SweepReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_all_bookings))
        .route("/bookings/:id/status", put(update_booking_status))
        .route("/bookings/:id/payment-status", put(update_payment_status))
        .route("/cars", get(list_all_cars).post(create_car))
        .route("/cars/:id", put(update_car).delete(delete_car))
        .route("/cars/:id/status", put(update_car_status))
        .route("/sweep", post(sweep_expired))
}

async fn list_all_bookings(
    State(state): State<AppState>,
    StaffId(_staff_id): StaffId,
) -> Result<Json<ApiResponse<Vec<BookingSummary>>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.list_all().await?;
    Ok(Json(response))
}

async fn update_booking_status(
    State(state): State<AppState>,
    StaffId(staff_id): StaffId,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    log::info!("👤 Staff {} sets booking {} to '{}'", staff_id, id, request.status);
    let controller = BookingController::new(&state);
    let response = controller.update_status(id, request).await?;
    Ok(Json(response))
}

async fn update_payment_status(
    State(state): State<AppState>,
    StaffId(staff_id): StaffId,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<ApiResponse<Option<Payment>>>, AppError> {
    log::info!("👤 Staff {} sets payment of booking {} to '{}'", staff_id, id, request.status);
    let controller = BookingController::new(&state);
    let response = controller.update_payment_status(id, request).await?;
    Ok(Json(response))
}

async fn list_all_cars(
    State(state): State<AppState>,
    StaffId(_staff_id): StaffId,
) -> Result<Json<ApiResponse<Vec<CarDetails>>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.list_all().await?;
    Ok(Json(response))
}

async fn create_car(
    State(state): State<AppState>,
    StaffId(_staff_id): StaffId,
    Json(request): Json<CreateCarRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CarDetails>>), AppError> {
    let controller = CarController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_car(
    State(state): State<AppState>,
    StaffId(staff_id): StaffId,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCarRequest>,
) -> Result<Json<ApiResponse<CarDetails>>, AppError> {
    log::info!("👤 Staff {} edits car {}", staff_id, id);
    let controller = CarController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_car(
    State(state): State<AppState>,
    StaffId(_staff_id): StaffId,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn update_car_status(
    State(state): State<AppState>,
    StaffId(_staff_id): StaffId,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCarStatusRequest>,
) -> Result<Json<ApiResponse<Car>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.update_status(id, request).await?;
    Ok(Json(response))
}

async fn sweep_expired(
    State(state): State<AppState>,
    StaffId(_staff_id): StaffId,
) -> Result<Json<ApiResponse<SweepReport>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.sweep().await?;
    Ok(Json(response))
}
