use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::BookingController;
use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::payment_dto::PayRequest;
use crate::dto::ApiResponse;
use crate::middleware::CustomerId;
use crate::models::{
    booking::{Booking, BookingSummary},
    payment::Payment,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:id", get(get_booking).delete(cancel_booking))
}

pub fn create_payment_router() -> Router<AppState> {
    Router::new().route("/", post(pay_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let controller = BookingController::new(&state);
    let response = controller.create(customer_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_bookings(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
) -> Result<Json<ApiResponse<Vec<BookingSummary>>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.list_for_customer(customer_id).await?;
    Ok(Json(response))
}

async fn get_booking(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookingSummary>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.get_for_customer(id, customer_id).await?;
    Ok(Json(response))
}

async fn cancel_booking(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.cancel(id, customer_id).await?;
    Ok(Json(response))
}

async fn pay_booking(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Json(request): Json<PayRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Payment>>), AppError> {
    let controller = BookingController::new(&state);
    let response = controller.pay(request.booking_id, customer_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
