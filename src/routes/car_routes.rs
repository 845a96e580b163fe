use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::CarController;
use crate::dto::car_dto::{
    AvailabilityResponse, AvailableCarQuery, AvailableCarResponse, CarSearchQuery, WindowQuery,
};
use crate::dto::ApiResponse;
use crate::models::car::CarDetails;
use crate::services::Quote;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_cars))
        .route("/:id", get(get_car))
        .route("/:id/availability", get(car_availability))
        .route("/:id/quote", get(car_quote))
}

pub fn create_model_router() -> Router<AppState> {
    Router::new().route("/:id/available-car", get(available_car_for_model))
}

async fn search_cars(
    State(state): State<AppState>,
    Query(query): Query<CarSearchQuery>,
) -> Result<Json<ApiResponse<Vec<CarDetails>>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.search(query).await?;
    Ok(Json(response))
}

async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CarDetails>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn car_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<AvailabilityResponse>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.availability(id, query).await?;
    Ok(Json(response))
}

async fn car_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Quote>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.quote(id, query).await?;
    Ok(Json(response))
}

async fn available_car_for_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailableCarQuery>,
) -> Result<Json<ApiResponse<AvailableCarResponse>>, AppError> {
    let controller = CarController::new(&state);
    let response = controller.available_for_model(id, query).await?;
    Ok(Json(response))
}
