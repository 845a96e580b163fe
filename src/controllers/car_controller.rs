use uuid::Uuid;
use validator::Validate;

use crate::dto::car_dto::{
    AvailabilityResponse, AvailableCarQuery, AvailableCarResponse, CarSearchQuery, CreateCarRequest,
    UpdateCarRequest, UpdateCarStatusRequest, WindowQuery,
};
use crate::dto::ApiResponse;
use crate::models::car::{Car, CarDetails, CarStatus};
use crate::services::{AvailabilityService, InventoryService, Quote};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::parse_datetime;

pub struct CarController {
    inventory: InventoryService,
    availability: AvailabilityService,
}

impl CarController {
    pub fn new(state: &AppState) -> Self {
        Self {
            inventory: state.inventory_service(),
            availability: state.availability_service(),
        }
    }

    pub async fn search(&self, query: CarSearchQuery) -> Result<ApiResponse<Vec<CarDetails>>, AppError> {
        let (filters, window) = query.into_parts()?;
        let cars = self.inventory.search_cars(&filters, window).await?;
        Ok(ApiResponse::success(cars))
    }

    pub async fn get_by_id(&self, car_id: Uuid) -> Result<ApiResponse<CarDetails>, AppError> {
        let car = self.inventory.get_car(car_id).await?;
        Ok(ApiResponse::success(car))
    }

    pub async fn availability(
        &self,
        car_id: Uuid,
        query: WindowQuery,
    ) -> Result<ApiResponse<AvailabilityResponse>, AppError> {
        let window = query.window()?;
        let available = self
            .availability
            .is_available(car_id, window.pickup_at(), window.dropoff_at())
            .await?;

        Ok(ApiResponse::success(AvailabilityResponse {
            car_id,
            pickup_at: window.pickup_at(),
            dropoff_at: window.dropoff_at(),
            available,
        }))
    }

    pub async fn quote(&self, car_id: Uuid, query: WindowQuery) -> Result<ApiResponse<Quote>, AppError> {
        let window = query.window()?;
        let quote = self
            .inventory
            .quote(car_id, window.pickup_at(), window.dropoff_at())
            .await?;
        Ok(ApiResponse::success(quote))
    }

    pub async fn available_for_model(
        &self,
        model_id: Uuid,
        query: AvailableCarQuery,
    ) -> Result<ApiResponse<AvailableCarResponse>, AppError> {
        let pickup_at = parse_datetime("pickup_at", &query.pickup_at)?;
        let dropoff_at = parse_datetime("dropoff_at", &query.dropoff_at)?;

        let car_id = self
            .availability
            .find_available_car(model_id, query.location_id, pickup_at, dropoff_at)
            .await?;

        Ok(ApiResponse::success(AvailableCarResponse {
            model_id,
            location_id: query.location_id,
            car_id,
        }))
    }

    pub async fn create(&self, request: CreateCarRequest) -> Result<ApiResponse<CarDetails>, AppError> {
        request.validate()?;
        let car = self.inventory.create_car(request.into()).await?;
        Ok(ApiResponse::success_with_message(car, "Car created"))
    }

    pub async fn list_all(&self) -> Result<ApiResponse<Vec<CarDetails>>, AppError> {
        let cars = self.inventory.list_all_cars().await?;
        Ok(ApiResponse::success(cars))
    }

    pub async fn update(
        &self,
        car_id: Uuid,
        request: UpdateCarRequest,
    ) -> Result<ApiResponse<CarDetails>, AppError> {
        request.validate()?;
        let car = self.inventory.update_car(car_id, request.into()).await?;
        Ok(ApiResponse::success_with_message(car, "Car updated"))
    }

    pub async fn delete(&self, car_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.inventory.delete_car(car_id).await?;
        Ok(ApiResponse::message("Car deleted"))
    }

    pub async fn update_status(
        &self,
        car_id: Uuid,
        request: UpdateCarStatusRequest,
    ) -> Result<ApiResponse<Car>, AppError> {
        let status: CarStatus = request.status.parse()?;
        let car = self.inventory.set_car_status(car_id, status).await?;
        Ok(ApiResponse::success(car))
    }
}
