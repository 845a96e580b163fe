use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    booking::RentalWindow,
    car::{CarFilters, FuelDetails, FuelType, NewCar},
};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::parse_datetime;

// Query de búsqueda de coches; la ventana es opcional pero va completa
#[derive(Debug, Default, Deserialize)]
pub struct CarSearchQuery {
    pub location_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub car_type_id: Option<Uuid>,
    pub fuel_type: Option<FuelType>,
    pub seats: Option<i32>,
    pub suitcases: Option<i32>,
    pub min_rate: Option<Decimal>,
    pub max_rate: Option<Decimal>,
    pub pickup_at: Option<String>,
    pub dropoff_at: Option<String>,
}

impl CarSearchQuery {
    pub fn into_parts(self) -> AppResult<(CarFilters, Option<RentalWindow>)> {
        let window = match (self.pickup_at.as_deref(), self.dropoff_at.as_deref()) {
            (Some(pickup), Some(dropoff)) => Some(WindowQuery::parse(pickup, dropoff)?),
            (None, None) => None,
            _ => {
                return Err(AppError::InvalidRange(
                    "pickup_at and dropoff_at must be given together".to_string(),
                ))
            }
        };

        let filters = CarFilters {
            location_id: self.location_id,
            model_id: self.model_id,
            brand_id: self.brand_id,
            car_type_id: self.car_type_id,
            fuel_type: self.fuel_type,
            seats: self.seats,
            suitcases: self.suitcases,
            min_rate: self.min_rate,
            max_rate: self.max_rate,
        };

        Ok((filters, window))
    }
}

// Ventana de alquiler en query string
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub pickup_at: String,
    pub dropoff_at: String,
}

impl WindowQuery {
    fn parse(pickup_at: &str, dropoff_at: &str) -> AppResult<RentalWindow> {
        RentalWindow::new(
            parse_datetime("pickup_at", pickup_at)?,
            parse_datetime("dropoff_at", dropoff_at)?,
        )
    }

    pub fn window(&self) -> AppResult<RentalWindow> {
        Self::parse(&self.pickup_at, &self.dropoff_at)
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailableCarQuery {
    pub location_id: Uuid,
    pub pickup_at: String,
    pub dropoff_at: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub car_id: Uuid,
    pub pickup_at: DateTime<Utc>,
    pub dropoff_at: DateTime<Utc>,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct AvailableCarResponse {
    pub model_id: Uuid,
    pub location_id: Uuid,
    pub car_id: Option<Uuid>,
}

fn validate_positive_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_positive() && !rate.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("rate_must_be_positive"))
    }
}

// Request para dar de alta un coche
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    pub model_id: Uuid,
    pub car_type_id: Uuid,
    #[validate(custom = "validate_positive_rate")]
    pub rate: Decimal,
    #[validate(range(min = 1, max = 20))]
    pub seats: i32,
    #[validate(range(min = 1, max = 8))]
    pub doors: i32,
    #[validate(range(min = 0, max = 20))]
    pub suitcases: i32,
    #[validate(length(min = 1, max = 50))]
    pub colour: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub location_id: Uuid,
    pub fuel: Option<FuelDetails>,
}

impl From<CreateCarRequest> for NewCar {
    fn from(request: CreateCarRequest) -> Self {
        NewCar {
            model_id: request.model_id,
            car_type_id: request.car_type_id,
            rate: request.rate,
            seats: request.seats,
            doors: request.doors,
            suitcases: request.suitcases,
            colour: request.colour,
            description: request.description,
            location_id: request.location_id,
            fuel: request.fuel,
        }
    }
}

// Edición completa: mismos campos y reglas que el alta
pub type UpdateCarRequest = CreateCarRequest;

#[derive(Debug, Deserialize)]
pub struct UpdateCarStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_request(rate: &str, seats: i32) -> CreateCarRequest {
        serde_json::from_value(json!({
            "model_id": Uuid::new_v4(),
            "car_type_id": Uuid::new_v4(),
            "rate": rate,
            "seats": seats,
            "doors": 5,
            "suitcases": 2,
            "colour": "Azul",
            "location_id": Uuid::new_v4(),
            "fuel": { "fuel_type": "Diesel", "diesel_emission": "Euro 6", "fuel_tank_capacity": null }
        }))
        .unwrap()
    }

    #[test]
    fn test_create_car_request_validation() {
        assert!(create_request("49.99", 5).validate().is_ok());
        assert!(create_request("0", 5).validate().is_err());
        assert!(create_request("49.99", 0).validate().is_err());
    }

    #[test]
    fn test_search_query_requires_both_dates() {
        let query = CarSearchQuery {
            pickup_at: Some("2024-01-05T10:00".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_parts(), Err(AppError::InvalidRange(_))));

        let query = CarSearchQuery {
            pickup_at: Some("2024-01-05T10:00".to_string()),
            dropoff_at: Some("2024-01-06T10:00".to_string()),
            seats: Some(5),
            ..Default::default()
        };
        let (filters, window) = query.into_parts().unwrap();
        assert_eq!(filters.seats, Some(5));
        assert_eq!(window.map(|w| w.duration_minutes()), Some(24 * 60));
    }
}
