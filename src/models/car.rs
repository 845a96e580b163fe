//! Modelo de Car
//!
//! Este módulo contiene el struct Car, su estado operativo y el registro
//! opcional de combustible (Petrol / Diesel / Electric).
//! Mapea exactamente al schema PostgreSQL de `migrations/0001_init.sql`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::catalog::CarModel;
use crate::utils::errors::AppError;

/// Estado del coche - mapea al ENUM car_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "car_status")]
pub enum CarStatus {
    Available,
    Rented,
    Maintenance,
    Dirty,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "Available",
            CarStatus::Rented => "Rented",
            CarStatus::Maintenance => "Maintenance",
            CarStatus::Dirty => "Dirty",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(CarStatus::Available),
            "Rented" => Ok(CarStatus::Rented),
            "Maintenance" => Ok(CarStatus::Maintenance),
            "Dirty" => Ok(CarStatus::Dirty),
            other => Err(AppError::BadRequest(format!("Unknown car status '{}'", other))),
        }
    }
}

/// Car principal - mapea a la tabla cars
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Car {
    pub id: Uuid,
    pub model_id: Uuid,
    pub car_type_id: Uuid,
    pub rate: Decimal,
    pub seats: i32,
    pub doors: i32,
    pub suitcases: i32,
    pub colour: Option<String>,
    pub description: Option<String>,
    pub location_id: Uuid,
    pub status: CarStatus,
    pub created_at: DateTime<Utc>,
}

/// Tipo de combustible; un coche tiene como mucho uno
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
}

impl FromStr for FuelType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Petrol" => Ok(FuelType::Petrol),
            "Diesel" => Ok(FuelType::Diesel),
            "Electric" => Ok(FuelType::Electric),
            other => Err(AppError::BadRequest(format!("Unknown fuel type '{}'", other))),
        }
    }
}

/// Registro de subtipo de combustible (tablas petrol / diesel / electric)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "fuel_type")]
pub enum FuelDetails {
    Petrol {
        octane_rating: Option<i32>,
        fuel_tank_capacity: Option<Decimal>,
    },
    Diesel {
        diesel_emission: Option<String>,
        fuel_tank_capacity: Option<Decimal>,
    },
    Electric {
        battery_range: Option<i32>,
        charging_rate_kw: Option<Decimal>,
        last_charging_date: Option<NaiveDate>,
    },
}

impl FuelDetails {
    pub fn fuel_type(&self) -> FuelType {
        match self {
            FuelDetails::Petrol { .. } => FuelType::Petrol,
            FuelDetails::Diesel { .. } => FuelType::Diesel,
            FuelDetails::Electric { .. } => FuelType::Electric,
        }
    }
}

/// Coche con su registro de combustible
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CarDetails {
    #[serde(flatten)]
    pub car: Car,
    pub fuel: Option<FuelDetails>,
}

impl CarDetails {
    pub fn fuel_type(&self) -> Option<FuelType> {
        self.fuel.as_ref().map(FuelDetails::fuel_type)
    }
}

/// Datos para dar de alta un coche
#[derive(Debug, Clone)]
pub struct NewCar {
    pub model_id: Uuid,
    pub car_type_id: Uuid,
    pub rate: Decimal,
    pub seats: i32,
    pub doors: i32,
    pub suitcases: i32,
    pub colour: Option<String>,
    pub description: Option<String>,
    pub location_id: Uuid,
    pub fuel: Option<FuelDetails>,
}

/// Filtros para búsqueda de coches
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarFilters {
    pub location_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub car_type_id: Option<Uuid>,
    pub fuel_type: Option<FuelType>,
    pub seats: Option<i32>,
    pub suitcases: Option<i32>,
    pub min_rate: Option<Decimal>,
    pub max_rate: Option<Decimal>,
}

impl CarFilters {
    /// Evalúa los filtros en memoria. Los coches en `Maintenance` nunca pasan.
    pub fn matches(&self, car: &Car, model: Option<&CarModel>, fuel: Option<FuelType>) -> bool {
        if car.status == CarStatus::Maintenance {
            return false;
        }

        let brand_ok = match self.brand_id {
            Some(brand_id) => model.map(|m| m.brand_id == brand_id).unwrap_or(false),
            None => true,
        };

        brand_ok
            && self.location_id.map_or(true, |id| car.location_id == id)
            && self.model_id.map_or(true, |id| car.model_id == id)
            && self.car_type_id.map_or(true, |id| car.car_type_id == id)
            && self.fuel_type.map_or(true, |ft| fuel == Some(ft))
            && self.seats.map_or(true, |n| car.seats == n)
            && self.suitcases.map_or(true, |n| car.suitcases == n)
            && self.min_rate.map_or(true, |r| car.rate >= r)
            && self.max_rate.map_or(true, |r| car.rate <= r)
    }
}
