//! Servicio de inventario
//!
//! Navegación de coches, detalle, presupuesto y mantenimiento del parque por
//! parte del personal.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    booking::RentalWindow,
    car::{Car, CarDetails, CarFilters, CarStatus, NewCar},
};
use crate::repositories::RentalStore;
use crate::services::availability_service::AvailabilityService;
use crate::services::expiry_service::ExpiryService;
use crate::services::pricing_service::{billed_days, price_for_window};
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Presupuesto de un coche para una ventana
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Quote {
    pub car_id: Uuid,
    pub rate: Decimal,
    pub billed_days: i64,
    pub amount: Decimal,
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn RentalStore>,
    clock: Arc<dyn Clock>,
    availability: AvailabilityService,
    expiry: ExpiryService,
}

impl InventoryService {
    pub fn new(store: Arc<dyn RentalStore>, clock: Arc<dyn Clock>, payment_timeout: Duration) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone()),
            expiry: ExpiryService::new(store.clone(), clock.clone(), payment_timeout),
            store,
            clock,
        }
    }

    /// Búsqueda con filtros; con ventana, solo coches libres en ella
    pub async fn search_cars(
        &self,
        filters: &CarFilters,
        window: Option<RentalWindow>,
    ) -> AppResult<Vec<CarDetails>> {
        self.expiry.sweep_expired().await?;
        self.availability.search_cars(filters, window).await
    }

    pub async fn get_car(&self, car_id: Uuid) -> AppResult<CarDetails> {
        let mut tx = self.store.begin().await?;

        let car = tx
            .find_car(car_id)
            .await?
            .ok_or_else(|| not_found_error("Car", &car_id))?;
        let fuel = tx.fuel_details(car_id).await?;

        Ok(CarDetails { car, fuel })
    }

    /// `computePrice` para un coche concreto
    pub async fn quote(
        &self,
        car_id: Uuid,
        pickup_at: DateTime<Utc>,
        dropoff_at: DateTime<Utc>,
    ) -> AppResult<Quote> {
        let window = RentalWindow::new(pickup_at, dropoff_at)?;
        let car = self.get_car(car_id).await?.car;

        Ok(Quote {
            car_id,
            rate: car.rate,
            billed_days: billed_days(&window),
            amount: price_for_window(car.rate, &window),
        })
    }

    /// Alta de un coche en `Available` con su registro de combustible, si lo hay
    pub async fn create_car(&self, new_car: NewCar) -> AppResult<CarDetails> {
        let mut tx = self.store.begin().await?;

        if tx.find_model(new_car.model_id).await?.is_none() {
            return Err(not_found_error("Model", &new_car.model_id));
        }
        if tx.find_location(new_car.location_id).await?.is_none() {
            return Err(not_found_error("Location", &new_car.location_id));
        }

        let car = tx.insert_car(&new_car, self.clock.now()).await?;
        if let Some(fuel) = &new_car.fuel {
            tx.insert_fuel_details(car.id, fuel).await?;
        }

        tx.commit().await?;

        log::info!("🚗 Car {} added at location {}", car.id, car.location_id);
        Ok(CarDetails {
            car,
            fuel: new_car.fuel,
        })
    }

    /// Listado completo para el personal, `Maintenance` incluido
    pub async fn list_all_cars(&self) -> AppResult<Vec<CarDetails>> {
        let mut tx = self.store.begin().await?;
        tx.list_all_cars().await
    }

    /// Sustituye los atributos del coche y su registro de combustible
    pub async fn update_car(&self, car_id: Uuid, changes: NewCar) -> AppResult<CarDetails> {
        let mut tx = self.store.begin().await?;

        if tx.lock_car(car_id).await?.is_none() {
            return Err(not_found_error("Car", &car_id));
        }
        if tx.find_model(changes.model_id).await?.is_none() {
            return Err(not_found_error("Model", &changes.model_id));
        }
        if tx.find_location(changes.location_id).await?.is_none() {
            return Err(not_found_error("Location", &changes.location_id));
        }

        let car = tx.update_car(car_id, &changes).await?;

        // como mucho un registro de combustible por coche
        tx.delete_fuel_details(car_id).await?;
        if let Some(fuel) = &changes.fuel {
            tx.insert_fuel_details(car_id, fuel).await?;
        }

        tx.commit().await?;

        log::info!("✏️ Car {} updated", car_id);
        Ok(CarDetails {
            car,
            fuel: changes.fuel,
        })
    }

    /// Baja de un coche; solo si ninguna reserva lo referencia
    pub async fn delete_car(&self, car_id: Uuid) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        if tx.lock_car(car_id).await?.is_none() {
            return Err(not_found_error("Car", &car_id));
        }

        let bookings = tx.count_bookings_for_car(car_id).await?;
        if bookings > 0 {
            return Err(AppError::Conflict(format!(
                "Car {} has {} booking(s) and cannot be deleted",
                car_id, bookings
            )));
        }

        tx.delete_car(car_id).await?;
        tx.commit().await?;

        log::info!("🗑️ Car {} deleted", car_id);
        Ok(())
    }

    /// Cambio manual de estado (limpieza, mantenimiento)
    pub async fn set_car_status(&self, car_id: Uuid, status: CarStatus) -> AppResult<Car> {
        let mut tx = self.store.begin().await?;

        let mut car = tx
            .lock_car(car_id)
            .await?
            .ok_or_else(|| not_found_error("Car", &car_id))?;

        tx.set_car_status(car_id, status).await?;
        tx.commit().await?;

        log::info!("🔧 Car {}: {} -> {}", car_id, car.status, status);
        car.status = status;
        Ok(car)
    }
}
