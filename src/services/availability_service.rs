//! Verificador de disponibilidad
//!
//! Un coche está libre para una ventana si no está en `Maintenance` y ninguna
//! de sus reservas activas (`Confirmed` / `In Progress`) se solapa con ella según
//! la regla inclusiva de `RentalWindow::overlaps`. El estado `Rented` NO impide
//! reservar ventanas futuras que no se solapen.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    booking::{Booking, RentalWindow},
    car::{Car, CarDetails, CarFilters, CarStatus},
};
use crate::repositories::{RentalStore, RentalTx};
use crate::utils::errors::{not_found_error, AppResult};

/// Alguna reserva activa se solapa con la ventana
pub fn has_conflict(bookings: &[Booking], window: &RentalWindow) -> bool {
    bookings.iter().any(|b| b.blocks(window))
}

/// Otra reserva activa del coche (distinta de `excluding`) cubre el día dado
pub fn car_is_contested(bookings: &[Booking], excluding: Uuid, today: NaiveDate) -> bool {
    bookings
        .iter()
        .any(|b| b.id != excluding && b.status.is_active() && b.covers_day(today))
}

/// Comprueba un coche ya leído (y bloqueado si se va a reservar) dentro de `tx`
pub async fn car_is_free(tx: &mut dyn RentalTx, car: &Car, window: &RentalWindow) -> AppResult<bool> {
    if car.status == CarStatus::Maintenance {
        return Ok(false);
    }
    let bookings = tx.bookings_for_car(car.id).await?;
    Ok(!has_conflict(&bookings, window))
}

/// Primer coche libre de la lista; sin desempate definido más allá del orden recibido
pub async fn first_free_car(
    tx: &mut dyn RentalTx,
    cars: Vec<Car>,
    window: &RentalWindow,
) -> AppResult<Option<Car>> {
    for car in cars {
        if car_is_free(tx, &car, window).await? {
            return Ok(Some(car));
        }
    }
    Ok(None)
}

#[derive(Clone)]
pub struct AvailabilityService {
    store: Arc<dyn RentalStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn RentalStore>) -> Self {
        Self { store }
    }

    /// `isAvailable(carId, pickupAt, dropoffAt)`
    pub async fn is_available(
        &self,
        car_id: Uuid,
        pickup_at: DateTime<Utc>,
        dropoff_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let window = RentalWindow::new(pickup_at, dropoff_at)?;
        let mut tx = self.store.begin().await?;

        let car = tx
            .find_car(car_id)
            .await?
            .ok_or_else(|| not_found_error("Car", &car_id))?;

        car_is_free(tx.as_mut(), &car, &window).await
    }

    /// `findAvailableCar(modelId, locationId, pickupAt, dropoffAt)`
    pub async fn find_available_car(
        &self,
        model_id: Uuid,
        location_id: Uuid,
        pickup_at: DateTime<Utc>,
        dropoff_at: DateTime<Utc>,
    ) -> AppResult<Option<Uuid>> {
        let window = RentalWindow::new(pickup_at, dropoff_at)?;
        let mut tx = self.store.begin().await?;

        if tx.find_model(model_id).await?.is_none() {
            return Err(not_found_error("Model", &model_id));
        }
        if tx.find_location(location_id).await?.is_none() {
            return Err(not_found_error("Location", &location_id));
        }

        let cars = tx.cars_for_model_at(model_id, location_id).await?;
        let car = first_free_car(tx.as_mut(), cars, &window).await?;

        Ok(car.map(|c| c.id))
    }

    /// Navegación del inventario: filtros y, opcionalmente, libre en la ventana
    pub async fn search_cars(
        &self,
        filters: &CarFilters,
        window: Option<RentalWindow>,
    ) -> AppResult<Vec<CarDetails>> {
        let mut tx = self.store.begin().await?;
        let cars = tx.search_cars(filters).await?;

        let Some(window) = window else {
            return Ok(cars);
        };

        let mut free = Vec::with_capacity(cars.len());
        for details in cars {
            if car_is_free(tx.as_mut(), &details.car, &window).await? {
                free.push(details);
            }
        }
        Ok(free)
    }
}
