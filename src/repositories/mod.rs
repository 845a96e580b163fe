//! Repositorios
//!
//! Toda operación del núcleo de reservas se ejecuta dentro de una unidad de
//! trabajo (`RentalTx`) obtenida de un `RentalStore`. La transacción se confirma
//! con `commit`; si se descarta sin confirmar, los cambios se pierden.
//!
//! Los métodos `lock_*` adquieren un bloqueo exclusivo sobre las filas leídas
//! hasta el final de la transacción: es lo que hace atómica la secuencia
//! "comprobar solapamiento + insertar" por coche.

pub mod memory_repository;
pub mod postgres_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    booking::{Booking, BookingStatus, BookingSummary, NewBooking},
    car::{Car, CarDetails, CarFilters, CarStatus, FuelDetails, NewCar},
    catalog::{CarModel, Location},
    payment::Payment,
};
use crate::utils::errors::AppResult;

pub use memory_repository::MemoryStore;
pub use postgres_repository::PgRentalStore;

#[async_trait]
pub trait RentalStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn RentalTx>>;
}

#[async_trait]
pub trait RentalTx: Send {
    // --- Inventario ---
    async fn find_car(&mut self, car_id: Uuid) -> AppResult<Option<Car>>;
    async fn lock_car(&mut self, car_id: Uuid) -> AppResult<Option<Car>>;
    async fn fuel_details(&mut self, car_id: Uuid) -> AppResult<Option<FuelDetails>>;
    async fn cars_for_model_at(&mut self, model_id: Uuid, location_id: Uuid) -> AppResult<Vec<Car>>;
    async fn lock_cars_for_model_at(&mut self, model_id: Uuid, location_id: Uuid) -> AppResult<Vec<Car>>;
    /// Coches que cumplen los filtros (nunca `Maintenance`), por tarifa ascendente
    async fn search_cars(&mut self, filters: &CarFilters) -> AppResult<Vec<CarDetails>>;
    /// Todo el parque, `Maintenance` incluido, más recientes primero
    async fn list_all_cars(&mut self) -> AppResult<Vec<CarDetails>>;
    async fn set_car_status(&mut self, car_id: Uuid, status: CarStatus) -> AppResult<()>;
    async fn insert_car(&mut self, car: &NewCar, created_at: DateTime<Utc>) -> AppResult<Car>;
    /// Sustituye los atributos del coche; no toca estado ni fecha de alta
    async fn update_car(&mut self, car_id: Uuid, car: &NewCar) -> AppResult<Car>;
    async fn insert_fuel_details(&mut self, car_id: Uuid, fuel: &FuelDetails) -> AppResult<()>;
    async fn delete_fuel_details(&mut self, car_id: Uuid) -> AppResult<()>;
    async fn count_bookings_for_car(&mut self, car_id: Uuid) -> AppResult<i64>;
    async fn delete_car(&mut self, car_id: Uuid) -> AppResult<()>;

    // --- Catálogo ---
    async fn find_model(&mut self, model_id: Uuid) -> AppResult<Option<CarModel>>;
    async fn find_location(&mut self, location_id: Uuid) -> AppResult<Option<Location>>;
    /// Cualquier miembro del personal (política de selección arbitraria)
    async fn any_staff(&mut self) -> AppResult<Option<Uuid>>;

    // --- Reservas ---
    async fn find_booking(&mut self, booking_id: Uuid) -> AppResult<Option<Booking>>;
    async fn lock_booking(&mut self, booking_id: Uuid) -> AppResult<Option<Booking>>;
    async fn bookings_for_car(&mut self, car_id: Uuid) -> AppResult<Vec<Booking>>;
    /// Reservas con estado de pago; `None` = todas. Orden: recogida más reciente primero
    async fn list_bookings(&mut self, customer_id: Option<Uuid>) -> AppResult<Vec<BookingSummary>>;
    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking>;
    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> AppResult<()>;
    async fn delete_booking(&mut self, booking_id: Uuid) -> AppResult<()>;
    /// Reservas `Confirmed` sin pago creadas antes de `cutoff`. Lectura sin
    /// bloqueo: quien las cancele debe volver a comprobarlas con `lock_booking`.
    async fn expired_unpaid_bookings(&mut self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>>;

    // --- Pagos ---
    async fn find_payment(&mut self, booking_id: Uuid) -> AppResult<Option<Payment>>;
    async fn insert_payment(&mut self, booking_id: Uuid, amount: Decimal, paid_at: DateTime<Utc>) -> AppResult<Payment>;
    async fn delete_payment(&mut self, booking_id: Uuid) -> AppResult<bool>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
