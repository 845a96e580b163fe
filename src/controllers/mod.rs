//! Controllers
//!
//! Adaptan las peticiones HTTP ya extraídas a llamadas a los servicios y
//! envuelven el resultado en `ApiResponse`.

pub mod booking_controller;
pub mod car_controller;

pub use booking_controller::BookingController;
pub use car_controller::CarController;
