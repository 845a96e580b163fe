//! Services module
//!
//! Este módulo contiene la lógica de negocio del núcleo de reservas:
//! disponibilidad, precios, ciclo de vida de las reservas, pagos y expiración.
//! Cada operación abre su propia transacción sobre el `RentalStore` inyectado.

pub mod availability_service;
pub mod booking_service;
pub mod expiry_service;
pub mod inventory_service;
pub mod payment_service;
pub mod pricing_service;

#[cfg(test)]
pub(crate) mod fixtures;

pub use availability_service::AvailabilityService;
pub use booking_service::{BookingService, CreateBooking};
pub use expiry_service::{ExpiryService, SweepReport};
pub use inventory_service::{InventoryService, Quote};
pub use payment_service::PaymentService;
