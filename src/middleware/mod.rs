//! Middleware del sistema
//!
//! Este módulo contiene los extractores de identidad y la configuración de CORS.

pub mod cors;
pub mod identity;

pub use cors::cors_layer;
pub use identity::{CustomerId, StaffId};
