//! DTOs de la API
//!
//! Formas de entrada y salida de la capa HTTP.

pub mod api_response;
pub mod booking_dto;
pub mod car_dto;
pub mod payment_dto;

pub use api_response::ApiResponse;
