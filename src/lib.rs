//! Car rental booking core
//!
//! Disponibilidad, precios, ciclo de vida de reservas, pagos y expiración de
//! reservas no pagadas, con una API HTTP fina en Axum por encima.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app;
pub use state::AppState;
