//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL de reservas.

pub mod booking;
pub mod car;
pub mod catalog;
pub mod payment;
