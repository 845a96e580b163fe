//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y la fuente de tiempo compartida.

pub mod clock;
pub mod errors;
pub mod validation;
