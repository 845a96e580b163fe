//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos que llegan desde la capa HTTP.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Formato del input `datetime-local` de los formularios de reserva
const FORM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Validar y convertir string a datetime
///
/// Acepta `YYYY-MM-DDTHH:MM` (interpretado como UTC) o RFC 3339.
pub fn parse_datetime(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, FORM_DATETIME_FORMAT) {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::InvalidRange(format!(
                "{} '{}' is not a valid date (expected YYYY-MM-DDTHH:MM or RFC 3339)",
                field, value
            ))
        })
}

/// Validar y convertir string a UUID
pub fn parse_uuid(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::BadRequest(format!("{} '{}' is not a valid id", field, value)))
}
