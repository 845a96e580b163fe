//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema de reservas
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("No staff available to handle the booking")]
    NoStaffAvailable,

    #[error("Payment already processed for booking {0}")]
    AlreadyPaid(Uuid),

    #[error("Booking cannot be cancelled: {0}")]
    NotCancellable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl AppError {
    /// Código estable que consumen los clientes
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidRange(_) => "INVALID_RANGE",
            AppError::NoStaffAvailable => "NO_STAFF_AVAILABLE",
            AppError::AlreadyPaid(_) => "ALREADY_PAID",
            AppError::NotCancellable(_) => "NOT_CANCELLABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidRange(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::AlreadyPaid(_) | AppError::NotCancellable(_) => {
                StatusCode::CONFLICT
            }
            AppError::NoStaffAvailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let error_response = match self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: Some(json!({ "sql_error": e.to_string() })),
                    code,
                }
            }

            AppError::Validation(e) => {
                tracing::warn!("⚠️ Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code,
                }
            }

            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: Some(json!({ "internal_error": msg })),
                    code,
                }
            }

            other => {
                tracing::info!("↩️ {}", other);
                let error = match &other {
                    AppError::BadRequest(_) => "Bad Request",
                    AppError::Unauthorized(_) => "Unauthorized",
                    AppError::NotFound(_) => "Not Found",
                    AppError::Conflict(_) => "Conflict",
                    AppError::InvalidRange(_) => "Invalid Range",
                    AppError::NoStaffAvailable => "No Staff Available",
                    AppError::AlreadyPaid(_) => "Already Paid",
                    AppError::NotCancellable(_) => "Not Cancellable",
                    _ => "Error",
                };
                ErrorResponse {
                    error: error.to_string(),
                    message: other.to_string(),
                    details: None,
                    code,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Traduce violaciones de constraints de Postgres a conflictos de negocio
pub fn map_insert_error(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // 23505 unique_violation, 23P01 exclusion_violation
        match db_err.code().as_deref() {
            Some("23505") | Some("23P01") => {
                return AppError::Conflict(format!("{} conflicts with existing data", what));
            }
            // foreign_key_violation
            Some("23503") => {
                return AppError::NotFound(format!("{} references a missing record", what));
            }
            _ => {}
        }
    }
    AppError::Database(e)
}
