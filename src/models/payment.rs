//! Modelo de Payment
//!
//! Registro 1:1 opcional de una reserva: su presencia significa "pagada".

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Payment {
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Estado de pago derivado de la existencia del registro
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn from_paid(paid: bool) -> Self {
        if paid {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        }
    }
}
