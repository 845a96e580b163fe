use serde::Deserialize;
use uuid::Uuid;

use crate::models::booking::BookingTarget;
use crate::models::payment::PaymentStatus;
use crate::services::booking_service::CreateBooking;
use crate::utils::errors::{bad_request_error, AppResult};
use crate::utils::validation::parse_datetime;

// Request para crear una reserva: `car_id` o `model_id`, nunca los dos
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub pickup_location_id: Uuid,
    pub dropoff_location_id: Uuid,
    pub pickup_at: String,
    pub dropoff_at: String,
}

impl CreateBookingRequest {
    pub fn into_command(self, customer_id: Uuid) -> AppResult<CreateBooking> {
        let target = match (self.car_id, self.model_id) {
            (Some(car_id), None) => BookingTarget::Car(car_id),
            (None, Some(model_id)) => BookingTarget::Model(model_id),
            _ => return Err(bad_request_error("exactly one of car_id or model_id must be given")),
        };

        Ok(CreateBooking {
            customer_id,
            target,
            pickup_location_id: self.pickup_location_id,
            dropoff_location_id: self.dropoff_location_id,
            pickup_at: parse_datetime("pickup_at", &self.pickup_at)?,
            dropoff_at: parse_datetime("dropoff_at", &self.dropoff_at)?,
        })
    }
}

// Cambio de estado por el personal
#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

// Corrección manual del estado de pago
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub status: String,
}

impl UpdatePaymentStatusRequest {
    /// `Paid` crea el pago; cualquier otro valor lo deja pendiente
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_paid(self.status.trim() == "Paid")
    }
}
