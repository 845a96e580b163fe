//! Libro de pagos
//!
//! Un pago por reserva como mucho. El importe se copia del precio guardado en
//! la reserva; nunca se recalcula.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    booking::BookingStatus,
    payment::{Payment, PaymentStatus},
};
use crate::repositories::RentalStore;
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn RentalStore>,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn RentalStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// `pay(bookingId)` en nombre del cliente dueño de la reserva
    pub async fn pay(&self, booking_id: Uuid, customer_id: Uuid) -> AppResult<Payment> {
        let mut tx = self.store.begin().await?;

        // bloquea la reserva: compite limpiamente con el barrido de expiración
        let booking = tx
            .lock_booking(booking_id)
            .await?
            .filter(|b| b.customer_id == customer_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id))?;

        if tx.find_payment(booking_id).await?.is_some() {
            return Err(AppError::AlreadyPaid(booking_id));
        }

        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::Conflict(format!(
                "Booking {} was cancelled and can no longer be paid",
                booking_id
            )));
        }

        let payment = tx
            .insert_payment(booking_id, booking.price, self.clock.now())
            .await?;
        tx.commit().await?;

        log::info!("💳 Payment of {} recorded for booking {}", payment.amount, booking_id);
        Ok(payment)
    }

    /// `setPaymentStatus`: corrección manual del personal, sin reconciliar estados
    pub async fn set_payment_status(
        &self,
        booking_id: Uuid,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id))?;

        let payment = match status {
            PaymentStatus::Paid => match tx.find_payment(booking_id).await? {
                Some(existing) => Some(existing),
                None => Some(
                    tx.insert_payment(booking_id, booking.price, self.clock.now())
                        .await?,
                ),
            },
            PaymentStatus::Pending => {
                if tx.delete_payment(booking_id).await? {
                    log::info!("↩️ Payment for booking {} removed by staff", booking_id);
                }
                None
            }
        };

        tx.commit().await?;
        Ok(payment)
    }
}
