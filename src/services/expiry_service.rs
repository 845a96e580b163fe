//! Barrido de reservas caducadas
//!
//! Una reserva `Confirmed` sin pago creada hace más del plazo de pago se
//! cancela, y su coche vuelve a `Available` si ninguna otra reserva activa
//! cubre el día de hoy. Cada reserva se procesa en su propia transacción y se
//! vuelve a comprobar tras bloquearla, así que un pago concurrente gana o pierde
//! limpiamente y repetir el barrido no tiene efecto.
//!
//! El barrido se dispara desde las lecturas designadas (búsqueda de coches y
//! listados de reservas) y, opcionalmente, desde una tarea periódica. La
//! latencia de cancelación depende del tráfico; no es un SLA.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{booking::BookingStatus, car::CarStatus};
use crate::repositories::RentalStore;
use crate::services::booking_service::reconcile_car;
use crate::utils::clock::Clock;
use crate::utils::errors::AppResult;

/// Plazo de pago por defecto
pub const DEFAULT_PAYMENT_TIMEOUT_MINUTES: i64 = 15;

/// Resultado de un barrido
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SweepReport {
    pub cancelled: Vec<Uuid>,
    pub released_cars: Vec<Uuid>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.cancelled.is_empty()
    }
}

#[derive(Clone)]
pub struct ExpiryService {
    store: Arc<dyn RentalStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ExpiryService {
    pub fn new(store: Arc<dyn RentalStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            store,
            clock,
            timeout,
        }
    }

    /// `sweepExpired`
    pub async fn sweep_expired(&self) -> AppResult<SweepReport> {
        let now = self.clock.now();
        let cutoff = now - self.timeout;
        let today = self.clock.today();

        let candidates = {
            let mut tx = self.store.begin().await?;
            let candidates = tx.expired_unpaid_bookings(cutoff).await?;
            tx.commit().await?;
            candidates
        };

        let mut report = SweepReport::default();
        for candidate in candidates {
            match self.expire_one(candidate.id, cutoff, today).await {
                Ok(Some(released)) => {
                    report.cancelled.push(candidate.id);
                    if let Some(car_id) = released {
                        report.released_cars.push(car_id);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("❌ Failed to expire booking {}: {}", candidate.id, e);
                }
            }
        }

        if !report.is_empty() {
            log::info!(
                "⏰ Expiry sweep cancelled {} booking(s), released {} car(s)",
                report.cancelled.len(),
                report.released_cars.len()
            );
        }

        Ok(report)
    }

    /// Cancela una reserva si sigue caducada. `Ok(None)` si ya no aplica;
    /// `Ok(Some(car))` con el coche liberado, si lo hubo.
    async fn expire_one(
        &self,
        booking_id: Uuid,
        cutoff: DateTime<Utc>,
        today: NaiveDate,
    ) -> AppResult<Option<Option<Uuid>>> {
        let mut tx = self.store.begin().await?;

        let Some(mut booking) = tx.lock_booking(booking_id).await? else {
            return Ok(None);
        };
        if booking.status != BookingStatus::Confirmed || booking.created_at >= cutoff {
            return Ok(None);
        }
        if tx.find_payment(booking_id).await?.is_some() {
            return Ok(None);
        }

        tx.update_booking_status(booking_id, BookingStatus::Cancelled).await?;
        booking.status = BookingStatus::Cancelled;

        let mut released = None;
        if tx.lock_car(booking.car_id).await?.is_some() {
            let target = reconcile_car(tx.as_mut(), &booking, BookingStatus::Cancelled, today).await?;
            if target == Some(CarStatus::Available) {
                tx.set_car_status(booking.car_id, CarStatus::Available).await?;
                released = Some(booking.car_id);
            }
        }

        tx.commit().await?;

        log::info!(
            "⌛ Booking {} expired unpaid after {} minutes",
            booking_id,
            self.timeout.num_minutes()
        );

        Ok(Some(released))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::RentalTx;
    use crate::services::fixtures::{at, Fixture};
    use rust_decimal::Decimal;

    fn service(fx: &Fixture) -> ExpiryService {
        ExpiryService::new(
            fx.store(),
            fx.clock(),
            Duration::minutes(DEFAULT_PAYMENT_TIMEOUT_MINUTES),
        )
    }

    #[tokio::test]
    async fn test_expired_unpaid_booking_is_cancelled_and_car_released() {
        let fx = Fixture::new().await;
        let car = fx.car_with_status(50, CarStatus::Rented).await;
        let booking = fx
            .booking(
                car.id,
                at(3, 8),
                at(5, 8),
                BookingStatus::Confirmed,
                fx.clock.now() - Duration::minutes(16),
            )
            .await;

        let report = service(&fx).sweep_expired().await.unwrap();

        assert_eq!(report.cancelled, vec![booking.id]);
        assert_eq!(report.released_cars, vec![car.id]);
        assert_eq!(
            fx.store.booking(booking.id).await.unwrap().status,
            BookingStatus::Cancelled
        );
        assert_eq!(fx.store.car(car.id).await.unwrap().status, CarStatus::Available);
    }

    #[tokio::test]
    async fn test_fresh_and_paid_bookings_survive() {
        let fx = Fixture::new().await;
        let car = fx.car(50).await;
        let fresh = fx
            .booking(
                car.id,
                at(10, 8),
                at(11, 8),
                BookingStatus::Confirmed,
                fx.clock.now() - Duration::minutes(14),
            )
            .await;
        let paid = fx
            .booking(
                car.id,
                at(20, 8),
                at(21, 8),
                BookingStatus::Confirmed,
                fx.clock.now() - Duration::hours(2),
            )
            .await;
        {
            let mut tx = fx.store().begin().await.unwrap();
            tx.insert_payment(paid.id, Decimal::from(100), fx.clock.now())
                .await
                .unwrap();
            tx.commit().await.unwrap();
        }

        let report = service(&fx).sweep_expired().await.unwrap();

        assert!(report.is_empty());
        assert_eq!(
            fx.store.booking(fresh.id).await.unwrap().status,
            BookingStatus::Confirmed
        );
        assert_eq!(
            fx.store.booking(paid.id).await.unwrap().status,
            BookingStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_candidate_paid_after_scan_is_skipped() {
        let fx = Fixture::new().await;
        let car = fx.car(50).await;
        let booking = fx
            .booking(
                car.id,
                at(10, 8),
                at(11, 8),
                BookingStatus::Confirmed,
                fx.clock.now() - Duration::minutes(20),
            )
            .await;
        let svc = service(&fx);
        let cutoff = fx.clock.now() - Duration::minutes(DEFAULT_PAYMENT_TIMEOUT_MINUTES);

        let candidates = {
            let mut tx = fx.store().begin().await.unwrap();
            tx.expired_unpaid_bookings(cutoff).await.unwrap()
        };
        assert_eq!(candidates.len(), 1);

        // el cliente paga entre la lectura y la cancelación
        {
            let mut tx = fx.store().begin().await.unwrap();
            tx.insert_payment(booking.id, Decimal::from(100), fx.clock.now())
                .await
                .unwrap();
            tx.commit().await.unwrap();
        }

        let outcome = svc
            .expire_one(booking.id, cutoff, fx.clock.today())
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(
            fx.store.booking(booking.id).await.unwrap().status,
            BookingStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_contested_car_is_not_released() {
        let fx = Fixture::new().await;
        let car = fx.car_with_status(50, CarStatus::Rented).await;
        fx.booking(car.id, at(2, 8), at(4, 8), BookingStatus::InProgress, at(1, 0))
            .await;
        let expired = fx
            .booking(
                car.id,
                at(10, 8),
                at(11, 8),
                BookingStatus::Confirmed,
                fx.clock.now() - Duration::minutes(30),
            )
            .await;

        let report = service(&fx).sweep_expired().await.unwrap();

        assert_eq!(report.cancelled, vec![expired.id]);
        assert!(report.released_cars.is_empty());
        assert_eq!(fx.store.car(car.id).await.unwrap().status, CarStatus::Rented);
    }

    #[tokio::test]
    async fn test_second_sweep_is_a_no_op() {
        let fx = Fixture::new().await;
        let car = fx.car(50).await;
        fx.booking(
            car.id,
            at(10, 8),
            at(11, 8),
            BookingStatus::Confirmed,
            fx.clock.now() - Duration::minutes(20),
        )
        .await;
        let svc = service(&fx);

        let first = svc.sweep_expired().await.unwrap();
        let before = fx.store.bookings().await;
        let second = svc.sweep_expired().await.unwrap();

        assert_eq!(first.cancelled.len(), 1);
        assert!(second.is_empty());
        assert_eq!(fx.store.bookings().await, before);
    }
}
