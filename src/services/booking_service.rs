//! Gestor del ciclo de vida de las reservas
//!
//! Crea reservas (con la comprobación de solapamiento y la inserción dentro de
//! la misma transacción, con el coche bloqueado), transiciona su estado y
//! reconcilia el estado del coche, y gestiona la cancelación por el cliente.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    booking::{Booking, BookingStatus, BookingSummary, BookingTarget, NewBooking, RentalWindow},
    car::{Car, CarStatus},
    payment::PaymentStatus,
};
use crate::repositories::{RentalStore, RentalTx};
use crate::services::availability_service::{
    car_is_contested, car_is_free, first_free_car, has_conflict,
};
use crate::services::expiry_service::ExpiryService;
use crate::services::pricing_service::price_for_window;
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Petición de reserva ya validada sintácticamente
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub customer_id: Uuid,
    pub target: BookingTarget,
    pub pickup_location_id: Uuid,
    pub dropoff_location_id: Uuid,
    pub pickup_at: DateTime<Utc>,
    pub dropoff_at: DateTime<Utc>,
}

/// Estado que debe tomar el coche tras pasar una de sus reservas a `status`.
/// `None` = no tocar el coche.
pub async fn reconcile_car(
    tx: &mut dyn RentalTx,
    booking: &Booking,
    status: BookingStatus,
    today: NaiveDate,
) -> AppResult<Option<CarStatus>> {
    let target = match status {
        BookingStatus::InProgress => Some(CarStatus::Rented),
        BookingStatus::Confirmed => {
            (booking.pickup_at.date_naive() <= today).then_some(CarStatus::Rented)
        }
        BookingStatus::Completed | BookingStatus::Cancelled => {
            let bookings = tx.bookings_for_car(booking.car_id).await?;
            if car_is_contested(&bookings, booking.id, today) {
                None
            } else if status == BookingStatus::Completed {
                Some(CarStatus::Dirty)
            } else {
                Some(CarStatus::Available)
            }
        }
    };
    Ok(target)
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn RentalStore>,
    clock: Arc<dyn Clock>,
    expiry: ExpiryService,
}

impl BookingService {
    pub fn new(store: Arc<dyn RentalStore>, clock: Arc<dyn Clock>, payment_timeout: Duration) -> Self {
        let expiry = ExpiryService::new(store.clone(), clock.clone(), payment_timeout);
        Self {
            store,
            clock,
            expiry,
        }
    }

    /// `createBooking`: resuelve el coche, comprueba disponibilidad, calcula el
    /// precio e inserta la reserva en `Confirmed`, todo en una transacción.
    pub async fn create_booking(&self, request: CreateBooking) -> AppResult<Booking> {
        let window = RentalWindow::new(request.pickup_at, request.dropoff_at)?;
        let mut tx = self.store.begin().await?;

        for location_id in [request.pickup_location_id, request.dropoff_location_id] {
            if tx.find_location(location_id).await?.is_none() {
                return Err(not_found_error("Location", &location_id));
            }
        }

        let car = self
            .resolve_car(tx.as_mut(), request.target, request.pickup_location_id, &window)
            .await?;

        let staff_id = tx.any_staff().await?.ok_or(AppError::NoStaffAvailable)?;
        let now = self.clock.now();

        let booking = tx
            .insert_booking(&NewBooking {
                customer_id: request.customer_id,
                car_id: car.id,
                staff_id,
                window,
                pickup_location_id: request.pickup_location_id,
                dropoff_location_id: request.dropoff_location_id,
                price: price_for_window(car.rate, &window),
                created_at: now,
            })
            .await?;

        if window.pickup_at().date_naive() <= self.clock.today() {
            tx.set_car_status(car.id, CarStatus::Rented).await?;
        }

        tx.commit().await?;

        log::info!(
            "📅 Booking {} created: car {} for customer {} ({} -> {}), price {}",
            booking.id,
            booking.car_id,
            booking.customer_id,
            booking.pickup_at,
            booking.dropoff_at,
            booking.price
        );

        Ok(booking)
    }

    /// Bloquea y devuelve el coche a reservar, o `Conflict` si no hay ninguno libre
    async fn resolve_car(
        &self,
        tx: &mut dyn RentalTx,
        target: BookingTarget,
        pickup_location_id: Uuid,
        window: &RentalWindow,
    ) -> AppResult<Car> {
        match target {
            BookingTarget::Car(car_id) => {
                let car = tx
                    .lock_car(car_id)
                    .await?
                    .ok_or_else(|| not_found_error("Car", &car_id))?;

                if !car_is_free(tx, &car, window).await? {
                    log::warn!(
                        "⛔ Car {} is not available from {} to {}",
                        car_id,
                        window.pickup_at(),
                        window.dropoff_at()
                    );
                    return Err(AppError::Conflict(format!(
                        "Car {} is not available for the requested dates",
                        car_id
                    )));
                }
                Ok(car)
            }
            BookingTarget::Model(model_id) => {
                if tx.find_model(model_id).await?.is_none() {
                    return Err(not_found_error("Model", &model_id));
                }

                let cars = tx.lock_cars_for_model_at(model_id, pickup_location_id).await?;
                first_free_car(tx, cars, window).await?.ok_or_else(|| {
                    log::warn!(
                        "⛔ No car of model {} free at location {} from {} to {}",
                        model_id,
                        pickup_location_id,
                        window.pickup_at(),
                        window.dropoff_at()
                    );
                    AppError::Conflict(format!(
                        "No car of model {} is available at this location for the requested dates",
                        model_id
                    ))
                })
            }
        }
    }

    /// `transitionStatus`: cambia el estado de la reserva y reconcilia el del coche
    pub async fn transition_status(&self, booking_id: Uuid, new_status: &str) -> AppResult<Booking> {
        let status: BookingStatus = new_status.parse()?;
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;

        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id))?;

        let previous = booking.status;

        // reserva -> coche: mismo orden de bloqueo que el barrido de expiración
        if tx.lock_car(booking.car_id).await?.is_none() {
            return Err(not_found_error("Car", &booking.car_id));
        }

        // reactivar una reserva terminada vuelve a ocupar su ventana
        if status.is_active() && !previous.is_active() {
            let window = RentalWindow::new(booking.pickup_at, booking.dropoff_at)?;
            let others: Vec<Booking> = tx
                .bookings_for_car(booking.car_id)
                .await?
                .into_iter()
                .filter(|b| b.id != booking_id)
                .collect();
            if has_conflict(&others, &window) {
                log::warn!(
                    "⛔ Booking {} cannot return to {}: car {} is taken for its dates",
                    booking_id,
                    status,
                    booking.car_id
                );
                return Err(AppError::Conflict(format!(
                    "Car {} is already booked for the dates of booking {}",
                    booking.car_id, booking_id
                )));
            }
        }

        tx.update_booking_status(booking_id, status).await?;
        booking.status = status;

        let car_status = reconcile_car(tx.as_mut(), &booking, status, today).await?;
        if let Some(car_status) = car_status {
            tx.set_car_status(booking.car_id, car_status).await?;
        }

        tx.commit().await?;

        match car_status {
            Some(car_status) => log::info!(
                "🔄 Booking {}: {} -> {}, car {} -> {}",
                booking_id,
                previous,
                status,
                booking.car_id,
                car_status
            ),
            None => log::info!(
                "🔄 Booking {}: {} -> {}, car {} left unchanged",
                booking_id,
                previous,
                status,
                booking.car_id
            ),
        }

        Ok(booking)
    }

    /// `cancelByCustomer`: solo el dueño, sin pago y antes de la recogida.
    /// Borra la reserva; el estado del coche no se reconcilia.
    pub async fn cancel_by_customer(&self, booking_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id))?;

        if booking.customer_id != customer_id {
            return Err(AppError::Unauthorized(format!(
                "Booking {} does not belong to this customer",
                booking_id
            )));
        }

        if tx.find_payment(booking_id).await?.is_some() {
            return Err(AppError::NotCancellable(
                "the booking has already been paid".to_string(),
            ));
        }

        if booking.pickup_at <= now {
            return Err(AppError::NotCancellable(
                "the pickup time has already passed".to_string(),
            ));
        }

        if let Some(car) = tx.find_car(booking.car_id).await? {
            if car.status == CarStatus::Rented {
                log::warn!(
                    "⚠️ Deleting booking {} while car {} is Rented; car status is not reconciled",
                    booking_id,
                    car.id
                );
            }
        }

        tx.delete_booking(booking_id).await?;
        tx.commit().await?;

        log::info!("🗑️ Booking {} cancelled by customer {}", booking_id, customer_id);
        Ok(())
    }

    /// Reservas del cliente, recogida más reciente primero
    pub async fn list_customer_bookings(&self, customer_id: Uuid) -> AppResult<Vec<BookingSummary>> {
        self.expiry.sweep_expired().await?;

        let mut tx = self.store.begin().await?;
        tx.list_bookings(Some(customer_id)).await
    }

    /// Detalle de una reserva del cliente; las ajenas se tratan como inexistentes
    pub async fn get_booking(&self, booking_id: Uuid, customer_id: Uuid) -> AppResult<BookingSummary> {
        let mut tx = self.store.begin().await?;

        let booking = tx
            .find_booking(booking_id)
            .await?
            .filter(|b| b.customer_id == customer_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id))?;

        let paid = tx.find_payment(booking_id).await?.is_some();
        Ok(BookingSummary {
            booking,
            payment_status: PaymentStatus::from_paid(paid),
        })
    }

    /// Todas las reservas (personal)
    pub async fn list_all_bookings(&self) -> AppResult<Vec<BookingSummary>> {
        self.expiry.sweep_expired().await?;

        let mut tx = self.store.begin().await?;
        tx.list_bookings(None).await
    }
}
