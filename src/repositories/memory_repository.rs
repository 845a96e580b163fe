//! Store en memoria
//!
//! Implementa `RentalStore` sobre un único estado protegido por un
//! `tokio::sync::Mutex`. Una transacción retiene el mutex durante toda su vida y
//! trabaja sobre una copia; `commit` escribe la copia de vuelta. Con un solo
//! escritor a la vez, la comprobación de solapamiento y la inserción son atómicas.
//!
//! Se usa en tests y con `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{
    booking::{Booking, BookingStatus, BookingSummary, NewBooking},
    car::{Car, CarDetails, CarFilters, CarStatus, FuelDetails, NewCar},
    catalog::{CarModel, Location, StaffMember},
    payment::{Payment, PaymentStatus},
};
use crate::repositories::{RentalStore, RentalTx};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    cars: HashMap<Uuid, Car>,
    fuel: HashMap<Uuid, FuelDetails>,
    models: HashMap<Uuid, CarModel>,
    locations: HashMap<Uuid, Location>,
    // BTreeMap para que "cualquier miembro del personal" sea estable
    staff: BTreeMap<Uuid, StaffMember>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, Payment>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_location(&self, name: &str) -> Location {
        let location = Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.state
            .lock()
            .await
            .locations
            .insert(location.id, location.clone());
        location
    }

    pub async fn add_model(&self, brand_id: Uuid, name: &str) -> CarModel {
        let model = CarModel {
            id: Uuid::new_v4(),
            brand_id,
            name: name.to_string(),
            image: None,
        };
        self.state.lock().await.models.insert(model.id, model.clone());
        model
    }

    pub async fn add_staff(&self, first_name: &str, last_name: &str) -> StaffMember {
        let staff = StaffMember {
            id: Uuid::new_v4(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            manager_id: None,
        };
        self.state.lock().await.staff.insert(staff.id, staff.clone());
        staff
    }

    /// Inserta un coche tal cual (sin validar catálogo)
    pub async fn add_car(&self, car: Car, fuel: Option<FuelDetails>) -> Car {
        let mut state = self.state.lock().await;
        if let Some(fuel) = fuel {
            state.fuel.insert(car.id, fuel);
        }
        state.cars.insert(car.id, car.clone());
        car
    }

    /// Inserta una reserva tal cual, saltándose la comprobación de disponibilidad
    pub async fn add_booking(&self, booking: Booking) -> Booking {
        self.state
            .lock()
            .await
            .bookings
            .insert(booking.id, booking.clone());
        booking
    }

    pub async fn car(&self, car_id: Uuid) -> Option<Car> {
        self.state.lock().await.cars.get(&car_id).cloned()
    }

    pub async fn booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.state.lock().await.bookings.get(&booking_id).cloned()
    }

    pub async fn payment(&self, booking_id: Uuid) -> Option<Payment> {
        self.state.lock().await.payments.get(&booking_id).cloned()
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.values().cloned().collect()
    }
}

#[async_trait]
impl RentalStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn RentalTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryTx {
    fn car_details(&self, car: &Car) -> CarDetails {
        CarDetails {
            car: car.clone(),
            fuel: self.staged.fuel.get(&car.id).cloned(),
        }
    }

    fn summary(&self, booking: &Booking) -> BookingSummary {
        BookingSummary {
            booking: booking.clone(),
            payment_status: PaymentStatus::from_paid(self.staged.payments.contains_key(&booking.id)),
        }
    }

    fn cars_for(&self, model_id: Uuid, location_id: Uuid) -> Vec<Car> {
        let mut cars: Vec<Car> = self
            .staged
            .cars
            .values()
            .filter(|c| c.model_id == model_id && c.location_id == location_id)
            .cloned()
            .collect();
        cars.sort_by_key(|c| c.id);
        cars
    }
}

#[async_trait]
impl RentalTx for MemoryTx {
    async fn find_car(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        Ok(self.staged.cars.get(&car_id).cloned())
    }

    async fn lock_car(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        // el mutex global ya da exclusión
        self.find_car(car_id).await
    }

    async fn fuel_details(&mut self, car_id: Uuid) -> AppResult<Option<FuelDetails>> {
        Ok(self.staged.fuel.get(&car_id).cloned())
    }

    async fn cars_for_model_at(&mut self, model_id: Uuid, location_id: Uuid) -> AppResult<Vec<Car>> {
        Ok(self.cars_for(model_id, location_id))
    }

    async fn lock_cars_for_model_at(&mut self, model_id: Uuid, location_id: Uuid) -> AppResult<Vec<Car>> {
        Ok(self.cars_for(model_id, location_id))
    }

    async fn search_cars(&mut self, filters: &CarFilters) -> AppResult<Vec<CarDetails>> {
        let mut found: Vec<CarDetails> = self
            .staged
            .cars
            .values()
            .filter(|car| {
                let model = self.staged.models.get(&car.model_id);
                let fuel = self.staged.fuel.get(&car.id).map(FuelDetails::fuel_type);
                filters.matches(car, model, fuel)
            })
            .map(|car| self.car_details(car))
            .collect();
        found.sort_by(|a, b| a.car.rate.cmp(&b.car.rate).then(a.car.id.cmp(&b.car.id)));
        Ok(found)
    }

    async fn list_all_cars(&mut self) -> AppResult<Vec<CarDetails>> {
        let mut cars: Vec<CarDetails> = self
            .staged
            .cars
            .values()
            .map(|car| self.car_details(car))
            .collect();
        cars.sort_by(|a, b| {
            b.car
                .created_at
                .cmp(&a.car.created_at)
                .then(a.car.id.cmp(&b.car.id))
        });
        Ok(cars)
    }

    async fn set_car_status(&mut self, car_id: Uuid, status: CarStatus) -> AppResult<()> {
        let car = self
            .staged
            .cars
            .get_mut(&car_id)
            .ok_or_else(|| not_found_error("Car", &car_id))?;
        car.status = status;
        Ok(())
    }

    async fn insert_car(&mut self, car: &NewCar, created_at: DateTime<Utc>) -> AppResult<Car> {
        let stored = Car {
            id: Uuid::new_v4(),
            model_id: car.model_id,
            car_type_id: car.car_type_id,
            rate: car.rate,
            seats: car.seats,
            doors: car.doors,
            suitcases: car.suitcases,
            colour: car.colour.clone(),
            description: car.description.clone(),
            location_id: car.location_id,
            status: CarStatus::Available,
            created_at,
        };
        self.staged.cars.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_car(&mut self, car_id: Uuid, car: &NewCar) -> AppResult<Car> {
        let stored = self
            .staged
            .cars
            .get_mut(&car_id)
            .ok_or_else(|| not_found_error("Car", &car_id))?;

        stored.model_id = car.model_id;
        stored.car_type_id = car.car_type_id;
        stored.rate = car.rate;
        stored.seats = car.seats;
        stored.doors = car.doors;
        stored.suitcases = car.suitcases;
        stored.colour = car.colour.clone();
        stored.description = car.description.clone();
        stored.location_id = car.location_id;

        Ok(stored.clone())
    }

    async fn insert_fuel_details(&mut self, car_id: Uuid, fuel: &FuelDetails) -> AppResult<()> {
        if self.staged.fuel.contains_key(&car_id) {
            return Err(AppError::Conflict(format!(
                "Car {} already has a fuel record",
                car_id
            )));
        }
        self.staged.fuel.insert(car_id, fuel.clone());
        Ok(())
    }

    async fn delete_fuel_details(&mut self, car_id: Uuid) -> AppResult<()> {
        self.staged.fuel.remove(&car_id);
        Ok(())
    }

    async fn count_bookings_for_car(&mut self, car_id: Uuid) -> AppResult<i64> {
        let count = self
            .staged
            .bookings
            .values()
            .filter(|b| b.car_id == car_id)
            .count();
        Ok(count as i64)
    }

    async fn delete_car(&mut self, car_id: Uuid) -> AppResult<()> {
        self.staged.fuel.remove(&car_id);
        self.staged.cars.remove(&car_id);
        Ok(())
    }

    async fn find_model(&mut self, model_id: Uuid) -> AppResult<Option<CarModel>> {
        Ok(self.staged.models.get(&model_id).cloned())
    }

    async fn find_location(&mut self, location_id: Uuid) -> AppResult<Option<Location>> {
        Ok(self.staged.locations.get(&location_id).cloned())
    }

    async fn any_staff(&mut self) -> AppResult<Option<Uuid>> {
        Ok(self.staged.staff.keys().next().copied())
    }

    async fn find_booking(&mut self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.staged.bookings.get(&booking_id).cloned())
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        self.find_booking(booking_id).await
    }

    async fn bookings_for_car(&mut self, car_id: Uuid) -> AppResult<Vec<Booking>> {
        Ok(self
            .staged
            .bookings
            .values()
            .filter(|b| b.car_id == car_id)
            .cloned()
            .collect())
    }

    async fn list_bookings(&mut self, customer_id: Option<Uuid>) -> AppResult<Vec<BookingSummary>> {
        let mut bookings: Vec<BookingSummary> = self
            .staged
            .bookings
            .values()
            .filter(|b| customer_id.map_or(true, |c| b.customer_id == c))
            .map(|b| self.summary(b))
            .collect();
        bookings.sort_by(|a, b| b.booking.pickup_at.cmp(&a.booking.pickup_at));
        Ok(bookings)
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        let stored = Booking {
            id: Uuid::new_v4(),
            customer_id: booking.customer_id,
            car_id: booking.car_id,
            staff_id: booking.staff_id,
            pickup_at: booking.window.pickup_at(),
            dropoff_at: booking.window.dropoff_at(),
            pickup_location_id: booking.pickup_location_id,
            dropoff_location_id: booking.dropoff_location_id,
            price: booking.price,
            status: BookingStatus::Confirmed,
            created_at: booking.created_at,
        };
        self.staged.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> AppResult<()> {
        let booking = self
            .staged
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id))?;
        booking.status = status;
        Ok(())
    }

    async fn delete_booking(&mut self, booking_id: Uuid) -> AppResult<()> {
        self.staged.payments.remove(&booking_id);
        self.staged.bookings.remove(&booking_id);
        Ok(())
    }

    async fn expired_unpaid_bookings(&mut self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let mut expired: Vec<Booking> = self
            .staged
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Confirmed
                    && b.created_at < cutoff
                    && !self.staged.payments.contains_key(&b.id)
            })
            .cloned()
            .collect();
        expired.sort_by_key(|b| b.created_at);
        Ok(expired)
    }

    async fn find_payment(&mut self, booking_id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self.staged.payments.get(&booking_id).cloned())
    }

    async fn insert_payment(&mut self, booking_id: Uuid, amount: Decimal, paid_at: DateTime<Utc>) -> AppResult<Payment> {
        if self.staged.payments.contains_key(&booking_id) {
            return Err(AppError::AlreadyPaid(booking_id));
        }
        let payment = Payment {
            booking_id,
            amount,
            paid_at,
        };
        self.staged.payments.insert(booking_id, payment.clone());
        Ok(payment)
    }

    async fn delete_payment(&mut self, booking_id: Uuid) -> AppResult<bool> {
        Ok(self.staged.payments.remove(&booking_id).is_some())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_changes_are_discarded() {
        let store = MemoryStore::new();
        let staff = store.add_staff("Ana", "García").await;
        let booking_id = Uuid::new_v4();

        {
            let mut tx = store.begin().await.unwrap();
            // sin commit: no debe quedar nada
            tx.insert_payment(booking_id, Decimal::from(10), Utc::now())
                .await
                .unwrap();
        }

        assert!(store.payment(booking_id).await.is_none());

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.any_staff().await.unwrap(), Some(staff.id));
    }

    #[tokio::test]
    async fn test_commit_persists_changes() {
        let store = MemoryStore::new();
        let booking_id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        tx.insert_payment(booking_id, Decimal::from(10), Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(store.payment(booking_id).await.is_some());
    }
}
