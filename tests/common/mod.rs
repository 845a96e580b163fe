#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use car_rental::config::{EnvironmentConfig, StorageBackend};
use car_rental::models::{
    booking::{Booking, BookingStatus},
    car::{Car, CarStatus},
    catalog::{CarModel, Location},
};
use car_rental::repositories::{MemoryStore, RentalStore};
use car_rental::utils::clock::{Clock, ManualClock};
use car_rental::AppState;

/// 2024-01-03 09:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap()
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub struct TestEnv {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub location: Location,
    pub model: CarModel,
    pub staff_id: Uuid,
}

impl TestEnv {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let location = store.add_location("Estación Central").await;
        let model = store.add_model(Uuid::new_v4(), "Ibiza").await;
        let staff = store.add_staff("Marta", "Ruiz").await;

        Self {
            store,
            clock: Arc::new(ManualClock::new(now())),
            location,
            model,
            staff_id: staff.id,
        }
    }

    pub fn store(&self) -> Arc<dyn RentalStore> {
        Arc::new(self.store.clone())
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn state(&self) -> AppState {
        let config = EnvironmentConfig {
            storage_backend: StorageBackend::Memory,
            ..EnvironmentConfig::default()
        };
        AppState::new(self.store(), self.clock(), config)
    }

    pub async fn car(&self, rate: i64) -> Car {
        self.car_with_status(rate, CarStatus::Available).await
    }

    pub async fn car_with_status(&self, rate: i64, status: CarStatus) -> Car {
        let car = Car {
            id: Uuid::new_v4(),
            model_id: self.model.id,
            car_type_id: Uuid::new_v4(),
            rate: Decimal::from(rate),
            seats: 5,
            doors: 5,
            suitcases: 2,
            colour: None,
            description: None,
            location_id: self.location.id,
            status,
            created_at: at(1, 0),
        };
        self.store.add_car(car, None).await
    }

    pub async fn booking(
        &self,
        car_id: Uuid,
        pickup_at: DateTime<Utc>,
        dropoff_at: DateTime<Utc>,
        status: BookingStatus,
        created_at: DateTime<Utc>,
    ) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            car_id,
            staff_id: self.staff_id,
            pickup_at,
            dropoff_at,
            pickup_location_id: self.location.id,
            dropoff_location_id: self.location.id,
            price: Decimal::from(100),
            status,
            created_at,
        };
        self.store.add_booking(booking).await
    }
}
