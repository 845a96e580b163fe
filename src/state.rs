//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los servicios se construyen por petición a
//! partir del store y el reloj inyectados.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::RentalStore;
use crate::services::{
    AvailabilityService, BookingService, ExpiryService, InventoryService, PaymentService,
};
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RentalStore>,
    pub clock: Arc<dyn Clock>,
    pub config: EnvironmentConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn RentalStore>, clock: Arc<dyn Clock>, config: EnvironmentConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn availability_service(&self) -> AvailabilityService {
        AvailabilityService::new(self.store.clone())
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(self.store.clone(), self.clock.clone(), self.config.payment_timeout())
    }

    pub fn expiry_service(&self) -> ExpiryService {
        ExpiryService::new(self.store.clone(), self.clock.clone(), self.config.payment_timeout())
    }

    pub fn inventory_service(&self) -> InventoryService {
        InventoryService::new(self.store.clone(), self.clock.clone(), self.config.payment_timeout())
    }

    pub fn payment_service(&self) -> PaymentService {
        PaymentService::new(self.store.clone(), self.clock.clone())
    }
}
