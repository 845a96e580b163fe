//! Modelo de Booking
//!
//! Este módulo contiene la reserva, su máquina de estados y la ventana de
//! alquiler con la regla de solapamiento que usa el verificador de disponibilidad.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::payment::PaymentStatus;
use crate::utils::errors::AppError;

/// Estado de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status")]
pub enum BookingStatus {
    Confirmed,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::InProgress => "In Progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    /// Una reserva activa bloquea el coche para su ventana
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::InProgress)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "In Progress" => Ok(BookingStatus::InProgress),
            "Completed" => Ok(BookingStatus::Completed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(AppError::BadRequest(format!(
                "Invalid booking status '{}' (expected Confirmed, In Progress, Completed or Cancelled)",
                other
            ))),
        }
    }
}

/// Ventana de alquiler [pickup, dropoff] ya validada (dropoff > pickup)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RentalWindow {
    pickup_at: DateTime<Utc>,
    dropoff_at: DateTime<Utc>,
}

impl RentalWindow {
    pub fn new(pickup_at: DateTime<Utc>, dropoff_at: DateTime<Utc>) -> Result<Self, AppError> {
        if dropoff_at <= pickup_at {
            return Err(AppError::InvalidRange(format!(
                "dropoff {} must be after pickup {}",
                dropoff_at.to_rfc3339(),
                pickup_at.to_rfc3339()
            )));
        }
        Ok(Self {
            pickup_at,
            dropoff_at,
        })
    }

    pub fn pickup_at(&self) -> DateTime<Utc> {
        self.pickup_at
    }

    pub fn dropoff_at(&self) -> DateTime<Utc> {
        self.dropoff_at
    }

    /// Duración en minutos completos
    pub fn duration_minutes(&self) -> i64 {
        (self.dropoff_at - self.pickup_at).num_minutes()
    }

    /// Solapamiento inclusivo: `[a,b]` y `[c,d]` se solapan si `a <= d && c <= b`.
    ///
    /// Dos ventanas que se tocan (dropoff de una == pickup de la otra) SE solapan.
    pub fn overlaps(&self, pickup_at: DateTime<Utc>, dropoff_at: DateTime<Utc>) -> bool {
        self.pickup_at <= dropoff_at && pickup_at <= self.dropoff_at
    }
}

/// Booking principal - mapea a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub staff_id: Uuid,
    pub pickup_at: DateTime<Utc>,
    pub dropoff_at: DateTime<Utc>,
    pub pickup_location_id: Uuid,
    pub dropoff_location_id: Uuid,
    pub price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Reserva activa cuya ventana se solapa con la pedida
    pub fn blocks(&self, window: &RentalWindow) -> bool {
        self.status.is_active() && window.overlaps(self.pickup_at, self.dropoff_at)
    }

    /// La ventana contiene el día dado (comparando fechas de calendario)
    pub fn covers_day(&self, day: NaiveDate) -> bool {
        self.pickup_at.date_naive() <= day && day <= self.dropoff_at.date_naive()
    }
}

/// Datos para insertar una reserva
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub staff_id: Uuid,
    pub window: RentalWindow,
    pub pickup_location_id: Uuid,
    pub dropoff_location_id: Uuid,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Qué coche se quiere reservar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTarget {
    /// Un coche concreto
    Car(Uuid),
    /// Cualquier unidad libre del modelo en la ubicación de recogida
    Model(Uuid),
}

/// Reserva con su estado de pago derivado
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub payment_status: PaymentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_window_rejects_empty_or_negative_range() {
        assert!(matches!(
            RentalWindow::new(at(5, 10), at(5, 10)),
            Err(AppError::InvalidRange(_))
        ));
        assert!(matches!(
            RentalWindow::new(at(6, 10), at(5, 10)),
            Err(AppError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_overlap_is_inclusive_at_boundaries() {
        let window = RentalWindow::new(at(8, 0), at(10, 0)).unwrap();
        // termina justo cuando empieza la pedida
        assert!(window.overlaps(at(5, 0), at(8, 0)));
        // empieza justo cuando termina la pedida
        assert!(window.overlaps(at(10, 0), at(12, 0)));
        assert!(!window.overlaps(at(5, 0), at(7, 23)));
        assert!(!window.overlaps(at(10, 1), at(12, 0)));
        // contenida
        assert!(window.overlaps(at(8, 12), at(9, 0)));
    }

    #[test]
    fn test_status_round_trip_with_space() {
        let status: BookingStatus = "In Progress".parse().unwrap();
        assert_eq!(status, BookingStatus::InProgress);
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            serde_json::json!("In Progress")
        );
        assert!("Pending".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_covers_day_uses_calendar_dates() {
        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            pickup_at: at(5, 18),
            dropoff_at: at(7, 9),
            pickup_location_id: Uuid::new_v4(),
            dropoff_location_id: Uuid::new_v4(),
            price: Decimal::from(100),
            status: BookingStatus::Confirmed,
            created_at: at(1, 0),
        };
        assert!(booking.covers_day(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));
        assert!(booking.covers_day(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()));
        assert!(!booking.covers_day(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()));
    }
}
