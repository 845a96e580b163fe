//! Calculadora de precios
//!
//! Precio = tarifa diaria × días facturados, con un mínimo de un día y
//! redondeo hacia arriba de los días parciales. Sin impuestos ni descuentos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::booking::RentalWindow;
use crate::utils::errors::AppResult;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Días facturados: `max(1, floor((horas + 23) / 24))`
///
/// Las horas pueden ser fraccionarias (resolución de minutos), así que 24h30m
/// sigue siendo un día y 25h son dos.
pub fn billed_days(window: &RentalWindow) -> i64 {
    let minutes = window.duration_minutes();
    ((minutes + 23 * MINUTES_PER_HOUR) / MINUTES_PER_DAY).max(1)
}

pub fn price_for_window(rate: Decimal, window: &RentalWindow) -> Decimal {
    rate * Decimal::from(billed_days(window))
}

/// `price(rate, pickup, dropoff)`; falla con `InvalidRange` si dropoff <= pickup
pub fn price(rate: Decimal, pickup_at: DateTime<Utc>, dropoff_at: DateTime<Utc>) -> AppResult<Decimal> {
    let window = RentalWindow::new(pickup_at, dropoff_at)?;
    Ok(price_for_window(rate, &window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_under_a_day_bills_one_day() {
        // 23h -> 1 día
        let amount = price(Decimal::from(50), at(1, 10, 0), at(2, 9, 0)).unwrap();
        assert_eq!(amount, Decimal::from(50));
    }

    #[test]
    fn test_partial_days_round_up() {
        // 49h -> ceil(49/24) = 3 días
        let amount = price(Decimal::from(50), at(1, 10, 0), at(3, 11, 0)).unwrap();
        assert_eq!(amount, Decimal::from(150));
    }

    #[test]
    fn test_exact_days_are_not_rounded() {
        let window = RentalWindow::new(at(1, 10, 0), at(3, 10, 0)).unwrap();
        assert_eq!(billed_days(&window), 2);
    }

    #[test]
    fn test_fractional_hour_follows_floor_rule() {
        // 24h30m: floor((24.5 + 23) / 24) = 1
        let window = RentalWindow::new(at(1, 10, 0), at(2, 10, 30)).unwrap();
        assert_eq!(billed_days(&window), 1);
        // 25h: floor(48 / 24) = 2
        let window = RentalWindow::new(at(1, 10, 0), at(2, 11, 0)).unwrap();
        assert_eq!(billed_days(&window), 2);
    }

    #[test]
    fn test_short_rental_bills_minimum_day() {
        let window = RentalWindow::new(at(1, 10, 0), at(1, 10, 30)).unwrap();
        assert_eq!(billed_days(&window), 1);
    }

    #[test]
    fn test_decimal_rate() {
        let rate = Decimal::new(4999, 2);
        let amount = price(rate, at(1, 10, 0), at(3, 10, 0)).unwrap();
        assert_eq!(amount, Decimal::new(9998, 2));
    }

    #[test]
    fn test_non_positive_duration_is_invalid_range() {
        let err = price(Decimal::from(50), at(2, 10, 0), at(1, 10, 0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }
}
