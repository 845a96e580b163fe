//! Store sobre PostgreSQL
//!
//! Cada `PgRentalTx` envuelve una `sqlx::Transaction`. Los métodos `lock_*` usan
//! `SELECT ... FOR UPDATE`, de modo que dos peticiones que reservan el mismo coche
//! se serializan en la fila del coche y la segunda ve la reserva de la primera.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::models::{
    booking::{Booking, BookingStatus, BookingSummary, NewBooking},
    car::{Car, CarDetails, CarFilters, CarStatus, FuelDetails, FuelType, NewCar},
    catalog::{CarModel, Location},
    payment::{Payment, PaymentStatus},
};
use crate::repositories::{RentalStore, RentalTx};
use crate::utils::errors::{map_insert_error, not_found_error, AppError, AppResult};

const CAR_COLUMNS: &str = "c.id, c.model_id, c.car_type_id, c.rate, c.seats, c.doors, c.suitcases, \
     c.colour, c.description, c.location_id, c.status, c.created_at";

const BOOKING_COLUMNS: &str = "b.id, b.customer_id, b.car_id, b.staff_id, b.pickup_at, b.dropoff_at, \
     b.pickup_location_id, b.dropoff_location_id, b.price, b.status, b.created_at";

/// Coche con las columnas de las tres tablas de combustible
#[derive(Debug, FromRow)]
struct CarWithFuelRow {
    #[sqlx(flatten)]
    car: Car,
    has_petrol: bool,
    has_diesel: bool,
    has_electric: bool,
    octane_rating: Option<i32>,
    petrol_tank: Option<Decimal>,
    diesel_emission: Option<String>,
    diesel_tank: Option<Decimal>,
    battery_range: Option<i32>,
    charging_rate_kw: Option<Decimal>,
    last_charging_date: Option<NaiveDate>,
}

impl CarWithFuelRow {
    fn into_details(self) -> CarDetails {
        let fuel = if self.has_petrol {
            Some(FuelDetails::Petrol {
                octane_rating: self.octane_rating,
                fuel_tank_capacity: self.petrol_tank,
            })
        } else if self.has_diesel {
            Some(FuelDetails::Diesel {
                diesel_emission: self.diesel_emission,
                fuel_tank_capacity: self.diesel_tank,
            })
        } else if self.has_electric {
            Some(FuelDetails::Electric {
                battery_range: self.battery_range,
                charging_rate_kw: self.charging_rate_kw,
                last_charging_date: self.last_charging_date,
            })
        } else {
            None
        };

        CarDetails {
            car: self.car,
            fuel,
        }
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    #[sqlx(flatten)]
    booking: Booking,
    paid: bool,
}

fn car_with_fuel_select() -> String {
    format!(
        r#"
        SELECT {CAR_COLUMNS},
               p.car_id IS NOT NULL AS has_petrol,
               d.car_id IS NOT NULL AS has_diesel,
               e.car_id IS NOT NULL AS has_electric,
               p.octane_rating, p.fuel_tank_capacity AS petrol_tank,
               d.diesel_emission, d.fuel_tank_capacity AS diesel_tank,
               e.battery_range, e.charging_rate_kw, e.last_charging_date
        FROM cars c
        JOIN models m ON m.id = c.model_id
        LEFT JOIN petrol p ON p.car_id = c.id
        LEFT JOIN diesel d ON d.car_id = c.id
        LEFT JOIN electric e ON e.car_id = c.id
        "#
    )
}

#[derive(Debug, Clone)]
pub struct PgRentalStore {
    pool: PgPool,
}

impl PgRentalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalStore for PgRentalStore {
    async fn begin(&self) -> AppResult<Box<dyn RentalTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRentalTx { tx }))
    }
}

pub struct PgRentalTx {
    tx: Transaction<'static, Postgres>,
}

impl PgRentalTx {
    async fn cars_for(&mut self, model_id: Uuid, location_id: Uuid, for_update: bool) -> AppResult<Vec<Car>> {
        // orden fijo por id para que los bloqueos no se crucen
        let query = format!(
            "SELECT {CAR_COLUMNS} FROM cars c \
             WHERE c.model_id = $1 AND c.location_id = $2 \
             ORDER BY c.id{}",
            if for_update { " FOR UPDATE" } else { "" }
        );

        let cars = sqlx::query_as::<_, Car>(&query)
            .bind(model_id)
            .bind(location_id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(cars)
    }
}

#[async_trait]
impl RentalTx for PgRentalTx {
    async fn find_car(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars c WHERE c.id = $1"))
            .bind(car_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(car)
    }

    async fn lock_car(&mut self, car_id: Uuid) -> AppResult<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars c WHERE c.id = $1 FOR UPDATE"
        ))
        .bind(car_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(car)
    }

    async fn fuel_details(&mut self, car_id: Uuid) -> AppResult<Option<FuelDetails>> {
        let row = sqlx::query_as::<_, CarWithFuelRow>(&format!("{} WHERE c.id = $1", car_with_fuel_select()))
            .bind(car_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.and_then(|r| r.into_details().fuel))
    }

    async fn cars_for_model_at(&mut self, model_id: Uuid, location_id: Uuid) -> AppResult<Vec<Car>> {
        self.cars_for(model_id, location_id, false).await
    }

    async fn lock_cars_for_model_at(&mut self, model_id: Uuid, location_id: Uuid) -> AppResult<Vec<Car>> {
        self.cars_for(model_id, location_id, true).await
    }

    async fn search_cars(&mut self, filters: &CarFilters) -> AppResult<Vec<CarDetails>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(car_with_fuel_select());
        builder.push(" WHERE c.status <> 'Maintenance'");

        if let Some(location_id) = filters.location_id {
            builder.push(" AND c.location_id = ").push_bind(location_id);
        }
        if let Some(model_id) = filters.model_id {
            builder.push(" AND c.model_id = ").push_bind(model_id);
        }
        if let Some(brand_id) = filters.brand_id {
            builder.push(" AND m.brand_id = ").push_bind(brand_id);
        }
        if let Some(car_type_id) = filters.car_type_id {
            builder.push(" AND c.car_type_id = ").push_bind(car_type_id);
        }
        match filters.fuel_type {
            Some(FuelType::Petrol) => {
                builder.push(" AND p.car_id IS NOT NULL");
            }
            Some(FuelType::Diesel) => {
                builder.push(" AND d.car_id IS NOT NULL");
            }
            Some(FuelType::Electric) => {
                builder.push(" AND e.car_id IS NOT NULL");
            }
            None => {}
        }
        if let Some(seats) = filters.seats {
            builder.push(" AND c.seats = ").push_bind(seats);
        }
        if let Some(suitcases) = filters.suitcases {
            builder.push(" AND c.suitcases = ").push_bind(suitcases);
        }
        if let Some(min_rate) = filters.min_rate {
            builder.push(" AND c.rate >= ").push_bind(min_rate);
        }
        if let Some(max_rate) = filters.max_rate {
            builder.push(" AND c.rate <= ").push_bind(max_rate);
        }
        builder.push(" ORDER BY c.rate, c.id");

        let rows = builder
            .build_query_as::<CarWithFuelRow>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(CarWithFuelRow::into_details).collect())
    }

    async fn list_all_cars(&mut self) -> AppResult<Vec<CarDetails>> {
        let rows = sqlx::query_as::<_, CarWithFuelRow>(&format!(
            "{} ORDER BY c.created_at DESC, c.id",
            car_with_fuel_select()
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(CarWithFuelRow::into_details).collect())
    }

    async fn set_car_status(&mut self, car_id: Uuid, status: CarStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE cars SET status = $2 WHERE id = $1")
            .bind(car_id)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Car", &car_id));
        }
        Ok(())
    }

    async fn insert_car(&mut self, car: &NewCar, created_at: DateTime<Utc>) -> AppResult<Car> {
        let stored = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (id, model_id, car_type_id, rate, seats, doors, suitcases,
                              colour, description, location_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'Available', $11)
            RETURNING id, model_id, car_type_id, rate, seats, doors, suitcases,
                      colour, description, location_id, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(car.model_id)
        .bind(car.car_type_id)
        .bind(car.rate)
        .bind(car.seats)
        .bind(car.doors)
        .bind(car.suitcases)
        .bind(&car.colour)
        .bind(&car.description)
        .bind(car.location_id)
        .bind(created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "Car"))?;

        Ok(stored)
    }

    async fn update_car(&mut self, car_id: Uuid, car: &NewCar) -> AppResult<Car> {
        let stored = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET model_id = $2, car_type_id = $3, rate = $4, seats = $5, doors = $6,
                suitcases = $7, colour = $8, description = $9, location_id = $10
            WHERE id = $1
            RETURNING id, model_id, car_type_id, rate, seats, doors, suitcases,
                      colour, description, location_id, status, created_at
            "#,
        )
        .bind(car_id)
        .bind(car.model_id)
        .bind(car.car_type_id)
        .bind(car.rate)
        .bind(car.seats)
        .bind(car.doors)
        .bind(car.suitcases)
        .bind(&car.colour)
        .bind(&car.description)
        .bind(car.location_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "Car"))?;

        stored.ok_or_else(|| not_found_error("Car", &car_id))
    }

    async fn insert_fuel_details(&mut self, car_id: Uuid, fuel: &FuelDetails) -> AppResult<()> {
        let query = match fuel {
            FuelDetails::Petrol {
                octane_rating,
                fuel_tank_capacity,
            } => sqlx::query(
                "INSERT INTO petrol (car_id, octane_rating, fuel_tank_capacity) VALUES ($1, $2, $3)",
            )
            .bind(car_id)
            .bind(*octane_rating)
            .bind(*fuel_tank_capacity),
            FuelDetails::Diesel {
                diesel_emission,
                fuel_tank_capacity,
            } => sqlx::query(
                "INSERT INTO diesel (car_id, diesel_emission, fuel_tank_capacity) VALUES ($1, $2, $3)",
            )
            .bind(car_id)
            .bind(diesel_emission.clone())
            .bind(*fuel_tank_capacity),
            FuelDetails::Electric {
                battery_range,
                charging_rate_kw,
                last_charging_date,
            } => sqlx::query(
                "INSERT INTO electric (car_id, battery_range, charging_rate_kw, last_charging_date) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(car_id)
            .bind(*battery_range)
            .bind(*charging_rate_kw)
            .bind(*last_charging_date),
        };

        query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_insert_error(e, "Fuel record"))?;

        Ok(())
    }

    async fn delete_fuel_details(&mut self, car_id: Uuid) -> AppResult<()> {
        for table in ["petrol", "diesel", "electric"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE car_id = $1"))
                .bind(car_id)
                .execute(&mut *self.tx)
                .await?;
        }

        Ok(())
    }

    async fn count_bookings_for_car(&mut self, car_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE car_id = $1")
            .bind(car_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn delete_car(&mut self, car_id: Uuid) -> AppResult<()> {
        // los registros de combustible caen por ON DELETE CASCADE
        sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(car_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn find_model(&mut self, model_id: Uuid) -> AppResult<Option<CarModel>> {
        let model = sqlx::query_as::<_, CarModel>("SELECT id, brand_id, name, image FROM models WHERE id = $1")
            .bind(model_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(model)
    }

    async fn find_location(&mut self, location_id: Uuid) -> AppResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>("SELECT id, name FROM locations WHERE id = $1")
            .bind(location_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(location)
    }

    async fn any_staff(&mut self) -> AppResult<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM staff ORDER BY id LIMIT 1")
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(|(id,)| id))
    }

    async fn find_booking(&mut self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(booking)
    }

    async fn lock_booking(&mut self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(booking)
    }

    async fn bookings_for_car(&mut self, car_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.car_id = $1 ORDER BY b.pickup_at"
        ))
        .bind(car_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(bookings)
    }

    async fn list_bookings(&mut self, customer_id: Option<Uuid>) -> AppResult<Vec<BookingSummary>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}, (p.booking_id IS NOT NULL) AS paid
            FROM bookings b
            LEFT JOIN payments p ON p.booking_id = b.id
            WHERE ($1::uuid IS NULL OR b.customer_id = $1)
            ORDER BY b.pickup_at DESC
            "#
        ))
        .bind(customer_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BookingSummary {
                booking: row.booking,
                payment_status: PaymentStatus::from_paid(row.paid),
            })
            .collect())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        let stored = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, customer_id, car_id, staff_id, pickup_at, dropoff_at,
                                  pickup_location_id, dropoff_location_id, price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Confirmed', $10)
            RETURNING id, customer_id, car_id, staff_id, pickup_at, dropoff_at,
                      pickup_location_id, dropoff_location_id, price, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.customer_id)
        .bind(booking.car_id)
        .bind(booking.staff_id)
        .bind(booking.window.pickup_at())
        .bind(booking.window.dropoff_at())
        .bind(booking.pickup_location_id)
        .bind(booking.dropoff_location_id)
        .bind(booking.price)
        .bind(booking.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "Booking"))?;

        Ok(stored)
    }

    async fn update_booking_status(&mut self, booking_id: Uuid, status: BookingStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
            .bind(booking_id)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Booking", &booking_id));
        }
        Ok(())
    }

    async fn delete_booking(&mut self, booking_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn expired_unpaid_bookings(&mut self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings b
            WHERE b.status = 'Confirmed'
              AND b.created_at < $1
              AND NOT EXISTS (SELECT 1 FROM payments p WHERE p.booking_id = b.id)
            ORDER BY b.created_at
            "#
        ))
        .bind(cutoff)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(bookings)
    }

    async fn find_payment(&mut self, booking_id: Uuid) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT booking_id, amount, paid_at FROM payments WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(payment)
    }

    async fn insert_payment(&mut self, booking_id: Uuid, amount: Decimal, paid_at: DateTime<Utc>) -> AppResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (booking_id, amount, paid_at)
            VALUES ($1, $2, $3)
            RETURNING booking_id, amount, paid_at
            "#,
        )
        .bind(booking_id)
        .bind(amount)
        .bind(paid_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match map_insert_error(e, "Payment") {
            AppError::Conflict(_) => AppError::AlreadyPaid(booking_id),
            other => other,
        })?;

        Ok(payment)
    }

    async fn delete_payment(&mut self, booking_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }
}
