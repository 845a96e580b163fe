use anyhow::Result;
use chrono::Utc;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use uuid::Uuid;

use car_rental::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use car_rental::database::{create_pool, run_migrations};
use car_rental::models::car::{Car, CarStatus, FuelDetails};
use car_rental::repositories::{MemoryStore, PgRentalStore, RentalStore};
use car_rental::services::ExpiryService;
use car_rental::utils::clock::{Clock, SystemClock};
use car_rental::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt().with_max_level(config.log_level).init();

    info!("🚗 Car Rental - Booking API");
    info!("==========================");

    let store: Arc<dyn RentalStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config.database_url.clone().unwrap_or_default();
            let pool = create_pool(&DatabaseConfig::new(url)).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                e
            })?;
            if config.run_migrations {
                run_migrations(&pool).await?;
            }
            Arc::new(PgRentalStore::new(pool))
        }
        StorageBackend::Memory => {
            warn!("⚠️ Using the in-memory store: data is lost on restart");
            let store = MemoryStore::new();
            seed_demo_data(&store).await;
            Arc::new(store)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(store, clock, config.clone());

    if config.sweep_interval_seconds > 0 {
        spawn_sweeper(state.expiry_service(), config.sweep_interval_seconds);
    }

    let app = create_app(state);
    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("   Expiración de pago: {} minutos", config.payment_timeout_minutes);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   GET  /api/cars | /api/cars/:id | /api/cars/:id/availability | /api/cars/:id/quote");
    info!("   GET  /api/models/:id/available-car");
    info!("   POST /api/bookings | GET /api/bookings | GET/DELETE /api/bookings/:id");
    info!("   POST /api/payments");
    info!("   /api/admin/... (X-Staff-Id)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Barrido periódico además del disparado por lecturas
fn spawn_sweeper(expiry: ExpiryService, every_seconds: u64) {
    info!("⏰ Background sweeper every {}s", every_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_seconds));
        loop {
            ticker.tick().await;
            if let Err(e) = expiry.sweep_expired().await {
                error!("❌ Background sweep failed: {}", e);
            }
        }
    });
}

/// Catálogo mínimo para arrancar con `STORAGE_BACKEND=memory`
async fn seed_demo_data(store: &MemoryStore) {
    let airport = store.add_location("Airport").await;
    let downtown = store.add_location("Downtown").await;
    let corolla = store.add_model(Uuid::new_v4(), "Corolla").await;
    let model_3 = store.add_model(Uuid::new_v4(), "Model 3").await;
    store.add_staff("Demo", "Staff").await;

    let car_type_id = Uuid::new_v4();
    let fleet = [
        (corolla.id, airport.id, Decimal::new(4500, 2), None),
        (corolla.id, airport.id, Decimal::new(4500, 2), None),
        (corolla.id, downtown.id, Decimal::new(4200, 2), None),
        (
            model_3.id,
            downtown.id,
            Decimal::new(8900, 2),
            Some(FuelDetails::Electric {
                battery_range: Some(490),
                charging_rate_kw: Some(Decimal::from(170)),
                last_charging_date: None,
            }),
        ),
    ];

    for (model_id, location_id, rate, fuel) in fleet {
        let car = Car {
            id: Uuid::new_v4(),
            model_id,
            car_type_id,
            rate,
            seats: 5,
            doors: 5,
            suitcases: 2,
            colour: None,
            description: None,
            location_id,
            status: CarStatus::Available,
            created_at: Utc::now(),
        };
        store.add_car(car, fuel).await;
    }

    info!(
        "🌱 Demo data seeded: locations {} / {}, models {} / {}",
        airport.id, downtown.id, corolla.id, model_3.id
    );
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
