//! Configuración de conexión a PostgreSQL
//!
//! Crea el pool y aplica las migraciones embebidas de `migrations/`.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Crear un pool de conexiones a la base de datos
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    log::info!("🔌 Connecting to database {}", mask_database_url(&config.url));

    let pool = config
        .create_pool()
        .await
        .context("failed to connect to the database")?;

    log::info!("✅ Database connection established");
    Ok(pool)
}

/// Ejecutar migraciones de la base de datos
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    log::info!("📦 Database migrations applied");
    Ok(())
}

/// Función helper para enmascarar la URL de la base de datos en logs
pub fn mask_database_url(url: &str) -> String {
    let Some(at_pos) = url.find('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    if scheme_end > at_pos {
        return url.to_string();
    }
    format!("{}***:***@{}", &url[..scheme_end], &url[at_pos + 1..])
}
