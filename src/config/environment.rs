//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Todas las variables tienen valor por defecto salvo `DATABASE_URL`, que solo
//! se exige con el backend de Postgres.

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::str::FromStr;

use crate::services::expiry_service::DEFAULT_PAYMENT_TIMEOUT_MINUTES;

/// Backend de persistencia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend '{}' (expected postgres or memory)", other)),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub payment_timeout_minutes: i64,
    pub sweep_interval_seconds: u64,
    pub run_migrations: bool,
    pub cors_origins: Vec<String>,
    pub log_level: tracing::Level,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            storage_backend: StorageBackend::Postgres,
            payment_timeout_minutes: DEFAULT_PAYMENT_TIMEOUT_MINUTES,
            sweep_interval_seconds: 0,
            run_migrations: true,
            cors_origins: Vec::new(),
            log_level: tracing::Level::INFO,
        }
    }
}

/// Lee una variable y la parsea; si no existe, usa `default`
fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        _ => Ok(default),
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse::<StorageBackend>().context("STORAGE_BACKEND")?,
            Err(_) => defaults.storage_backend,
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }

        let payment_timeout_minutes = var_or("PAYMENT_TIMEOUT_MINUTES", defaults.payment_timeout_minutes)?;
        if payment_timeout_minutes <= 0 {
            bail!("PAYMENT_TIMEOUT_MINUTES must be positive");
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            environment: var_or("ENVIRONMENT", defaults.environment)?,
            port: var_or("PORT", defaults.port)?,
            host: var_or("HOST", defaults.host)?,
            database_url,
            storage_backend,
            payment_timeout_minutes,
            sweep_interval_seconds: var_or("SWEEP_INTERVAL_SECONDS", defaults.sweep_interval_seconds)?,
            run_migrations: var_or("RUN_MIGRATIONS", defaults.run_migrations)?,
            cors_origins,
            log_level: var_or("LOG_LEVEL", defaults.log_level)?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn payment_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.payment_timeout_minutes)
    }
}
