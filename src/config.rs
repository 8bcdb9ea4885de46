//! Application configuration
//!
//! Settings are layered, lowest priority first:
//! 1. Built-in defaults
//! 2. `LIBRARY__*` environment variables (e.g. `LIBRARY__BIND_ADDR=0.0.0.0:8080`)
//! 3. `DATABASE_URL`, the variable sqlx tooling already uses
//!
//! A `.env` file in the working directory is read first when present.

use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "LIBRARY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub log_filter: String,
}

impl AppConfig {
    /// Load configuration from `.env`, the process environment and defaults.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside local development
        let _ = dotenvy::dotenv();

        let source = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);

        Self::load_from(source, std::env::var("DATABASE_URL").ok())
    }

    fn load_from<S>(source: S, database_url: Option<String>) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: AppConfig = config::Config::builder()
            .set_default("database_url", "postgres://localhost/library")?
            .set_default("bind_addr", "0.0.0.0:3000")?
            .set_default("max_connections", 5)?
            .set_default(
                "log_filter",
                "library_circulation=debug,tower_http=debug,axum=trace",
            )?
            .add_source(source)
            .set_override_option("database_url", database_url)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
