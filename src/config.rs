//! Configuration loader for the `fieldops-reports` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Keeping every `env::var` call here means the rest
//! of the service only ever sees a typed [`Config`].
//!
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};

use crate::calc::insulation::DEFAULT_MINIMUM_RATIO;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Minimum DAR/PI for new reports to be marked acceptable.
    pub min_insulation_ratio: f64,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `MIN_INSULATION_RATIO` – acceptance floor for DAR/PI (default: 1.0)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let min_insulation_ratio = parse_env_f64!("MIN_INSULATION_RATIO", DEFAULT_MINIMUM_RATIO);
    let bind_addr = env::var("BIND_ADDR")
        .ok()
        .map(|v| v.parse::<SocketAddr>())
        .transpose()
        .map_err(|e| anyhow!("Invalid BIND_ADDR: {}", e))?
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

    if !min_insulation_ratio.is_finite() || min_insulation_ratio < 0.0 {
        return Err(anyhow!(
            "Invalid MIN_INSULATION_RATIO: {} (must be a non-negative number)",
            min_insulation_ratio
        ));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        bind_addr,
        min_insulation_ratio,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL         : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX          : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR            : {}", self.bind_addr);
        tracing::info!("  MIN_INSULATION_RATIO : {}", self.min_insulation_ratio);
    }

    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                // `postgres://host@...` has no password; the colon is the scheme's.
                if !self.db_url[colon_pos..].starts_with("://") {
                    return format!(
                        "{}:****{}",
                        &self.db_url[..colon_pos],
                        &self.db_url[at_pos..]
                    );
                }
            }
        }
        self.db_url.clone()
    }
}
