//! Dashboard configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional
//! `dashboard.toml` next to the binary, then `TALLY_*` environment
//! variables (`TALLY_PORT=8080`, `TALLY_JWT_SECRET=...`).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default number of sales per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

/// Default number of listing pages kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Interface to bind, e.g. `127.0.0.1`
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Secret for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Sales per listing page
    pub listing_page_size: u32,

    /// Listing pages kept in the cache
    pub listing_cache_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_path: "./tally.db".to_string(),
            // In production, this MUST be set via TALLY_JWT_SECRET
            jwt_secret: "tally-dev-secret-change-in-production".to_string(),
            session_lifetime_secs: 8 * 3600,
            listing_page_size: DEFAULT_PAGE_SIZE,
            listing_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from defaults, `dashboard.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = DashboardConfig::default();

        let config: DashboardConfig = Config::builder()
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("session_lifetime_secs", defaults.session_lifetime_secs)?
            .set_default("listing_page_size", i64::from(defaults.listing_page_size))?
            .set_default("listing_cache_capacity", defaults.listing_cache_capacity as i64)?
            .add_source(File::with_name("dashboard").required(false))
            .add_source(Environment::with_prefix("TALLY").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.listing_page_size == 0 {
            return Err(ConfigError::InvalidValue("listing_page_size".to_string()));
        }
        if self.listing_cache_capacity == 0 {
            return Err(ConfigError::InvalidValue("listing_cache_capacity".to_string()));
        }
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("session_lifetime_secs".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind the listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
