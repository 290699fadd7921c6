//! Application configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Storage ===
    /// SQLite database file holding the `pessoa` table.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Number of sample rows generated by the `seed` command.
    #[serde(default = "default_seed_count")]
    pub seed_count: usize,

    // === Logging ===
    /// Append-only log file.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Console log filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Server Configuration ===
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("crud.db")
}

fn default_seed_count() -> usize {
    50
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/pessoas.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            seed_count: default_seed_count(),
            log_file: default_log_file(),
            rust_log: default_log_level(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> std::result::Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.database_path.as_os_str().is_empty() {
            return Err("DATABASE_PATH must not be empty".to_string());
        }

        if self.log_file.as_os_str().is_empty() {
            return Err("LOG_FILE must not be empty".to_string());
        }

        if self.host.parse::<IpAddr>().is_err() {
            return Err(format!("HOST is not an IP address: {}", self.host));
        }

        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        Ok(())
    }

    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(AppError::InvalidConfig)?;
        Ok(config)
    }
}
