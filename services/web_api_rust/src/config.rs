//! Service configuration loaded from environment variables at startup.

use anyhow::{Context, Result};
use std::env;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP listener binds to (default: 8080)
    pub port: u16,
    /// Postgres connection URL (required)
    pub database_url: String,
    /// Season whose fixtures are served (default: 2025-2026)
    pub season: String,
    /// Path to the JSON file with login users (default: users.json)
    pub users_file: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable must be set")?,

            season: env::var("SEASON").unwrap_or_else(|_| "2025-2026".to_string()),

            users_file: env::var("USERS_FILE").unwrap_or_else(|_| "users.json".to_string()),
        })
    }

    /// Log current configuration (useful at startup). The database URL is
    /// withheld because it carries credentials.
    pub fn log_config(&self) {
        info!("Config loaded:");
        info!("  port: {}", self.port);
        info!("  season: {}", self.season);
        info!("  users_file: {}", self.users_file);
    }
}
