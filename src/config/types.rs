//! Configuration types with built-in defaults.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// PostgreSQL client encoding is always UTF-8; other values are rejected.
    pub charset: String,
    pub autocommit: bool,
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            host: "127.0.0.1".into(),
            port: 5432,
            user: "www-data".into(),
            password: "www-data".into(),
            database: "awesome".into(),
            charset: "utf8".into(),
            autocommit: true,
            min_size: 1,
            max_size: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub debug: bool,
    pub db: DbConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            debug: true,
            db: DbConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default `tracing` filter directive for this config.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
