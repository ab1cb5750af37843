//! Configuration, loaded from `config/tripool.toml` plus `TRIPOOL__*`
//! environment overrides.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Database backing the server.
///
/// In the config file either `database = "memory"` or
/// `database = { sqlite = "./tripool.db" }`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/tripool").required(false))
            .add_source(Environment::with_prefix("TRIPOOL").separator("__"))
            .build()?
            .try_deserialize()
    }
}
