use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub hold: HoldRules,
    pub sweep: SweepConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Business knobs for the reservation flow.
#[derive(Debug, Deserialize, Clone)]
pub struct HoldRules {
    /// How long a fresh hold may sit in data entry.
    pub data_entry_minutes: i64,
    /// Extension granted once data entry completes and payment begins.
    pub payment_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    pub interval_seconds: u64,
    pub batch_size: i64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base configuration, checked in
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment overlay, e.g. FARLED__DATABASE__URL
            .add_source(config::Environment::with_prefix("FARLED").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
