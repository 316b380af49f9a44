// src/config.rs

//! Manages worker configuration: loading, defaults, and validation.
//!
//! The `[app]` table is not interpreted here. It is converted to JSON and handed
//! to the application's configuration decoder once at startup.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use tracing::warn;

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_channel_capacity")]
    inbound_capacity: usize,
    #[serde(default = "default_channel_capacity")]
    outbound_capacity: usize,
    #[serde(default)]
    app: Option<toml::Table>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_channel_capacity() -> usize {
    1024
}
fn default_app_config() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Represents the final, validated worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_level: String,
    /// Buffered envelopes between the host reader and the worker loop.
    pub inbound_capacity: usize,
    /// Buffered messages between the worker loop and the host writer.
    pub outbound_capacity: usize,
    /// Opaque application configuration.
    pub app: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            inbound_capacity: default_channel_capacity(),
            outbound_capacity: default_channel_capacity(),
            app: default_app_config(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config file '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let app = match raw_config.app {
            Some(table) => serde_json::to_value(table)
                .context("Failed to convert the [app] table to JSON")?,
            None => default_app_config(),
        };

        let config = Config {
            log_level: raw_config.log_level,
            inbound_capacity: raw_config.inbound_capacity,
            outbound_capacity: raw_config.outbound_capacity,
            app,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.inbound_capacity == 0 {
            return Err(anyhow!("inbound_capacity cannot be 0"));
        }
        if self.outbound_capacity == 0 {
            return Err(anyhow!("outbound_capacity cannot be 0"));
        }
        if self.log_level.trim().is_empty() {
            return Err(anyhow!("log_level cannot be empty"));
        }
        if self.inbound_capacity < 16 {
            warn!(
                "low inbound_capacity setting: {}. The host reader will stall often.",
                self.inbound_capacity
            );
        }
        Ok(())
    }
}
