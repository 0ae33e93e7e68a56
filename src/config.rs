//! Configuration loaded from a TOML file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoutingError};
use crate::safety::DaylightWindow;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub daylight: DaylightWindow,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Paths to the already-parsed record files (JSON arrays).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub segments_path: PathBuf,
    pub conditions_path: Option<PathBuf>,
    pub lights_path: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            segments_path: PathBuf::from("assets/segments.json"),
            conditions_path: None,
            lights_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let DaylightWindow {
            day_start_hour,
            day_end_hour,
        } = self.daylight;
        if day_end_hour > 24 {
            return Err(RoutingError::Config(format!(
                "day_end_hour must be at most 24, got {day_end_hour}"
            )));
        }
        if day_start_hour >= day_end_hour {
            return Err(RoutingError::Config(format!(
                "day_start_hour ({day_start_hour}) must be before day_end_hour ({day_end_hour})"
            )));
        }
        if self.server.bind_address.is_empty() {
            return Err(RoutingError::Config("bind_address is empty".to_string()));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
