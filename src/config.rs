//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the bay-tides.toml file.
//! It provides a centralized way to configure the model data source, the forecast
//! sites, the output location, and the tuning thresholds of the tide finder.

use crate::TideParams;
use chrono::Duration;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE: &str = "bay-tides.toml";

/// Application configuration loaded from bay-tides.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Model output source and caching
    pub dataset: DatasetConfig,
    /// Where and how reports are written
    pub output: OutputConfig,
    /// Tide finder thresholds
    #[serde(default)]
    pub params: ParamsConfig,
    /// Forecast sites
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

/// Ocean-model extract location
#[derive(Debug, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// Local path or http(s) URL of the JSON model extract
    pub source: String,
    /// Cache file for downloaded extracts
    pub cache_path: String,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// Offset in metres added to the model sea level (model datum to chart datum)
    pub level_offset: f64,
}

/// Report output configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory receiving one `<site>.json` per site
    pub directory: String,
    /// IANA timezone used when formatting times for display
    pub timezone: String,
}

/// Tide finder thresholds, in config-friendly units
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ParamsConfig {
    pub min_separation_minutes: i64,
    pub flat_tolerance: f64,
    pub fallback_window_minutes: i64,
    pub step_seconds: i64,
}

/// A coastal forecast site
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SiteConfig {
    /// Site name; `-` reads as a space and `_` as an apostrophe when displayed
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    /// Grid cell `[ix, iy]` whose sea level is used when the site dries out
    #[serde(default)]
    pub substitute: Option<[usize; 2]>,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        ParamsConfig {
            min_separation_minutes: 300,
            flat_tolerance: 0.05,
            fallback_window_minutes: 745, // 12 h 25 min
            step_seconds: 60,
        }
    }
}

impl ParamsConfig {
    pub fn to_params(&self) -> TideParams {
        TideParams {
            min_separation: Duration::minutes(self.min_separation_minutes),
            flat_tolerance: self.flat_tolerance,
            fallback_window: Duration::minutes(self.fallback_window_minutes),
            step: Duration::seconds(self.step_seconds),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset: DatasetConfig {
                source: "model-extract.json".to_string(),
                cache_path: "/tmp/bay_tides_cache.json".to_string(),
                cache_ttl_minutes: 30,
                level_offset: 3.0,
            },
            output: OutputConfig {
                directory: "out".to_string(),
                timezone: "Europe/Dublin".to_string(),
            },
            params: ParamsConfig::default(),
            sites: vec![SiteConfig {
                name: "Galway-Docks".to_string(),
                lon: -9.048,
                lat: 53.269,
                substitute: None,
            }],
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration with {} site(s)", config.sites.len());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(
                    "No config file at {}, using default configuration",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
