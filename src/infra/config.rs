//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument; a missing
//! or unreadable file falls back to built-in defaults with a warning.

use crate::io::station::{StationConfig, DEFAULT_TIMEOUT_SECS};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct StationSection {
    #[serde(default = "default_station_url")]
    pub url: String,
    #[serde(default = "default_station_hours")]
    pub hours: u32,
    #[serde(default = "default_station_maxpts")]
    pub maxpts: u32,
    #[serde(default = "default_station_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_station_url() -> String {
    "http://192.168.0.17:8000/indexjson.php".to_string()
}

fn default_station_hours() -> u32 {
    24
}

fn default_station_maxpts() -> u32 {
    2000
}

fn default_station_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for StationSection {
    fn default() -> Self {
        Self {
            url: default_station_url(),
            hours: default_station_hours(),
            maxpts: default_station_maxpts(),
            timeout_secs: default_station_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSection {
    /// Seconds between automatic refresh cycles
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,
}

fn default_refresh_interval_secs() -> u64 {
    60
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self { interval_secs: default_refresh_interval_secs() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSection {
    /// Seconds between metrics summary log lines
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

fn default_metrics_interval_secs() -> u64 {
    60
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    station: StationSection,
    #[serde(default)]
    refresh: RefreshSection,
    #[serde(default)]
    metrics: MetricsSection,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    station_url: String,
    station_hours: u32,
    station_maxpts: u32,
    station_timeout_secs: u64,
    refresh_interval_secs: u64,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station_url: default_station_url(),
            station_hours: default_station_hours(),
            station_maxpts: default_station_maxpts(),
            station_timeout_secs: default_station_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            metrics_interval_secs: default_metrics_interval_secs(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            station_url: toml_config.station.url,
            station_hours: toml_config.station.hours,
            station_maxpts: toml_config.station.maxpts,
            station_timeout_secs: toml_config.station.timeout_secs,
            refresh_interval_secs: toml_config.refresh.interval_secs,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Station client settings derived from this configuration
    pub fn station_config(&self) -> StationConfig {
        StationConfig {
            url: self.station_url.clone(),
            hours: self.station_hours,
            maxpts: self.station_maxpts,
            connect_timeout: Duration::from_secs(self.station_timeout_secs),
            read_timeout: Duration::from_secs(self.station_timeout_secs),
        }
    }

    // Getters for all config fields
    pub fn station_url(&self) -> &str {
        &self.station_url
    }

    pub fn station_hours(&self) -> u32 {
        self.station_hours
    }

    pub fn station_maxpts(&self) -> u32 {
        self.station_maxpts
    }

    pub fn station_timeout_secs(&self) -> u64 {
        self.station_timeout_secs
    }

    pub fn refresh_interval_secs(&self) -> u64 {
        self.refresh_interval_secs
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.station_url(), "http://192.168.0.17:8000/indexjson.php");
        assert_eq!(config.station_hours(), 24);
        assert_eq!(config.station_maxpts(), 2000);
        assert_eq!(config.station_timeout_secs(), 20);
        assert_eq!(config.refresh_interval_secs(), 60);
        assert_eq!(config.metrics_interval_secs(), 60);
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_station_config_from_defaults() {
        let station = Config::default().station_config();
        assert_eq!(station.hours, 24);
        assert_eq!(station.maxpts, 2000);
        assert_eq!(station.connect_timeout, Duration::from_secs(20));
        assert_eq!(station.read_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let toml_config: TomlConfig =
            toml::from_str("[station]\nurl = \"http://pi.local/indexjson.php\"\n").unwrap();
        assert_eq!(toml_config.station.url, "http://pi.local/indexjson.php");
        assert_eq!(toml_config.station.hours, 24);
        assert_eq!(toml_config.refresh.interval_secs, 60);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let toml_config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(toml_config.station.maxpts, 2000);
        assert_eq!(toml_config.metrics.interval_secs, 60);
    }
}
