//! Configuration loading and path resolution
//!
//! Values come from, in priority order:
//! 1. Command-line argument (or its environment fallback, handled by clap)
//! 2. TOML config file
//! 3. OS-dependent compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory / file name used under the platform config and data dirs
pub const APP_DIR_NAME: &str = "geo-resolver";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "GeoResolver/0.1 (https://github.com/geo-resolver/geo-resolver)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Nominatim usage policy: at most one request per second
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SOURCE: &str = "nominatim";

/// Top-level TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    /// Item-store project id holding the shared geocode cache
    pub cache_scope: Option<i64>,
    pub logging: LoggingConfig,
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Provider connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub min_interval_ms: u64,
    /// Identifier recorded as `source` on every cache entry
    pub source: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl TomlConfig {
    /// Reject values that would break the provider contract
    pub fn validate(&self) -> Result<()> {
        let geocoder = &self.geocoder;
        if geocoder.base_url.trim().is_empty() {
            return Err(Error::Config("geocoder.base_url must not be empty".to_string()));
        }
        if geocoder.user_agent.trim().is_empty() {
            return Err(Error::Config(
                "geocoder.user_agent must identify this application".to_string(),
            ));
        }
        if geocoder.timeout_secs == 0 {
            return Err(Error::Config("geocoder.timeout_secs must be > 0".to_string()));
        }
        if geocoder.min_interval_ms == 0 {
            return Err(Error::Config("geocoder.min_interval_ms must be > 0".to_string()));
        }
        if geocoder.source.trim().is_empty() {
            return Err(Error::Config("geocoder.source must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    pub fn cache_scope(&self) -> i64 {
        self.cache_scope.unwrap_or(0)
    }
}

/// Parse and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Load the config file from the explicit path, else the platform default
///
/// An explicit path that does not exist is an error; a missing default file
/// falls back to built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        _ => Ok(TomlConfig::default()),
    }
}

/// Resolve the database path: CLI/ENV → TOML → platform default
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_data_dir().join("geo.db")
}

/// `<config_dir>/geo-resolver/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib/geo-resolver"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\geo-resolver"))
    } else {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./geo_resolver_data"))
    }
}
