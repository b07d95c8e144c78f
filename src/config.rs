//! Configuration for triplog
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (`~/.config/triplog/` on Linux)
//! 3. Environment variables (`TRIPLOG_DATA_DIR`, `TRIPLOG_PAGE_SIZE`)
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::countries::REST_COUNTRIES_BASE_URL;
use crate::data::geocoding::{DEFAULT_LANGUAGE, GEOCODING_BASE_URL};
use crate::data::weather::OPEN_METEO_BASE_URL;
use crate::data::world_time::TIME_API_BASE_URL;
use crate::data::DEFAULT_PAGE_SIZE;

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default time-to-live for cached weather lookups (10 minutes)
pub const DEFAULT_WEATHER_TTL_SECS: u64 = 600;

/// Default timeout for API health probes
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 3;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// An environment variable has an unusable value
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    /// No home directory to derive default paths from
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// Base URLs of the remote APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    pub rest_countries: String,
    pub open_meteo: String,
    pub geocoding: String,
    pub time_api: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            rest_countries: REST_COUNTRIES_BASE_URL.to_string(),
            open_meteo: OPEN_METEO_BASE_URL.to_string(),
            geocoding: GEOCODING_BASE_URL.to_string(),
            time_api: TIME_API_BASE_URL.to_string(),
        }
    }
}

/// On-disk shape of `config.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    page_size: Option<usize>,
    weather_cache_ttl_secs: Option<u64>,
    health_timeout_secs: Option<u64>,
    language: Option<String>,
    endpoints: Option<ApiEndpoints>,
}

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the stored documents and the log file
    pub data_dir: PathBuf,
    /// Routes shown per page
    pub page_size: usize,
    /// How long a weather lookup stays in the cache
    pub weather_cache_ttl: Duration,
    /// Timeout for each API health probe
    pub health_timeout: Duration,
    /// Language for geocoded place names
    pub language: String,
    pub endpoints: ApiEndpoints,
}

impl Config {
    /// Defaults rooted at the given data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            page_size: DEFAULT_PAGE_SIZE,
            weather_cache_ttl: Duration::from_secs(DEFAULT_WEATHER_TTL_SECS),
            health_timeout: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
            language: DEFAULT_LANGUAGE.to_string(),
            endpoints: ApiEndpoints::default(),
        }
    }

    /// Load configuration from the platform config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "triplog");
        let config_path = dirs.as_ref().map(|d| d.config_dir().join(CONFIG_FILE));
        let default_data_dir = dirs.as_ref().map(|d| d.data_dir().to_path_buf());
        Self::load_from(
            config_path.as_deref(),
            default_data_dir,
            |name| std::env::var(name).ok(),
        )
    }

    /// Load configuration from an explicit file path and environment lookup
    pub fn load_from(
        config_path: Option<&Path>,
        default_data_dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) if path.exists() => read_file_config(path)?,
            _ => FileConfig::default(),
        };

        let env_data_dir = env("TRIPLOG_DATA_DIR").map(PathBuf::from);
        let data_dir = env_data_dir
            .or(file.data_dir)
            .or(default_data_dir)
            .ok_or(ConfigError::NoDataDir)?;

        let mut config = Self::with_data_dir(data_dir);
        if let Some(size) = file.page_size {
            config.page_size = size;
        }
        if let Some(secs) = file.weather_cache_ttl_secs {
            config.weather_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = file.health_timeout_secs {
            config.health_timeout = Duration::from_secs(secs);
        }
        if let Some(language) = file.language {
            config.language = language;
        }
        if let Some(endpoints) = file.endpoints {
            config.endpoints = endpoints;
        }

        if let Some(value) = env("TRIPLOG_PAGE_SIZE") {
            config.page_size = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "TRIPLOG_PAGE_SIZE",
                value: value.clone(),
            })?;
        }

        // A zero page size would make every page empty
        config.page_size = config.page_size.max(1);
        Ok(config)
    }

    /// Path of the log file inside the data directory
    pub fn log_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}
