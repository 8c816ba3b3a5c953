//! Configuration management for `TripWeave` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings. Missing API
//! credentials are reported as warnings, never as startup failures: the
//! planner runs in a degraded mode with locally generated fallback data.

use crate::TripWeaveError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Root configuration structure for the `TripWeave` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TripWeaveConfig {
    /// Generative itinerary API configuration
    #[serde(default)]
    pub generative: GenerativeConfig,
    /// Location lookup / mapping provider configuration
    #[serde(default)]
    pub map: MapConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generative itinerary API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
    /// API key for the completion service
    pub api_key: Option<String>,
    /// Application ID embedded in the completion endpoint path
    pub app_id: Option<String>,
    /// Base URL for the completion service
    #[serde(default = "default_generative_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Location lookup provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Mapping provider API key (optional, search works without one)
    pub api_key: Option<String>,
    /// Base URL for the place search endpoint
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_generative_base_url() -> String {
    "https://dashscope.aliyuncs.com/api/v1/apps".to_string()
}

fn default_search_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            app_id: None,
            base_url: default_generative_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_base_url: default_search_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TripWeaveConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides with TRIPWEAVE_ prefix, e.g.
        // TRIPWEAVE_GENERATIVE__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("TRIPWEAVE")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: TripWeaveConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;
        config.warn_missing_credentials();

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripweave").join("config.toml"))
    }

    /// True when a generative completion can actually be requested
    #[must_use]
    pub fn has_generative_credentials(&self) -> bool {
        self.generative.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.generative.app_id.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Log a warning for every missing credential. Absence is not fatal:
    /// the planner degrades to locally generated itineraries.
    pub fn warn_missing_credentials(&self) {
        if self.generative.api_key.is_none() {
            warn!("No generative API key configured (TRIPWEAVE_GENERATIVE__API_KEY); planning will use fallback itineraries");
        }
        if self.generative.app_id.is_none() {
            warn!("No generative app ID configured (TRIPWEAVE_GENERATIVE__APP_ID); planning will use fallback itineraries");
        }
        if self.map.api_key.is_none() {
            warn!("No mapping API key configured (TRIPWEAVE_MAP__API_KEY); place search runs without one");
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.generative.timeout_seconds == 0 || self.generative.timeout_seconds > 300 {
            return Err(TripWeaveError::config(
                "Generative API timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.map.timeout_seconds == 0 || self.map.timeout_seconds > 300 {
            return Err(
                TripWeaveError::config("Map API timeout must be between 1 and 300 seconds").into(),
            );
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripWeaveError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripWeaveError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (label, url) in [
            ("Generative API", &self.generative.base_url),
            ("Map search", &self.map.search_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripWeaveError::config(format!(
                    "{label} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
