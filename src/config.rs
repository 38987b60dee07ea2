//! Configuration loader for the `codemetal-waterflow` dashboard service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, time::Duration};

use anyhow::{anyhow, Result};

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Parse an optional string environment variable with a default value.
macro_rules! optional_env {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

pub const DEFAULT_GEO_API_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_HISTORY_PATH: &str = "water-footprint-history.json";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Base URL of the sensor and footprint backend.
    pub api_base_url: String,

    /// Geolocation lookup endpoint returning `{city, country_name?}`.
    pub geo_api_url: String,

    /// Base URL of the current-conditions and forecast weather service.
    pub weather_api_url: String,

    /// Weather service key; `None` means the weather panel shows mock data.
    pub weather_api_key: Option<String>,

    /// File backing the durable history store.
    pub history_path: String,

    /// Port the dashboard service listens on.
    pub listen_port: u16,

    pub clock_interval: Duration,
    pub sensor_poll_interval: Duration,
    pub chart_resync_interval: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `API_BASE_URL` – sensor and footprint backend base URL
///
/// Optional:
/// - `GEO_API_URL` – geolocation lookup (default: `https://ipapi.co/json/`)
/// - `WEATHER_API_URL` – weather service base (default: OpenWeather 2.5)
/// - `WEATHER_API_KEY` – weather service key (default: unset)
/// - `HISTORY_PATH` – history store file (default: `water-footprint-history.json`)
/// - `LISTEN_PORT` – HTTP port (default: 8080)
/// - `CLOCK_INTERVAL_SECS` – clock refresh period (default: 1)
/// - `SENSOR_POLL_SECS` – sensor poll period (default: 5)
/// - `CHART_RESYNC_SECS` – full chart redraw period (default: 30)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_base_url = require_env!("API_BASE_URL");
    let geo_api_url = optional_env!("GEO_API_URL", DEFAULT_GEO_API_URL);
    let weather_api_url = optional_env!("WEATHER_API_URL", DEFAULT_WEATHER_API_URL);
    let weather_api_key = env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty());
    let history_path = optional_env!("HISTORY_PATH", DEFAULT_HISTORY_PATH);
    let listen_port = parse_env!("LISTEN_PORT", u16, 8080);
    let clock_secs = parse_env!("CLOCK_INTERVAL_SECS", u64, 1);
    let sensor_secs = parse_env!("SENSOR_POLL_SECS", u64, 5);
    let resync_secs = parse_env!("CHART_RESYNC_SECS", u64, 30);

    for (name, secs) in [
        ("CLOCK_INTERVAL_SECS", clock_secs),
        ("SENSOR_POLL_SECS", sensor_secs),
        ("CHART_RESYNC_SECS", resync_secs),
    ] {
        if secs == 0 {
            return Err(anyhow!("Invalid {}: interval must be positive", name));
        }
    }

    Ok(Config {
        api_base_url: api_base_url.trim_end_matches('/').to_string(),
        geo_api_url,
        weather_api_url: weather_api_url.trim_end_matches('/').to_string(),
        weather_api_key,
        history_path,
        listen_port,
        clock_interval: Duration::from_secs(clock_secs),
        sensor_poll_interval: Duration::from_secs(sensor_secs),
        chart_resync_interval: Duration::from_secs(resync_secs),
    })
}

impl Config {
    /// Configuration pointing every upstream at `api_base_url`, with default
    /// intervals and no weather key. Used by tests and local demos.
    pub fn local(api_base_url: impl Into<String>) -> Self {
        // ---
        Config {
            api_base_url: api_base_url.into(),
            geo_api_url: DEFAULT_GEO_API_URL.to_string(),
            weather_api_url: DEFAULT_WEATHER_API_URL.to_string(),
            weather_api_key: None,
            history_path: DEFAULT_HISTORY_PATH.to_string(),
            listen_port: 8080,
            clock_interval: Duration::from_secs(1),
            sensor_poll_interval: Duration::from_secs(5),
            chart_resync_interval: Duration::from_secs(30),
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the weather API key while showing all other configuration
    /// values that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_key = match &self.weather_api_key {
            Some(key) if key.chars().count() > 4 => {
                format!("{}****", key.chars().take(4).collect::<String>())
            }
            Some(_) => "****".to_string(),
            None => "(unset, weather uses mock data)".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  API_BASE_URL        : {}", self.api_base_url);
        tracing::info!("  GEO_API_URL         : {}", self.geo_api_url);
        tracing::info!("  WEATHER_API_URL     : {}", self.weather_api_url);
        tracing::info!("  WEATHER_API_KEY     : {}", masked_key);
        tracing::info!("  HISTORY_PATH        : {}", self.history_path);
        tracing::info!("  LISTEN_PORT         : {}", self.listen_port);
        tracing::info!("  CLOCK_INTERVAL_SECS : {}", self.clock_interval.as_secs());
        tracing::info!("  SENSOR_POLL_SECS    : {}", self.sensor_poll_interval.as_secs());
        tracing::info!("  CHART_RESYNC_SECS   : {}", self.chart_resync_interval.as_secs());
    }
}
