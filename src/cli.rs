//! Command-line interface parsing for Skycast
//!
//! This module handles parsing of CLI arguments using clap. Every option can
//! also come from the environment (or a `.env` file loaded before parsing), and
//! the parsed values are checked and turned into a `StartupConfig`.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration as StdDuration;

use chrono::Duration;
use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::cache::DEFAULT_FRESHNESS_MINUTES;
use crate::data::{Units, OPENWEATHER_BASE_URL};
use crate::logging::{LogFormat, LoggingConfig};

/// Placeholder credential used when no API key is configured.
///
/// Requests made with it are rejected by the provider; it exists so the
/// service starts in development without extra setup. Never deploy with it.
pub const DEV_API_KEY: &str = "YOUR_OPENWEATHERMAP_API_KEY";

/// Longest accepted freshness window (one year)
pub const MAX_FRESHNESS_MINUTES: i64 = 525_600;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The units name is not recognized
    #[error("Invalid units: '{0}'. Valid units: standard, metric, imperial")]
    InvalidUnits(String),

    /// The log format name is not recognized
    #[error("Invalid log format: '{0}'. Valid formats: pretty, json")]
    InvalidLogFormat(String),

    /// The host is not an IP address
    #[error("Invalid host: '{0}'. Expected an IP address such as 127.0.0.1")]
    InvalidHost(String),

    /// The freshness window must be positive and representable
    #[error("Invalid freshness window: {0} minutes. Must be between 1 and {max}", max = MAX_FRESHNESS_MINUTES)]
    InvalidFreshness(i64),

    /// The request timeout must be positive
    #[error("Invalid timeout: {0} seconds. Must be at least 1")]
    InvalidTimeout(u64),

    /// The endpoint is not an absolute http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an http or https URL")]
    InvalidBaseUrl(String),

    /// The API key was set to an empty string
    #[error("API key must not be empty")]
    EmptyApiKey,
}

/// Skycast - current weather for any city, served as a web page
#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Current weather lookup web service")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "SKYCAST_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SKYCAST_PORT", default_value_t = 8080)]
    pub port: u16,

    /// OpenWeatherMap API key
    #[arg(
        long,
        env = "OPENWEATHER_API_KEY",
        default_value = DEV_API_KEY,
        hide_env_values = true,
        hide_default_value = true
    )]
    pub api_key: String,

    /// Current-weather endpoint
    #[arg(long, env = "OPENWEATHER_BASE_URL", default_value = OPENWEATHER_BASE_URL)]
    pub base_url: String,

    /// Units for temperature and wind speed: standard, metric, imperial
    #[arg(long, env = "SKYCAST_UNITS", default_value = "metric")]
    pub units: String,

    /// Minutes a cached response stays fresh
    #[arg(long, env = "SKYCAST_FRESHNESS_MINUTES", default_value_t = DEFAULT_FRESHNESS_MINUTES)]
    pub freshness_minutes: i64,

    /// Upstream request timeout in seconds
    #[arg(long, env = "SKYCAST_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log output format: pretty, json
    #[arg(long, env = "SKYCAST_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Socket address to bind
    pub addr: SocketAddr,
    /// Provider credential
    pub api_key: String,
    /// Current-weather endpoint
    pub base_url: String,
    /// Units requested from the provider
    pub units: Units,
    /// How long a cached response stays fresh
    pub freshness: Duration,
    /// Upstream request timeout
    pub timeout: StdDuration,
    /// Logging setup
    pub logging: LoggingConfig,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if any value is out of range or unrecognized
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let ip: IpAddr = cli
            .host
            .parse()
            .map_err(|_| CliError::InvalidHost(cli.host.clone()))?;

        let units =
            Units::from_str(&cli.units).ok_or_else(|| CliError::InvalidUnits(cli.units.clone()))?;

        let format = LogFormat::from_str(&cli.log_format)
            .ok_or_else(|| CliError::InvalidLogFormat(cli.log_format.clone()))?;

        if !(1..=MAX_FRESHNESS_MINUTES).contains(&cli.freshness_minutes) {
            return Err(CliError::InvalidFreshness(cli.freshness_minutes));
        }
        let freshness = Duration::try_minutes(cli.freshness_minutes)
            .ok_or(CliError::InvalidFreshness(cli.freshness_minutes))?;

        match Url::parse(&cli.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(CliError::InvalidBaseUrl(cli.base_url.clone())),
        }

        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout(cli.timeout_secs));
        }

        let api_key = cli.api_key.trim();
        if api_key.is_empty() {
            return Err(CliError::EmptyApiKey);
        }

        Ok(StartupConfig {
            addr: SocketAddr::new(ip, cli.port),
            api_key: api_key.to_string(),
            base_url: cli.base_url.clone(),
            units,
            freshness,
            timeout: StdDuration::from_secs(cli.timeout_secs),
            logging: LoggingConfig {
                level: cli.log_level.clone(),
                format,
            },
        })
    }

    /// Returns true when running on the development placeholder key
    pub fn uses_dev_api_key(&self) -> bool {
        self.api_key == DEV_API_KEY
    }
}
