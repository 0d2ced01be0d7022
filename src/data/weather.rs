//! OpenWeatherMap current-weather API client
//!
//! This module fetches raw current-weather responses from OpenWeatherMap and
//! parses them into our `Weather` data structure. Fetching and parsing are kept
//! separate so the raw body can be cached and parsed again on a cache hit.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{Units, Weather};

/// Base URL for the OpenWeatherMap current-weather endpoint
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provider could not be reached (connection refused, DNS, timeout)
    #[error("Weather service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The request could not be built or its response could not be read
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            WeatherError::Unreachable(err)
        } else {
            WeatherError::RequestFailed(err)
        }
    }
}

impl WeatherError {
    /// Returns true when the provider could not be reached at all
    ///
    /// Malformed requests, redirect loops and unreadable bodies are not
    /// network failures; they are reported like any other bad answer.
    pub fn is_network(&self) -> bool {
        matches!(self, WeatherError::Unreachable(_))
    }
}

/// Client for fetching weather data from OpenWeatherMap
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
    units: Units,
}

impl WeatherClient {
    /// Create a new WeatherClient with default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: OPENWEATHER_BASE_URL.to_string(),
            units: Units::default(),
        }
    }

    /// Point the client at a different endpoint (used for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request data in the given units
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Units this client requests
    pub fn units(&self) -> Units {
        self.units
    }

    /// Fetch the raw response body for a city
    ///
    /// The city is sent as given; callers validate it first. A non-success
    /// status is turned into `WeatherError::Upstream` carrying the provider's
    /// message, e.g. "city not found".
    pub async fn fetch_raw(&self, city: &str) -> Result<String, WeatherError> {
        debug!(city, units = self.units.as_query(), "requesting current weather");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_query()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status, &text));
        }

        Ok(text)
    }
}

/// Parse an OpenWeatherMap response body into a Weather struct
pub fn parse_weather(body: &str) -> Result<Weather, WeatherError> {
    let response: OpenWeatherResponse = serde_json::from_str(body)?;

    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::MissingField("weather".to_string()))?;

    Ok(Weather {
        city: response.name,
        temperature: response.main.temp,
        humidity: response.main.humidity,
        wind_speed: response.wind.speed,
        visibility_m: response.visibility.unwrap_or_default(),
        condition: condition.description,
        icon: condition.icon,
        cloud_cover: response.clouds.all,
    })
}

/// Build an Upstream error from a non-success response
fn upstream_error(status: StatusCode, body: &str) -> WeatherError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_lowercase()
        });

    WeatherError::Upstream {
        status: status.as_u16(),
        message,
    }
}

/// OpenWeatherMap current-weather response structure
#[derive(Debug, Deserialize)]
struct OpenWeatherResponse {
    #[serde(default)]
    name: String,
    main: MainBlock,
    wind: WindBlock,
    visibility: Option<u32>,
    weather: Vec<ConditionBlock>,
    clouds: CloudBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct CloudBlock {
    all: u8,
}

/// Error body returned by OpenWeatherMap, e.g. `{"cod":"404","message":"city not found"}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}
