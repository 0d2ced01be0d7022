//! Core data models for Skycast
//!
//! This module contains the weather model parsed from the upstream provider,
//! the measurement units it is requested in, and the city-name rules shared by
//! validation and cache-key normalization.

pub mod weather;

pub use weather::{parse_weather, WeatherClient, WeatherError, OPENWEATHER_BASE_URL};

/// Longest city name accepted from a form submission
pub const MAX_CITY_LEN: usize = 85;

/// Current weather conditions for a city
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    /// City name as reported by the provider
    pub city: String,
    /// Temperature in the requested units
    pub temperature: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed (m/s for metric and standard, mph for imperial)
    pub wind_speed: f64,
    /// Visibility in metres
    pub visibility_m: u32,
    /// Human-readable condition, e.g. "light rain"
    pub condition: String,
    /// Provider icon code, e.g. "10d"
    pub icon: String,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: u8,
}

/// Measurement units requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    /// Kelvin, m/s
    Standard,
    /// Celsius, m/s
    #[default]
    Metric,
    /// Fahrenheit, mph
    Imperial,
}

impl Units {
    /// Parses a units name, case-insensitively
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "kelvin" => Some(Units::Standard),
            "metric" | "celsius" => Some(Units::Metric),
            "imperial" | "fahrenheit" => Some(Units::Imperial),
            _ => None,
        }
    }

    /// Value of the provider's `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Suffix shown after a temperature
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Standard => "K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    /// Suffix shown after a wind speed
    pub fn wind_symbol(&self) -> &'static str {
        match self {
            Units::Standard | Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

/// Returns true if `c` may appear in a city name
fn is_city_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, ' ' | '.' | '\'' | '-' | ',')
}

/// Checks that a trimmed city name is plausible before it is sent upstream
///
/// Names must start with a letter, contain only letters, spaces and `.',-`,
/// and be at most `MAX_CITY_LEN` characters long.
pub fn is_valid_city(city: &str) -> bool {
    let city = city.trim();
    city.chars().next().is_some_and(char::is_alphabetic)
        && city.chars().count() <= MAX_CITY_LEN
        && city.chars().all(is_city_char)
}

/// Builds the cache key for a city: trimmed, inner whitespace collapsed, lower-cased
pub fn normalize_city(city: &str) -> String {
    city.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
