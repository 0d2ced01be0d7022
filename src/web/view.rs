//! Weather page rendering
//!
//! The page is built from a flat `WeatherView`: the form is always shown, and
//! below it either the current conditions or a single error message.

use chrono::{DateTime, Local};

use crate::data::{Units, Weather};

/// Date shown above the conditions, e.g. "Saturday, October 17, 2026"
const DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Time shown above the conditions, e.g. "3:05 PM"
const TIME_FORMAT: &str = "%-I:%M %p";

/// Values shown on the weather page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherView {
    pub city: String,
    pub temperature: i64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub visibility_km: u32,
    pub condition: String,
    pub icon: String,
    pub cloud_cover: u8,
    pub date: String,
    pub time: String,
    pub temperature_unit: &'static str,
    pub wind_unit: &'static str,
    /// True when the view carries weather values
    pub weather_data: bool,
    pub error: Option<String>,
}

impl WeatherView {
    /// The empty form
    pub fn empty() -> Self {
        Self::default()
    }

    /// A page showing only an error message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// A page showing `weather` as of `now`
    ///
    /// `city` is the name the user entered; the provider's own name is used
    /// only when that is blank.
    pub fn from_weather(city: &str, weather: &Weather, units: Units, now: DateTime<Local>) -> Self {
        let city = match city.trim() {
            "" => weather.city.clone(),
            entered => entered.to_string(),
        };

        Self {
            city,
            temperature: round_half_up(weather.temperature),
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
            visibility_km: weather.visibility_m / 1000,
            condition: weather.condition.clone(),
            icon: weather.icon.clone(),
            cloud_cover: weather.cloud_cover,
            date: now.format(DATE_FORMAT).to_string(),
            time: now.format(TIME_FORMAT).to_string(),
            temperature_unit: units.temperature_symbol(),
            wind_unit: units.wind_symbol(),
            weather_data: true,
            error: None,
        }
    }
}

/// Rounds to the nearest integer, with halves going towards positive infinity
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Escapes text for use inside HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the full weather page
pub fn render_page(view: &WeatherView) -> String {
    let mut body = String::new();

    if let Some(error) = &view.error {
        body.push_str(&format!(
            "    <p class=\"error\" role=\"alert\">{}</p>\n",
            escape_html(error)
        ));
    }

    if view.weather_data {
        body.push_str(&render_conditions(view));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Skycast</title>
  <style>
    body {{ font-family: sans-serif; max-width: 32rem; margin: 2rem auto; }}
    .error {{ color: #b00020; }}
    .conditions dt {{ font-weight: bold; }}
  </style>
</head>
<body>
  <main>
    <h1>Skycast</h1>
    <form method="post" action="/weather">
      <label for="city">City</label>
      <input id="city" name="city" type="text" value="{city}" placeholder="Enter a city name">
      <button type="submit">Search</button>
    </form>
{body}  </main>
</body>
</html>
"#,
        city = escape_html(&view.city),
        body = body,
    )
}

fn render_conditions(view: &WeatherView) -> String {
    format!(
        r#"    <section class="conditions">
      <h2>{city}</h2>
      <p class="date">{date}</p>
      <p class="time">{time}</p>
      <img src="https://openweathermap.org/img/wn/{icon}@2x.png" alt="{condition}">
      <p class="temperature">{temperature}{temperature_unit}</p>
      <p class="condition">{condition}</p>
      <dl>
        <dt>Humidity</dt><dd>{humidity}%</dd>
        <dt>Wind speed</dt><dd>{wind_speed} {wind_unit}</dd>
        <dt>Visibility</dt><dd>{visibility} km</dd>
        <dt>Cloud cover</dt><dd>{cloud_cover}%</dd>
      </dl>
    </section>
"#,
        city = escape_html(&view.city),
        date = escape_html(&view.date),
        time = escape_html(&view.time),
        icon = escape_html(&view.icon),
        condition = escape_html(&view.condition),
        temperature = view.temperature,
        temperature_unit = view.temperature_unit,
        humidity = view.humidity,
        wind_speed = view.wind_speed,
        wind_unit = view.wind_unit,
        visibility = view.visibility_km,
        cloud_cover = view.cloud_cover,
    )
}
