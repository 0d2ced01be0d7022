//! Weather lookups backed by the expiring cache
//!
//! `WeatherService` is the only caller of the cache. It validates the city,
//! serves fresh cached responses, refetches missing or stale ones, and maps
//! failures to the messages shown on the page.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, ExpiringCache};
use crate::data::{
    is_valid_city, normalize_city, parse_weather, Units, Weather, WeatherClient, WeatherError,
};

/// Errors surfaced to the user for a lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// No city was entered
    #[error("Please enter a city name")]
    EmptyCity,

    /// The city contains characters a city name cannot have
    #[error("Please enter a valid city name")]
    InvalidCity,

    /// The weather provider could not be reached
    #[error("Unable to reach the weather service. Please try again later.")]
    Network(#[source] WeatherError),

    /// The provider rejected the city or returned something we could not read
    #[error("City not found or error in fetching data: {0}")]
    Application(#[source] WeatherError),
}

/// Where the data for a lookup came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Fresh cache entry
    Cache,
    /// No cache entry; fetched from the provider
    Fetched,
    /// Stale cache entry replaced by a new fetch
    Refreshed,
    /// Stale cache entry served because the provider was unreachable
    StaleFallback,
}

/// Result of a successful lookup
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    pub weather: Weather,
    pub source: LookupSource,
}

/// Looks up current weather, going to the provider only when the cache cannot answer
#[derive(Debug, Clone)]
pub struct WeatherService {
    client: WeatherClient,
    cache: Arc<ExpiringCache>,
}

impl WeatherService {
    /// Creates a service over an existing client and cache
    pub fn new(client: WeatherClient, cache: Arc<ExpiringCache>) -> Self {
        Self { client, cache }
    }

    /// The cache this service reads and writes
    pub fn cache(&self) -> &Arc<ExpiringCache> {
        &self.cache
    }

    /// Units the weather values are expressed in
    pub fn units(&self) -> Units {
        self.client.units()
    }

    /// Looks up current weather for a user-supplied city name
    ///
    /// # Behavior
    /// - Empty or malformed names fail without contacting the provider
    /// - A fresh cache entry is parsed and returned
    /// - A missing or stale entry is refetched and the cache overwritten
    /// - If the provider is unreachable and a stale entry exists, the stale
    ///   entry is returned instead of an error; upstream rejections and
    ///   unreadable answers are reported as they are
    pub async fn lookup(&self, city: &str) -> Result<WeatherLookup, LookupError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(LookupError::EmptyCity);
        }
        if !is_valid_city(city) {
            debug!(city, "rejected city name");
            return Err(LookupError::InvalidCity);
        }

        let key = normalize_city(city);
        let cached = self.cache.get(&key);

        if let Some(entry) = cached.as_ref().filter(|e| !self.cache.is_stale(e)) {
            match parse_weather(&entry.payload) {
                Ok(weather) => {
                    debug!(key = %key, "cache hit");
                    return Ok(WeatherLookup {
                        weather,
                        source: LookupSource::Cache,
                    });
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "cached payload unreadable, refetching")
                }
            }
        }

        match self.client.fetch_raw(city).await {
            Ok(body) => {
                let weather = parse_weather(&body).map_err(|err| {
                    warn!(city, error = %err, "unreadable weather response");
                    LookupError::Application(err)
                })?;
                self.cache.put(key.clone(), body);

                let source = if cached.is_some() {
                    LookupSource::Refreshed
                } else {
                    LookupSource::Fetched
                };
                info!(key = %key, ?source, "fetched current weather");
                Ok(WeatherLookup { weather, source })
            }
            Err(err) if err.is_network() => match cached.as_ref().and_then(stale_fallback) {
                Some(weather) => {
                    warn!(key = %key, error = %err, "weather service unreachable, serving stale entry");
                    Ok(WeatherLookup {
                        weather,
                        source: LookupSource::StaleFallback,
                    })
                }
                None => {
                    error!(city, error = %err, "weather service unreachable");
                    Err(LookupError::Network(err))
                }
            },
            Err(err) => {
                warn!(city, error = %err, "weather lookup failed");
                Err(LookupError::Application(err))
            }
        }
    }
}

fn stale_fallback(entry: &CacheEntry) -> Option<Weather> {
    parse_weather(&entry.payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::time::Duration as StdDuration;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LONDON_RESPONSE: &str = r#"{
        "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
        "main": {"temp": 11.62, "humidity": 81},
        "visibility": 10000,
        "wind": {"speed": 4.12},
        "clouds": {"all": 75},
        "name": "London",
        "cod": 200
    }"#;

    const LONDON_LATER_RESPONSE: &str = r#"{
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 14.0, "humidity": 60},
        "visibility": 10000,
        "wind": {"speed": 2.0},
        "clouds": {"all": 0},
        "name": "London",
        "cod": 200
    }"#;

    fn create_service(base_url: &str, window: Duration) -> WeatherService {
        let client = WeatherClient::new("test-key").with_base_url(base_url);
        WeatherService::new(client, Arc::new(ExpiringCache::new(window)))
    }

    async fn mount_london(server: &MockServer, body: &str, calls: u64) {
        Mock::given(method("GET"))
            .and(query_param("q", "London"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_empty_city_is_rejected_without_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let service = create_service(&server.uri(), Duration::minutes(30));

        let err = service.lookup("   ").await.expect_err("Empty city should fail");

        assert!(matches!(err, LookupError::EmptyCity));
        assert_eq!(err.to_string(), "Please enter a city name");
    }

    #[tokio::test]
    async fn test_malformed_city_is_rejected_without_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let service = create_service(&server.uri(), Duration::minutes(30));

        let err = service
            .lookup("London&appid=other")
            .await
            .expect_err("Malformed city should fail");

        assert!(matches!(err, LookupError::InvalidCity));
    }

    #[tokio::test]
    async fn test_first_lookup_fetches_and_caches() {
        let server = MockServer::start().await;
        mount_london(&server, LONDON_RESPONSE, 1).await;
        let service = create_service(&server.uri(), Duration::minutes(30));

        let lookup = service.lookup("London").await.expect("Lookup should succeed");

        assert_eq!(lookup.source, LookupSource::Fetched);
        assert_eq!(lookup.weather.city, "London");
        let entry = service.cache().get("london").expect("Response should be cached");
        assert_eq!(entry.payload, LONDON_RESPONSE);
    }

    #[tokio::test]
    async fn test_repeat_lookup_within_window_uses_cache() {
        let server = MockServer::start().await;
        mount_london(&server, LONDON_RESPONSE, 1).await;
        let service = create_service(&server.uri(), Duration::minutes(30));

        service.lookup("London").await.expect("First lookup should succeed");
        let second = service
            .lookup("  london ")
            .await
            .expect("Second lookup should succeed");

        assert_eq!(second.source, LookupSource::Cache);
        assert!((second.weather.temperature - 11.62).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched_and_overwritten() {
        let server = MockServer::start().await;
        mount_london(&server, LONDON_LATER_RESPONSE, 1).await;
        let service = create_service(&server.uri(), Duration::zero());
        service.cache().put("london", LONDON_RESPONSE);

        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let lookup = service.lookup("London").await.expect("Lookup should succeed");

        assert_eq!(lookup.source, LookupSource::Refreshed);
        assert_eq!(lookup.weather.condition, "clear sky");
        let entry = service.cache().get("london").expect("Entry should be present");
        assert_eq!(entry.payload, LONDON_LATER_RESPONSE);
    }

    #[tokio::test]
    async fn test_unknown_city_is_application_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
            )
            .mount(&server)
            .await;
        let service = create_service(&server.uri(), Duration::minutes(30));

        let err = service.lookup("Atlantis").await.expect_err("Lookup should fail");

        assert!(matches!(err, LookupError::Application(_)));
        assert_eq!(
            err.to_string(),
            "City not found or error in fetching data: city not found"
        );
        assert!(service.cache().is_empty(), "Errors should not be cached");
    }

    #[tokio::test]
    async fn test_unparseable_response_is_application_error_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let service = create_service(&server.uri(), Duration::minutes(30));

        let err = service.lookup("London").await.expect_err("Lookup should fail");

        assert!(matches!(err, LookupError::Application(WeatherError::ParseError(_))));
        assert!(service.cache().get("london").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        let service = create_service("http://127.0.0.1:1/weather", Duration::minutes(30));

        let err = service.lookup("London").await.expect_err("Lookup should fail");

        assert!(matches!(err, LookupError::Network(_)));
        assert_eq!(
            err.to_string(),
            "Unable to reach the weather service. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_serves_stale_entry() {
        let service = create_service("http://127.0.0.1:1/weather", Duration::zero());
        service.cache().put("london", LONDON_RESPONSE);

        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let lookup = service.lookup("London").await.expect("Stale entry should be served");

        assert_eq!(lookup.source, LookupSource::StaleFallback);
        assert_eq!(lookup.weather.condition, "light rain");
    }

    #[tokio::test]
    async fn test_stale_entry_is_not_served_for_unknown_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"cod":"404","message":"city not found"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        let service = create_service(&server.uri(), Duration::zero());
        service.cache().put("london", LONDON_RESPONSE);

        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let err = service
            .lookup("London")
            .await
            .expect_err("Upstream rejection should not fall back to stale data");

        assert!(matches!(err, LookupError::Application(_)));
        assert!(err.to_string().contains("city not found"));
        let entry = service.cache().get("london").expect("Stale entry should remain");
        assert_eq!(entry.payload, LONDON_RESPONSE);
    }

    #[tokio::test]
    async fn test_malformed_endpoint_is_application_error() {
        let service = create_service("not a url", Duration::zero());
        service.cache().put("london", LONDON_RESPONSE);

        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let err = service
            .lookup("London")
            .await
            .expect_err("A broken endpoint should not fall back to stale data");

        assert!(matches!(err, LookupError::Application(_)));
        assert!(!err.to_string().contains("Unable to reach"));
    }

    #[tokio::test]
    async fn test_unreadable_fresh_entry_is_refetched() {
        let server = MockServer::start().await;
        mount_london(&server, LONDON_RESPONSE, 1).await;
        let service = create_service(&server.uri(), Duration::minutes(30));
        service.cache().put("london", "not json");

        let lookup = service.lookup("London").await.expect("Lookup should succeed");

        assert_eq!(lookup.source, LookupSource::Refreshed);
        assert_eq!(
            service.cache().get("london").map(|e| e.payload),
            Some(LONDON_RESPONSE.to_string())
        );
    }
}
