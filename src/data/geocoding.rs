//! Open-Meteo geocoding client
//!
//! Resolves a free-text city name to coordinates. Only the best match is used.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Base URL for the Open-Meteo geocoding API
pub const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Language requested for place names
pub const DEFAULT_LANGUAGE: &str = "en";

/// A resolved place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Place name as reported by the API
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    /// First-level administrative region
    pub region: Option<String>,
}

/// Errors that can occur when geocoding a city name
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Geocoding API returned status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// No place matched the query
    #[error("City \"{0}\" not found")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

/// Client for the forward geocoding endpoint
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    language: String,
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingClient {
    /// Create a new GeocodingClient against the public endpoint
    pub fn new() -> Self {
        Self::with_base_url(Client::new(), GEOCODING_BASE_URL)
    }

    /// Create a client for a custom endpoint (used by config and tests)
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Set the language used for place names
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Resolve a city name to its best-matching coordinates
    pub async fn resolve(&self, city: &str) -> Result<Coordinates, GeocodingError> {
        debug!(city, "geocoding city");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("name", city), ("count", "1"), ("language", self.language.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodingError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        parse_response(&text, city)
    }
}

fn parse_response(text: &str, city: &str) -> Result<Coordinates, GeocodingError> {
    let parsed: GeocodingResponse = serde_json::from_str(text)?;
    let first = parsed
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodingError::NotFound(city.to_string()))?;

    Ok(Coordinates {
        name: first.name,
        latitude: first.latitude,
        longitude: first.longitude,
        country: first.country,
        region: first.admin1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LVIV_RESPONSE: &str = r#"{
        "results": [
            {
                "id": 702550,
                "name": "Lviv",
                "latitude": 49.83826,
                "longitude": 24.02324,
                "country": "Ukraine",
                "admin1": "Lviv Oblast"
            }
        ],
        "generationtime_ms": 0.8
    }"#;

    #[test]
    fn test_parse_first_result() {
        let coords = parse_response(LVIV_RESPONSE, "lviv").unwrap();
        assert_eq!(coords.name, "Lviv");
        assert!((coords.latitude - 49.83826).abs() < 1e-6);
        assert_eq!(coords.country.as_deref(), Some("Ukraine"));
        assert_eq!(coords.region.as_deref(), Some("Lviv Oblast"));
    }

    #[test]
    fn test_parse_missing_results_is_not_found() {
        let err = parse_response(r#"{"generationtime_ms": 0.2}"#, "Atlantis").unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound(ref c) if c == "Atlantis"));
        assert!(err.to_string().contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_resolve_sends_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Lviv"))
            .and(query_param("count", "1"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LVIV_RESPONSE))
            .mount(&server)
            .await;

        let client =
            GeocodingClient::with_base_url(Client::new(), format!("{}/v1/search", server.uri()));
        let coords = client.resolve("Lviv").await.unwrap();
        assert_eq!(coords.name, "Lviv");
    }

    #[tokio::test]
    async fn test_resolve_uses_configured_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("language", "uk"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LVIV_RESPONSE))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(Client::new(), server.uri()).with_language("uk");
        assert!(client.resolve("Lviv").await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_reports_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(Client::new(), server.uri());
        let err = client.resolve("Lviv").await.unwrap_err();
        assert!(matches!(err, GeocodingError::Status(503)));
    }
}
