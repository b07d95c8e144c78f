//! Open-Meteo weather API client
//!
//! Looks up current conditions for a city name. The lookup is a two-step
//! pipeline: the city is geocoded first, then current weather is fetched for
//! the resulting coordinates. Any failure along the way produces demo weather
//! instead of an error.

use chrono::{Local, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::geocoding::{Coordinates, GeocodingClient, GeocodingError};
use super::Fetched;

/// Base URL for the Open-Meteo API
pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Country label used for demo weather
pub const DEMO_COUNTRY: &str = "Demo";

/// Types of weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Showers,
    Thunderstorm,
    Snow,
    Fog,
}

impl WeatherCondition {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::PartlyCloudy => "Partly cloudy",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Showers => "Showers",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Fog => "Fog",
        }
    }

    /// Icon for display
    pub fn icon(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "\u{2600}",        // ☀
            WeatherCondition::PartlyCloudy => "\u{26C5}", // ⛅
            WeatherCondition::Cloudy => "\u{2601}",       // ☁
            WeatherCondition::Rain => "\u{1F327}",        // 🌧
            WeatherCondition::Showers => "\u{1F326}",     // 🌦
            WeatherCondition::Thunderstorm => "\u{26C8}", // ⛈
            WeatherCondition::Snow => "\u{2744}",         // ❄
            WeatherCondition::Fog => "\u{1F32B}",         // 🌫
        }
    }
}

/// Where a weather report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherSource {
    /// Open-Meteo answered
    Live,
    /// Synthetic placeholder values
    Demo,
}

/// Current weather for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// City name (as resolved, or as typed for demo data)
    pub city: String,
    pub country: String,
    /// Temperature in Celsius, rounded to whole degrees
    pub temperature: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: Option<f64>,
    /// WMO weather code
    pub weather_code: Option<u8>,
    pub condition: WeatherCondition,
    pub description: String,
    /// Observation time, local to the location for live data
    pub observed_at: String,
    pub coordinates: Option<(f64, f64)>,
    pub source: WeatherSource,
}

impl WeatherReport {
    /// Returns true for synthetic placeholder data
    pub fn is_demo(&self) -> bool {
        self.source == WeatherSource::Demo
    }
}

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Weather API returned status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The city could not be resolved
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
}

/// Client for fetching weather data from Open-Meteo API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    geocoder: GeocodingClient,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherClient {
    /// Create a new WeatherClient with default settings
    pub fn new() -> Self {
        let client = Client::new();
        Self {
            geocoder: GeocodingClient::with_base_url(
                client.clone(),
                super::geocoding::GEOCODING_BASE_URL,
            ),
            client,
            base_url: OPEN_METEO_BASE_URL.to_string(),
        }
    }

    /// Create a client for custom weather and geocoding endpoints
    pub fn with_endpoints(
        client: Client,
        weather_url: impl Into<String>,
        geocoding_url: impl Into<String>,
    ) -> Self {
        Self {
            geocoder: GeocodingClient::with_base_url(client.clone(), geocoding_url),
            client,
            base_url: weather_url.into(),
        }
    }

    /// Set the language used when resolving city names
    pub fn with_geocoding_language(mut self, language: impl Into<String>) -> Self {
        self.geocoder = self.geocoder.with_language(language);
        self
    }

    /// Get current weather for a city name
    ///
    /// Never fails: if geocoding or the weather request fails, demo weather
    /// for the typed city is returned as [`Fetched::Fallback`].
    pub async fn get_weather(&self, city: &str) -> Fetched<WeatherReport> {
        info!(city, "fetching weather");
        match self.fetch_live(city).await {
            Ok(report) => Fetched::Live(report),
            Err(e) => {
                warn!(city, error = %e, "weather lookup failed, using demo data");
                Fetched::Fallback {
                    data: demo_weather(city),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch_live(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let coords = self.geocoder.resolve(city).await?;
        let current = self.fetch_current(coords.latitude, coords.longitude).await?;
        Ok(build_report(&coords, current))
    }

    /// Fetch current conditions for the given coordinates
    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<CurrentWeather, WeatherError> {
        let url = format!(
            "{}?latitude={}&longitude={}&current_weather=true&hourly=temperature_2m,relativehumidity_2m&timezone=auto&forecast_days=1",
            self.base_url, lat, lon
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        let api_response: OpenMeteoResponse = serde_json::from_str(&text)?;

        Ok(api_response.current_weather)
    }
}

fn build_report(coords: &Coordinates, current: CurrentWeather) -> WeatherReport {
    WeatherReport {
        city: coords.name.clone(),
        country: coords
            .country
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        temperature: current.temperature.round(),
        wind_speed: current.windspeed,
        wind_direction: current.winddirection,
        weather_code: Some(current.weathercode),
        condition: weather_code_to_condition(current.weathercode),
        description: weather_description(current.weathercode).to_string(),
        observed_at: format_observation_time(&current.time),
        coordinates: Some((coords.latitude, coords.longitude)),
        source: WeatherSource::Live,
    }
}

/// Synthetic weather used when the live lookup fails
pub fn demo_weather(city: &str) -> WeatherReport {
    let mut rng = rand::thread_rng();
    let condition = *[
        WeatherCondition::Clear,
        WeatherCondition::Cloudy,
        WeatherCondition::Rain,
        WeatherCondition::Snow,
    ]
    .choose(&mut rng)
    .unwrap_or(&WeatherCondition::Clear);

    WeatherReport {
        city: city.to_string(),
        country: DEMO_COUNTRY.to_string(),
        temperature: rng.gen_range(-5i32..25) as f64,
        wind_speed: (rng.gen_range(0.0..20.0_f64) * 10.0).floor() / 10.0,
        wind_direction: None,
        weather_code: None,
        condition,
        description: condition.label().to_string(),
        observed_at: Local::now().format("%H:%M:%S").to_string(),
        coordinates: None,
        source: WeatherSource::Demo,
    }
}

/// Open-Meteo returns "2024-07-15T14:00"; show just the clock time
fn format_observation_time(time: &str) -> String {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| time.to_string())
}

/// Map WMO weather code to WeatherCondition enum
///
/// Weather codes from WMO (World Meteorological Organization):
/// - 0: Clear sky
/// - 1-3: Partly cloudy
/// - 45, 48: Fog
/// - 51-55: Drizzle
/// - 56-57: Freezing drizzle
/// - 61-65: Rain
/// - 66-67: Freezing rain
/// - 71-77: Snow
/// - 80-82: Rain showers
/// - 85-86: Snow showers
/// - 95-99: Thunderstorm
pub fn weather_code_to_condition(code: u8) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        1..=2 => WeatherCondition::PartlyCloudy,
        3 => WeatherCondition::Cloudy,
        45 | 48 => WeatherCondition::Fog,
        51..=55 | 61..=65 => WeatherCondition::Rain,
        56..=57 | 66..=67 | 80..=82 => WeatherCondition::Showers,
        71..=77 | 85..=86 => WeatherCondition::Snow,
        95..=99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Cloudy,
    }
}

/// Human description of a WMO weather code
pub fn weather_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        80 => "Rain showers",
        81 => "Heavy rain showers",
        95 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// Open-Meteo API response structure
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current_weather: CurrentWeather,
}

/// Current weather block from Open-Meteo (`current_weather=true`)
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    #[serde(default)]
    pub winddirection: Option<f64>,
    pub weathercode: u8,
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Sample valid Open-Meteo API response
    const VALID_RESPONSE: &str = r#"{
        "latitude": 50.45,
        "longitude": 30.52,
        "generationtime_ms": 0.123,
        "utc_offset_seconds": 10800,
        "timezone": "Europe/Kyiv",
        "elevation": 179.0,
        "current_weather": {
            "time": "2024-07-15T14:00",
            "temperature": 22.6,
            "windspeed": 12.5,
            "winddirection": 270,
            "weathercode": 2,
            "is_day": 1
        }
    }"#;

    const GEOCODE_RESPONSE: &str = r#"{
        "results": [
            {"name": "Kyiv", "latitude": 50.45, "longitude": 30.52, "country": "Ukraine", "admin1": "Kyiv City"}
        ]
    }"#;

    async fn mock_apis() -> (MockServer, WeatherClient) {
        let server = MockServer::start().await;
        let client = WeatherClient::with_endpoints(
            Client::new(),
            format!("{}/v1/forecast", server.uri()),
            format!("{}/v1/search", server.uri()),
        );
        (server, client)
    }

    #[test]
    fn test_weather_code_mapping() {
        assert_eq!(weather_code_to_condition(0), WeatherCondition::Clear);
        assert_eq!(weather_code_to_condition(2), WeatherCondition::PartlyCloudy);
        assert_eq!(weather_code_to_condition(3), WeatherCondition::Cloudy);
        assert_eq!(weather_code_to_condition(45), WeatherCondition::Fog);
        assert_eq!(weather_code_to_condition(63), WeatherCondition::Rain);
        assert_eq!(weather_code_to_condition(81), WeatherCondition::Showers);
        assert_eq!(weather_code_to_condition(73), WeatherCondition::Snow);
        assert_eq!(weather_code_to_condition(95), WeatherCondition::Thunderstorm);
        assert_eq!(weather_code_to_condition(200), WeatherCondition::Cloudy);
    }

    #[test]
    fn test_weather_description() {
        assert_eq!(weather_description(0), "Clear sky");
        assert_eq!(weather_description(95), "Thunderstorm");
        assert_eq!(weather_description(99), "Unknown");
    }

    #[test]
    fn test_parse_valid_response() {
        let response: OpenMeteoResponse =
            serde_json::from_str(VALID_RESPONSE).expect("Failed to parse valid response");
        let coords = Coordinates {
            name: "Kyiv".to_string(),
            latitude: 50.45,
            longitude: 30.52,
            country: Some("Ukraine".to_string()),
            region: None,
        };

        let report = build_report(&coords, response.current_weather);

        assert_eq!(report.city, "Kyiv");
        assert_eq!(report.country, "Ukraine");
        assert!((report.temperature - 23.0).abs() < 0.01);
        assert!((report.wind_speed - 12.5).abs() < 0.01);
        assert_eq!(report.wind_direction, Some(270.0));
        assert_eq!(report.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(report.description, "Partly cloudy");
        assert_eq!(report.observed_at, "14:00");
        assert_eq!(report.source, WeatherSource::Live);
    }

    #[test]
    fn test_parse_malformed_json() {
        let result: Result<OpenMeteoResponse, _> = serde_json::from_str("{ not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_demo_weather_ranges() {
        for _ in 0..50 {
            let report = demo_weather("Nowhere");
            assert!(report.is_demo());
            assert_eq!(report.city, "Nowhere");
            assert_eq!(report.country, DEMO_COUNTRY);
            assert!(report.temperature >= -5.0 && report.temperature < 25.0);
            assert!(report.wind_speed >= 0.0 && report.wind_speed < 20.0);
            assert!(report.coordinates.is_none());
        }
    }

    #[tokio::test]
    async fn test_get_weather_live_pipeline() {
        let (server, client) = mock_apis().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(GEOCODE_RESPONSE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RESPONSE))
            .mount(&server)
            .await;

        let result = client.get_weather("Kyiv").await;

        assert!(!result.is_fallback());
        let report = result.into_data();
        assert_eq!(report.city, "Kyiv");
        assert_eq!(report.coordinates, Some((50.45, 30.52)));
        assert!(!report.is_demo());
    }

    #[tokio::test]
    async fn test_unresolvable_city_yields_demo_weather() {
        let (server, client) = mock_apis().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"generationtime_ms":1}"#))
            .mount(&server)
            .await;

        let result = client.get_weather("Qwertyuiopville").await;

        assert!(result.is_fallback());
        assert!(result.reason().unwrap_or_default().contains("not found"));
        let report = result.into_data();
        assert!(report.is_demo());
        assert_eq!(report.city, "Qwertyuiopville");
    }

    #[tokio::test]
    async fn test_weather_step_failure_yields_demo_weather() {
        let (server, client) = mock_apis().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(GEOCODE_RESPONSE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client.get_weather("Kyiv").await;

        assert!(result.is_fallback());
        assert!(result.data().is_demo());
        assert_eq!(result.data().city, "Kyiv");
    }

    #[test]
    fn test_weather_client_default() {
        let client = WeatherClient::default();
        assert_eq!(client.base_url, OPEN_METEO_BASE_URL);
    }
}
