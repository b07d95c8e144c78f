//! WorldTimeAPI client
//!
//! Current time for an IANA timezone, falling back to the local clock.

use chrono::{DateTime, Datelike, FixedOffset, Local};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::Fetched;

/// Base URL for the WorldTimeAPI timezone endpoint
pub const TIME_API_BASE_URL: &str = "https://worldtimeapi.org/api/timezone";

/// Timezone used when none is given
pub const DEFAULT_TIMEZONE: &str = "Europe/Kiev";

/// Abbreviation reported for local clock fallbacks
pub const LOCAL_ABBREVIATION: &str = "LOCAL";

/// Current time in a timezone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldTime {
    pub timezone: String,
    /// Formatted as `YYYY-MM-DD HH:MM:SS`
    pub datetime: String,
    /// 0 = Sunday
    pub day_of_week: u32,
    pub day_of_year: u32,
    pub week_number: u32,
    pub abbreviation: String,
}

impl WorldTime {
    /// Time taken from the local clock, labelled with the requested timezone
    pub fn local(timezone: &str) -> Self {
        let now = Local::now();
        Self {
            timezone: timezone.to_string(),
            datetime: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            day_of_week: now.weekday().num_days_from_sunday(),
            day_of_year: now.ordinal(),
            week_number: now.iso_week().week(),
            abbreviation: LOCAL_ABBREVIATION.to_string(),
        }
    }
}

/// Errors that can occur when fetching world time
#[derive(Debug, Error)]
pub enum TimeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Time API returned status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Invalid datetime in response
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),
}

#[derive(Debug, Deserialize)]
struct ApiTime {
    timezone: String,
    datetime: String,
    day_of_week: u32,
    day_of_year: u32,
    week_number: u32,
    abbreviation: String,
}

/// Client for the WorldTimeAPI
#[derive(Debug, Clone)]
pub struct TimeClient {
    client: Client,
    base_url: String,
}

impl Default for TimeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeClient {
    pub fn new() -> Self {
        Self::with_base_url(Client::new(), TIME_API_BASE_URL)
    }

    /// Create a client for a custom endpoint (used by config and tests)
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Current time in `timezone`, or the local clock when the API fails
    pub async fn world_time(&self, timezone: &str) -> Fetched<WorldTime> {
        info!(timezone, "fetching world time");
        match self.fetch(timezone).await {
            Ok(time) => Fetched::Live(time),
            Err(e) => {
                warn!(timezone, error = %e, "time lookup failed, using local clock");
                Fetched::Fallback {
                    data: WorldTime::local(timezone),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch(&self, timezone: &str) -> Result<WorldTime, TimeError> {
        let url = format!("{}/{}", self.base_url, timezone);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TimeError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        parse_response(&text)
    }
}

fn parse_response(text: &str) -> Result<WorldTime, TimeError> {
    let api: ApiTime = serde_json::from_str(text)?;
    let datetime = DateTime::<FixedOffset>::parse_from_rfc3339(&api.datetime)
        .map_err(|_| TimeError::InvalidDatetime(api.datetime.clone()))?;

    Ok(WorldTime {
        timezone: api.timezone,
        datetime: datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        day_of_week: api.day_of_week,
        day_of_year: api.day_of_year,
        week_number: api.week_number,
        abbreviation: api.abbreviation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KYIV: &str = r#"{
        "abbreviation": "EEST",
        "datetime": "2024-07-15T14:05:09.123456+03:00",
        "day_of_week": 1,
        "day_of_year": 197,
        "dst": true,
        "timezone": "Europe/Kiev",
        "utc_offset": "+03:00",
        "week_number": 29
    }"#;

    #[test]
    fn test_parse_response_formats_local_datetime() {
        let time = parse_response(KYIV).unwrap();
        assert_eq!(time.timezone, "Europe/Kiev");
        assert_eq!(time.datetime, "2024-07-15 14:05:09");
        assert_eq!(time.day_of_week, 1);
        assert_eq!(time.week_number, 29);
        assert_eq!(time.abbreviation, "EEST");
    }

    #[test]
    fn test_parse_response_rejects_bad_datetime() {
        let bad = KYIV.replace("2024-07-15T14:05:09.123456+03:00", "yesterday");
        assert!(matches!(
            parse_response(&bad),
            Err(TimeError::InvalidDatetime(_))
        ));
    }

    #[test]
    fn test_local_fallback_values() {
        let time = WorldTime::local("Mars/Olympus");
        assert_eq!(time.timezone, "Mars/Olympus");
        assert_eq!(time.abbreviation, LOCAL_ABBREVIATION);
        assert!(time.day_of_week <= 6);
        assert!((1..=366).contains(&time.day_of_year));
        assert!((1..=53).contains(&time.week_number));
    }

    #[tokio::test]
    async fn test_world_time_live_and_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Europe/Kiev"))
            .respond_with(ResponseTemplate::new(200).set_body_string(KYIV))
            .mount(&server)
            .await;

        let client = TimeClient::with_base_url(Client::new(), server.uri());

        let live = client.world_time("Europe/Kiev").await;
        assert!(!live.is_fallback());
        assert_eq!(live.data().abbreviation, "EEST");

        let fallback = client.world_time("Nowhere/Town").await;
        assert!(fallback.is_fallback());
        assert_eq!(fallback.data().abbreviation, LOCAL_ABBREVIATION);
    }
}
