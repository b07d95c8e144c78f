//! Availability probe for the remote APIs

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiEndpoints;

/// Timeout for a single probe request
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Availability of one API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiStatus {
    pub name: &'static str,
    pub available: bool,
}

/// Result of probing every API
#[derive(Debug, Clone, Serialize)]
pub struct ApiHealth {
    pub details: Vec<ApiStatus>,
    pub checked_at: DateTime<Utc>,
}

impl ApiHealth {
    /// Number of APIs that answered with 200
    pub fn available(&self) -> usize {
        self.details.iter().filter(|s| s.available).count()
    }

    pub fn total(&self) -> usize {
        self.details.len()
    }
}

/// Probes each configured API once with a short timeout
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: Client,
    endpoints: ApiEndpoints,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(client: Client, endpoints: ApiEndpoints) -> Self {
        Self {
            client,
            endpoints,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe all four APIs concurrently
    pub async fn check(&self) -> ApiHealth {
        let probes = [
            (
                "REST Countries",
                format!("{}/name/Ukraine", self.endpoints.rest_countries),
            ),
            (
                "Open-Meteo",
                format!(
                    "{}?latitude=50.45&longitude=30.52&current_weather=true",
                    self.endpoints.open_meteo
                ),
            ),
            (
                "Geocoding",
                format!("{}?name=Kyiv&count=1", self.endpoints.geocoding),
            ),
            (
                "WorldTimeAPI",
                format!("{}/Europe/Kiev", self.endpoints.time_api),
            ),
        ];

        let details = join_all(probes.iter().map(|(name, url)| async move {
            let available = self.probe(url).await;
            debug!(api = *name, available, "probe finished");
            ApiStatus {
                name: *name,
                available,
            }
        }))
        .await;

        ApiHealth {
            details,
            checked_at: Utc::now(),
        }
    }

    async fn probe(&self, url: &str) -> bool {
        match self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!(url, error = %e, "probe failed");
                false
            }
        }
    }
}
