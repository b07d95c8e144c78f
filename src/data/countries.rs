//! REST Countries API client
//!
//! Country details by ISO code and country search by name.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::Fetched;

/// Base URL for the REST Countries API
pub const REST_COUNTRIES_BASE_URL: &str = "https://restcountries.com/v3.1";

/// Placeholder for fields the API did not provide
pub const NO_DATA: &str = "No data";

/// Details about a single country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub name: String,
    pub official_name: String,
    pub capital: String,
    pub region: String,
    pub subregion: String,
    pub population: u64,
    /// Area in square kilometres
    pub area: Option<f64>,
    /// Comma-separated language names
    pub languages: String,
    /// First listed currency code
    pub currency: String,
    /// URL of the flag image (PNG)
    pub flag: String,
    pub timezones: Vec<String>,
}

impl CountryInfo {
    /// Placeholder returned when the lookup fails
    pub fn unavailable(code: &str) -> Self {
        Self {
            name: code.to_uppercase(),
            official_name: NO_DATA.to_string(),
            capital: NO_DATA.to_string(),
            region: NO_DATA.to_string(),
            subregion: NO_DATA.to_string(),
            population: 0,
            area: None,
            languages: NO_DATA.to_string(),
            currency: NO_DATA.to_string(),
            flag: String::new(),
            timezones: Vec::new(),
        }
    }
}

/// A country search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub name: String,
    /// ISO 3166-1 alpha-2 code
    pub code: String,
    pub flag: String,
    pub capital: String,
    pub population: u64,
    pub region: String,
}

/// Errors that can occur when querying the country registry
#[derive(Debug, Error)]
pub enum CountryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Countries API returned status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Response contained no country
    #[error("No country in response")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct ApiCountry {
    name: ApiName,
    #[serde(default)]
    cca2: String,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    region: String,
    #[serde(default)]
    subregion: String,
    #[serde(default)]
    population: u64,
    area: Option<f64>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
    #[serde(default)]
    currencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    flags: ApiFlags,
    #[serde(default)]
    timezones: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiName {
    common: String,
    #[serde(default)]
    official: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiFlags {
    #[serde(default)]
    png: String,
}

impl ApiCountry {
    fn capital(&self) -> String {
        self.capital
            .first()
            .cloned()
            .unwrap_or_else(|| NO_DATA.to_string())
    }

    fn into_info(self) -> CountryInfo {
        let capital = self.capital();
        let languages = if self.languages.is_empty() {
            NO_DATA.to_string()
        } else {
            self.languages.into_values().collect::<Vec<_>>().join(", ")
        };
        CountryInfo {
            name: self.name.common,
            official_name: self.name.official,
            capital,
            region: self.region,
            subregion: self.subregion,
            population: self.population,
            area: self.area,
            languages,
            currency: self
                .currencies
                .into_keys()
                .next()
                .unwrap_or_else(|| NO_DATA.to_string()),
            flag: self.flags.png,
            timezones: self.timezones,
        }
    }

    fn into_summary(self) -> CountrySummary {
        CountrySummary {
            capital: self.capital(),
            name: self.name.common,
            code: self.cca2,
            flag: self.flags.png,
            population: self.population,
            region: self.region,
        }
    }
}

/// Client for the REST Countries API
#[derive(Debug, Clone)]
pub struct CountryClient {
    client: Client,
    base_url: String,
}

impl Default for CountryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CountryClient {
    pub fn new() -> Self {
        Self::with_base_url(Client::new(), REST_COUNTRIES_BASE_URL)
    }

    /// Create a client for a custom endpoint (used by config and tests)
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Look up a country by its ISO code
    ///
    /// On failure the result is a placeholder with "No data" fields.
    pub async fn country_info(&self, code: &str) -> Fetched<CountryInfo> {
        info!(code, "fetching country info");
        match self.fetch_info(code).await {
            Ok(info) => Fetched::Live(info),
            Err(e) => {
                warn!(code, error = %e, "country lookup failed");
                Fetched::Fallback {
                    data: CountryInfo::unavailable(code),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Search countries whose common name contains `query`
    ///
    /// On failure the result is an empty list.
    pub async fn search(&self, query: &str) -> Fetched<Vec<CountrySummary>> {
        info!(query, "searching countries");
        match self.fetch_search(query).await {
            Ok(hits) => Fetched::Live(hits),
            Err(e) => {
                warn!(query, error = %e, "country search failed");
                Fetched::Fallback {
                    data: Vec::new(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch_info(&self, code: &str) -> Result<CountryInfo, CountryError> {
        let url = format!("{}/alpha/{}", self.base_url, code);
        let countries = self.get_countries(&url).await?;
        countries
            .into_iter()
            .next()
            .map(ApiCountry::into_info)
            .ok_or(CountryError::Empty)
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<CountrySummary>, CountryError> {
        let url = format!("{}/name/{}", self.base_url, query);
        let countries = self.get_countries(&url).await?;
        Ok(filter_by_name(countries, query))
    }

    async fn get_countries(&self, url: &str) -> Result<Vec<ApiCountry>, CountryError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CountryError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// The name endpoint also matches official and native names; keep only
/// countries whose common name contains the query.
fn filter_by_name(countries: Vec<ApiCountry>, query: &str) -> Vec<CountrySummary> {
    let query = query.to_lowercase();
    countries
        .into_iter()
        .filter(|c| c.name.common.to_lowercase().contains(&query))
        .map(ApiCountry::into_summary)
        .collect()
}
