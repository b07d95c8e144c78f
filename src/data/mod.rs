//! Core data models for triplog
//!
//! This module contains the records users create (routes and notes), the
//! pagination snapshot, and the API clients that look up weather, countries
//! and world time.

pub mod countries;
pub mod geocoding;
pub mod health;
pub mod weather;
pub mod world_time;

pub use countries::{CountryClient, CountryError, CountryInfo, CountrySummary};
pub use geocoding::{Coordinates, GeocodingClient, GeocodingError};
pub use health::{ApiHealth, HealthChecker};
pub use weather::{WeatherClient, WeatherError, WeatherReport, WeatherSource};
pub use world_time::{TimeClient, TimeError, WorldTime};

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Means of transport for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Car,
    Train,
    Plane,
    Bus,
    /// Any value not recognised when loading stored data
    #[serde(other)]
    Other,
}

impl Transport {
    /// The transports offered when creating or editing a route
    pub const SELECTABLE: [Transport; 4] = [
        Transport::Car,
        Transport::Train,
        Transport::Plane,
        Transport::Bus,
    ];

    /// Parses a transport name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "car" => Some(Transport::Car),
            "train" => Some(Transport::Train),
            "plane" | "flight" => Some(Transport::Plane),
            "bus" => Some(Transport::Bus),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Transport::Car => "Car",
            Transport::Train => "Train",
            Transport::Plane => "Plane",
            Transport::Bus => "Bus",
            Transport::Other => "Other",
        }
    }

    /// Next selectable transport, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::SELECTABLE.iter().position(|t| *t == self).unwrap_or(0);
        Self::SELECTABLE[(idx + 1) % Self::SELECTABLE.len()]
    }

    /// Previous selectable transport, wrapping around
    pub fn prev(self) -> Self {
        let len = Self::SELECTABLE.len();
        let idx = Self::SELECTABLE.iter().position(|t| *t == self).unwrap_or(0);
        Self::SELECTABLE[(idx + len - 1) % len]
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user-defined trip
///
/// Every field has a default so that partially written documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Route {
    /// Opaque identifier, see [`generate_id`]
    pub id: String,
    /// Name of the trip
    pub name: String,
    /// Where the trip goes
    pub destination: String,
    /// First day of the trip, if planned
    pub start_date: Option<NaiveDate>,
    /// Last day of the trip, if planned
    pub end_date: Option<NaiveDate>,
    /// Free-text description
    pub description: String,
    /// How the trip is travelled
    pub transport: Transport,
    /// Whether the trip has been completed
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Route {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: String::new(),
            destination: String::new(),
            start_date: None,
            end_date: None,
            description: String::new(),
            transport: Transport::default(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Route {
    /// Case-insensitive substring match over name, destination and description
    ///
    /// `term_lower` must already be lowercased.
    pub fn matches(&self, term_lower: &str) -> bool {
        self.name.to_lowercase().contains(term_lower)
            || self.destination.to_lowercase().contains(term_lower)
            || self.description.to_lowercase().contains(term_lower)
    }
}

/// A free-text travel note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            content: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Default number of routes per page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Snapshot of the route list pagination
///
/// Recomputed from the live collection on every render; the stored copy only
/// restores the page a user was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationSettings {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_items: 0,
        }
    }
}

/// Outcome of a remote lookup
///
/// Lookups never fail outright. When the remote side cannot be used a
/// synthetic substitute is returned as `Fallback` together with the reason,
/// so callers can tell live data from placeholder data.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Data came from the remote API
    Live(T),
    /// Remote lookup failed; `data` is a synthetic substitute
    Fallback { data: T, reason: String },
}

impl<T> Fetched<T> {
    /// Borrows the payload regardless of its origin
    pub fn data(&self) -> &T {
        match self {
            Fetched::Live(data) => data,
            Fetched::Fallback { data, .. } => data,
        }
    }

    /// Consumes the outcome and returns the payload
    pub fn into_data(self) -> T {
        match self {
            Fetched::Live(data) => data,
            Fetched::Fallback { data, .. } => data,
        }
    }

    /// Returns true when the payload is a synthetic substitute
    pub fn is_fallback(&self) -> bool {
        matches!(self, Fetched::Fallback { .. })
    }

    /// The failure that caused the fallback, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Fetched::Live(_) => None,
            Fetched::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Generates an opaque record id
///
/// Base-36 millisecond timestamp followed by a random base-36 suffix.
/// Uniqueness is probabilistic; no collision detection is done.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::thread_rng().gen_range(36u64.pow(7)..36u64.pow(11));
    format!("{}{}", to_base36(millis), to_base36(suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}
