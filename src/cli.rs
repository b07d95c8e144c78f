//! Command-line interface parsing for triplog
//!
//! Running `triplog` without a subcommand opens the TUI. Subcommands perform
//! a single action against the same data directory and exit.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::data::Transport;

/// Error types for CLI argument handling and one-shot commands
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified transport name is not recognized
    #[error("Invalid transport: '{0}'. Valid transports: car, train, plane, bus")]
    InvalidTransport(String),

    /// `route list --page` beyond the last page
    #[error("Page {page} is out of range (1-{total_pages})")]
    PageOutOfRange { page: usize, total_pages: usize },

    /// Nothing cached under the key, or the entry has expired
    #[error("No cached value for '{0}' (missing or expired)")]
    CacheMiss(String),

    /// A destructive command was run without `--yes`
    #[error("Refusing to {0} without --yes")]
    ConfirmationRequired(&'static str),

    /// The data directory could not be cleared
    #[error("Failed to clear stored data")]
    ClearFailed,
}

/// Triplog - plan and track travel routes from the terminal
#[derive(Parser, Debug)]
#[command(name = "triplog")]
#[command(about = "Travel itinerary tracker with routes, notes, weather and country info")]
#[command(version)]
pub struct Cli {
    /// Directory for stored routes, notes, cache and logs
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage routes
    Route {
        #[command(subcommand)]
        action: RouteCommand,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        action: NoteCommand,
    },
    /// Current weather for a city (demo data when offline)
    Weather { city: String },
    /// Details for a country by ISO code
    Country { code: String },
    /// Search countries by name
    Countries { query: String },
    /// Current time in a timezone
    Time {
        /// IANA timezone name
        #[arg(default_value = crate::data::world_time::DEFAULT_TIMEZONE)]
        timezone: String,
    },
    /// Check which remote APIs are reachable
    Health,
    /// Route, note and storage statistics
    Stats,
    /// Inspect or prune the lookup cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
    /// Delete all stored routes, notes, cache and settings
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RouteCommand {
    /// Add a new route
    Add(RouteArgs),
    /// Change fields of an existing route
    Edit {
        id: String,
        #[command(flatten)]
        changes: RouteChanges,
    },
    /// Delete a route by id
    Delete { id: String },
    /// List routes, one page at a time
    List {
        /// Only routes whose name, destination or description contain this text
        #[arg(long)]
        search: Option<String>,
        /// Only completed routes
        #[arg(long)]
        completed: bool,
        /// Page to show
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

/// Fields for a new route
#[derive(Args, Debug)]
pub struct RouteArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub destination: String,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// car, train, plane or bus
    #[arg(long, value_parser = parse_transport_arg)]
    pub transport: Option<Transport>,
    /// Mark the route as completed
    #[arg(long)]
    pub completed: bool,
}

/// Fields to change on an existing route; omitted fields keep their value
#[derive(Args, Debug)]
pub struct RouteChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub destination: Option<String>,
    /// Start date (YYYY-MM-DD, empty to clear)
    #[arg(long)]
    pub start: Option<String>,
    /// End date (YYYY-MM-DD, empty to clear)
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_parser = parse_transport_arg)]
    pub transport: Option<Transport>,
    /// true or false
    #[arg(long)]
    pub completed: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Add a note
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Delete a note by id
    Delete { id: String },
    /// List all notes
    List,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print a cached value if it has not expired
    Get { key: String },
    /// List cached keys, expired ones included
    Keys,
    /// Remove all expired entries
    Prune,
}

/// Parses a transport string argument into a Transport enum.
///
/// # Arguments
/// * `s` - The transport string from CLI
///
/// # Returns
/// * `Ok(Transport)` if the string matches a valid transport
/// * `Err(CliError::InvalidTransport)` if the string doesn't match
pub fn parse_transport_arg(s: &str) -> Result<Transport, CliError> {
    Transport::from_str(s).ok_or_else(|| CliError::InvalidTransport(s.to_string()))
}
