//! One-shot subcommands
//!
//! Each command opens the same store the TUI uses, performs one action and
//! prints a plain-text result.

use std::io::{self, Write};

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::cli::{CacheCommand, CliError, Command, NoteCommand, RouteArgs, RouteCommand};
use crate::config::Config;
use crate::data::{
    CountryClient, Fetched, HealthChecker, Route, TimeClient, WeatherClient, WeatherReport,
};
use crate::error::AppError;
use crate::storage::Store;
use crate::tracker::{NoteDraft, RouteDraft, Tracker};

/// Anything that makes a command exit non-zero
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Cli(#[from] CliError),

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// API clients built from the configured endpoints
#[derive(Debug, Clone)]
pub struct Clients {
    pub weather: WeatherClient,
    pub countries: CountryClient,
    pub time: TimeClient,
    pub health: HealthChecker,
}

impl Clients {
    pub fn from_config(config: &Config) -> Self {
        let client = Client::new();
        let endpoints = &config.endpoints;
        Self {
            weather: WeatherClient::with_endpoints(
                client.clone(),
                endpoints.open_meteo.clone(),
                endpoints.geocoding.clone(),
            )
            .with_geocoding_language(config.language.clone()),
            countries: CountryClient::with_base_url(client.clone(), endpoints.rest_countries.clone()),
            time: TimeClient::with_base_url(client.clone(), endpoints.time_api.clone()),
            health: HealthChecker::new(client, endpoints.clone()).with_timeout(config.health_timeout),
        }
    }
}

/// Runs a subcommand, writing its output to `out`
pub async fn run(
    command: Command,
    config: &Config,
    clients: &Clients,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let store = Store::new(config.data_dir.clone());
    info!(?command, "running command");

    match command {
        Command::Route { action } => {
            let mut tracker = Tracker::open(store, config.page_size, config.weather_cache_ttl);
            run_route(action, &mut tracker, out)
        }
        Command::Note { action } => {
            let mut tracker = Tracker::open(store, config.page_size, config.weather_cache_ttl);
            run_note(action, &mut tracker, out)
        }
        Command::Weather { city } => {
            let tracker = Tracker::open(store, config.page_size, config.weather_cache_ttl);
            let result = tracker.lookup_weather(&clients.weather, &city).await?;
            print_weather(&result, out)?;
            Ok(())
        }
        Command::Country { code } => {
            let result = clients.countries.country_info(&code).await;
            let info = result.data();
            writeln!(out, "{} ({})", info.name, info.official_name)?;
            writeln!(out, "Capital:    {}", info.capital)?;
            writeln!(out, "Region:     {} / {}", info.region, info.subregion)?;
            writeln!(out, "Population: {}", info.population)?;
            match info.area {
                Some(area) => writeln!(out, "Area:       {} km\u{b2}", area)?,
                None => writeln!(out, "Area:       No data")?,
            }
            writeln!(out, "Languages:  {}", info.languages)?;
            writeln!(out, "Currency:   {}", info.currency)?;
            if !info.timezones.is_empty() {
                writeln!(out, "Timezones:  {}", info.timezones.join(", "))?;
            }
            print_fallback_reason(&result, out)?;
            Ok(())
        }
        Command::Countries { query } => {
            let result = clients.countries.search(&query).await;
            if result.data().is_empty() {
                writeln!(out, "No countries match '{}'", query)?;
            }
            for country in result.data() {
                writeln!(
                    out,
                    "{:<4}{} - capital {}, {}, population {}",
                    country.code, country.name, country.capital, country.region, country.population
                )?;
            }
            print_fallback_reason(&result, out)?;
            Ok(())
        }
        Command::Time { timezone } => {
            let result = clients.time.world_time(&timezone).await;
            let time = result.data();
            writeln!(out, "{} ({})", time.timezone, time.abbreviation)?;
            writeln!(out, "{}", time.datetime)?;
            writeln!(
                out,
                "Day of week {} (0 = Sunday), day {} of the year, week {}",
                time.day_of_week, time.day_of_year, time.week_number
            )?;
            print_fallback_reason(&result, out)?;
            Ok(())
        }
        Command::Health => {
            let health = clients.health.check().await;
            for status in &health.details {
                let state = if status.available { "ok" } else { "unavailable" };
                writeln!(out, "{:<16}{}", status.name, state)?;
            }
            writeln!(
                out,
                "{}/{} APIs available",
                health.available(),
                health.total()
            )?;
            Ok(())
        }
        Command::Stats => {
            let tracker = Tracker::open(store, config.page_size, config.weather_cache_ttl);
            let stats = tracker.stats();
            let storage = tracker.store().stats();
            writeln!(out, "Routes:     {}", stats.total_routes)?;
            writeln!(out, "Completed:  {}", stats.completed_routes)?;
            writeln!(out, "Notes:      {}", stats.total_notes)?;
            writeln!(out, "Cache keys: {}", storage.cache_keys)?;
            writeln!(
                out,
                "Storage:    {} documents, {:.2} KB in {}",
                storage.items,
                storage.size_kb,
                tracker.store().dir().display()
            )?;
            Ok(())
        }
        Command::Cache { action } => run_cache(action, store, out),
        Command::Clear { yes } => {
            if !yes {
                return Err(CliError::ConfirmationRequired("clear all data").into());
            }
            if !store.clear() {
                return Err(CliError::ClearFailed.into());
            }
            writeln!(out, "All stored data cleared")?;
            Ok(())
        }
    }
}

fn run_route(
    action: RouteCommand,
    tracker: &mut Tracker,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match action {
        RouteCommand::Add(args) => {
            let saved = tracker.add_route(&draft_from_args(args))?;
            writeln!(out, "Added route {}", saved.item.id)?;
            warn_unsaved(saved.persisted, out)?;
        }
        RouteCommand::Edit { id, changes } => {
            let route = tracker
                .find_route(&id)
                .ok_or_else(|| AppError::RouteNotFound(id.clone()))?;
            let mut draft = RouteDraft::from_route(route);
            if let Some(name) = changes.name {
                draft.name = name;
            }
            if let Some(destination) = changes.destination {
                draft.destination = destination;
            }
            if let Some(start) = changes.start {
                draft.start_date = start;
            }
            if let Some(end) = changes.end {
                draft.end_date = end;
            }
            if let Some(description) = changes.description {
                draft.description = description;
            }
            if let Some(transport) = changes.transport {
                draft.transport = transport;
            }
            if let Some(completed) = changes.completed {
                draft.completed = completed;
            }
            let saved = tracker.update_route(&id, &draft)?;
            writeln!(out, "Updated route {}", saved.item.id)?;
            warn_unsaved(saved.persisted, out)?;
        }
        RouteCommand::Delete { id } => {
            let saved = tracker.delete_route(&id)?;
            writeln!(out, "Deleted route {} ({})", saved.item.id, saved.item.name)?;
            warn_unsaved(saved.persisted, out)?;
        }
        RouteCommand::List {
            search,
            completed,
            page,
        } => {
            tracker.detach_view();
            if let Some(term) = search {
                tracker.set_search(&term);
            }
            if completed {
                tracker.set_completed_only(true);
            }
            let total_pages = tracker.page().total_pages;
            if !tracker.change_page(page) {
                return Err(CliError::PageOutOfRange { page, total_pages }.into());
            }

            let visible = tracker.visible_routes();
            if visible.items.is_empty() {
                writeln!(out, "No routes found")?;
            }
            for (number, route) in &visible.items {
                writeln!(out, "{}", route_summary(*number, route))?;
            }
            writeln!(
                out,
                "Page {}/{} ({} routes)",
                visible.page.current, visible.page.total_pages, visible.page.total_items
            )?;
        }
    }
    Ok(())
}

fn draft_from_args(args: RouteArgs) -> RouteDraft {
    RouteDraft {
        name: args.name,
        destination: args.destination,
        start_date: args.start.unwrap_or_default(),
        end_date: args.end.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
        transport: args.transport.unwrap_or_default(),
        completed: args.completed,
    }
}

/// One line per route: position, status, name, destination, transport, dates, id
fn route_summary(number: usize, route: &Route) -> String {
    let check = if route.completed { "x" } else { " " };
    let dates = match (route.start_date, route.end_date) {
        (Some(start), Some(end)) => format!("{}..{}", start, end),
        (Some(start), None) => format!("{}..", start),
        (None, Some(end)) => format!("..{}", end),
        (None, None) => "-".to_string(),
    };
    format!(
        "{}. [{}] {} -> {} | {} | {} | {}",
        number, check, route.name, route.destination, route.transport, dates, route.id
    )
}

fn run_note(
    action: NoteCommand,
    tracker: &mut Tracker,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match action {
        NoteCommand::Add { title, content } => {
            let saved = tracker.add_note(&NoteDraft { title, content })?;
            writeln!(out, "Added note {}", saved.item.id)?;
            warn_unsaved(saved.persisted, out)?;
        }
        NoteCommand::Delete { id } => {
            let saved = tracker.delete_note(&id)?;
            writeln!(out, "Deleted note {}", saved.item.id)?;
            warn_unsaved(saved.persisted, out)?;
        }
        NoteCommand::List => {
            if tracker.notes().is_empty() {
                writeln!(out, "No notes")?;
            }
            for note in tracker.notes() {
                writeln!(
                    out,
                    "{} [{}] {}",
                    note.created_at.format("%Y-%m-%d"),
                    note.id,
                    note.title
                )?;
                if !note.content.is_empty() {
                    writeln!(out, "    {}", note.content)?;
                }
            }
        }
    }
    Ok(())
}

fn run_cache(action: CacheCommand, store: Store, out: &mut impl Write) -> Result<(), CommandError> {
    let cache = crate::cache::TtlCache::new(store);
    match action {
        CacheCommand::Get { key } => {
            let value: serde_json::Value = cache
                .get(&key)
                .ok_or_else(|| CliError::CacheMiss(key.clone()))?;
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            writeln!(out, "{}", text)?;
        }
        CacheCommand::Keys => {
            for key in cache.keys() {
                writeln!(out, "{}", key)?;
            }
        }
        CacheCommand::Prune => {
            let removed = cache.purge_expired();
            writeln!(out, "Removed {} expired entries", removed)?;
        }
    }
    Ok(())
}

fn print_weather(result: &Fetched<WeatherReport>, out: &mut impl Write) -> io::Result<()> {
    let report = result.data();
    writeln!(out, "{}, {}", report.city, report.country)?;
    writeln!(
        out,
        "{} {}\u{b0}C, {}",
        report.condition.icon(),
        report.temperature,
        report.description
    )?;
    match report.wind_direction {
        Some(deg) => writeln!(out, "Wind {} km/h from {}\u{b0}", report.wind_speed, deg)?,
        None => writeln!(out, "Wind {} km/h", report.wind_speed)?,
    }
    writeln!(out, "Observed {}", report.observed_at)?;
    print_fallback_reason(result, out)
}

fn print_fallback_reason<T>(result: &Fetched<T>, out: &mut impl Write) -> io::Result<()> {
    if let Some(reason) = result.reason() {
        writeln!(out, "(offline fallback: {})", reason)?;
    }
    Ok(())
}

fn warn_unsaved(persisted: bool, out: &mut impl Write) -> io::Result<()> {
    if !persisted {
        writeln!(out, "warning: change could not be saved to disk")?;
    }
    Ok(())
}
