//! Triplog - travel itinerary tracker
//!
//! Without a subcommand this opens a terminal UI for managing routes and
//! notes and looking up weather. Subcommands run a single action and exit.

use std::io;
use std::panic;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use triplog::app::{App, NotificationLevel};
use triplog::cli::Cli;
use triplog::commands::{self, Clients};
use triplog::config::{Config, ConfigError};
use triplog::storage::Store;
use triplog::tracker::Tracker;
use triplog::ui;

/// Name of the log file written into the data directory
const LOG_FILE: &str = "triplog.log";

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Resolves configuration from file and environment, then applies CLI flags
fn resolve_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match (Config::load(), &cli.data_dir) {
        (Ok(config), _) => config,
        (Err(ConfigError::NoDataDir), Some(dir)) => Config::with_data_dir(dir.clone()),
        (Err(e), _) => return Err(e),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Installs the tracing subscriber
///
/// Events always go to `triplog.log` in the data directory. One-shot commands
/// additionally print warnings to stderr; the TUI never writes to the terminal.
fn init_logging(
    config: &Config,
    verbose: bool,
    to_stderr: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = if verbose { "triplog=debug" } else { "triplog=info" };
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = std::fs::create_dir_all(config.log_dir());
    let (file_layer, guard) = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(config.log_dir())
    {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("warning: file logging disabled: {}", e);
            (None, None)
        }
    };

    let stderr_layer = to_stderr.then(|| {
        let default_filter = if verbose { "triplog=debug" } else { "triplog=warn" };
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .with_filter(stderr_filter(default_filter))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    guard
}

/// Filter for the stderr layer; `RUST_LOG` wins over the default
fn stderr_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Runs the interactive terminal UI until the user quits
async fn run_tui(config: &Config, clients: &Clients) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(config.data_dir.clone());
    let tracker = Tracker::open(store, config.page_size, config.weather_cache_ttl);
    let mut app = App::new(tracker, clients.weather.clone());

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(data_dir = %config.data_dir.display(), "tui started");

    // Main event loop
    loop {
        terminal.draw(|f| ui::render(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        app.tick(Instant::now());

        if app.weather_requested {
            app.notify(NotificationLevel::Info, "Fetching weather...");
            terminal.draw(|f| ui::render(f, &app))?;
            app.fetch_weather().await;
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("tui stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let guard = init_logging(&config, cli.verbose, cli.command.is_some());
    let clients = Clients::from_config(&config);

    match cli.command {
        None => run_tui(&config, &clients).await,
        Some(command) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = commands::run(command, &config, &clients, &mut stdout).await {
                info!(error = %e, "command failed");
                eprintln!("error: {}", e);
                // Flush the log file before exiting
                drop(guard);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
