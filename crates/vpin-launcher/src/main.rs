//! VPin Launcher
//!
//! A TUI launcher for Visual Pinball tables. Lists the tables found on disk,
//! shows their snapshot and high score, and plays the selected one.

mod controller;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use controller::SessionController;
use ui::{App, draw_ui};
use vpin_config::LauncherConfig;

#[derive(Parser)]
#[command(name = "vpin-launcher")]
#[command(author, version, about = "Browse and play Visual Pinball tables")]
struct Args {
    /// Configuration file (defaults to the user, then the system config)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Tables directory, overriding the configuration
    #[arg(long)]
    tables_dir: Option<PathBuf>,

    /// Print the tables with their high scores and exit
    #[arg(long)]
    list: bool,

    /// Print the list as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Write the effective configuration to a file and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Log file used while the UI owns the terminal
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list || args.write_config.is_some() {
        setup_logging(None)?;
    } else {
        let log_file = args
            .log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("vpin-launcher.log"));
        setup_logging(Some(&log_file))?;
    }

    let mut config = match &args.config {
        Some(path) => LauncherConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => LauncherConfig::load_default().context("Failed to load configuration")?,
    };
    if let Some(tables_dir) = args.tables_dir {
        config.paths.tables_dir = tables_dir;
    }
    config.validate().context("Invalid configuration")?;

    let missing = config.scores.stores_without_layout();
    if !missing.is_empty() {
        warn!(
            "No score layout for {}; these tables show no high score",
            missing.join(", ")
        );
    }

    if let Some(path) = &args.write_config {
        config
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let controller = SessionController::new(&config, runtime.handle().clone());

    if args.list {
        return print_tables(controller, args.json);
    }

    info!("VPin Launcher starting...");
    run_ui(controller)?;
    info!("VPin Launcher exiting");

    Ok(())
}

/// Logs go to stderr, or to `log_file` while the UI owns the terminal
fn setup_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }

    Ok(())
}

fn print_tables(mut controller: SessionController, json: bool) -> Result<()> {
    controller
        .rescan()
        .with_context(|| format!("Failed to scan {}", controller.tables_dir().display()))?;
    let entries = controller.entries();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{:<40} {}", entry.title, entry.score);
    }
    Ok(())
}

fn run_ui(controller: SessionController) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller);
    let result = event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| draw_ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_input(key.code)?;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
