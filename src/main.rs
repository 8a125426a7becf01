mod app;
mod browser;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod model;
mod theme;
mod tui;
mod ui;
mod view;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::browser::fetch::{FetchTrigger, FetchWorker};
use crate::config::{AppConfig, FoldingConfig, SortConfig, ThemeConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::model::directory::Directory;
use crate::model::source::DirectoryFixture;
use crate::tui::{install_panic_hook, Tui};

/// Number of generated people when neither a fixture nor `--synthetic` is given.
const DEFAULT_SYNTHETIC_PEOPLE: usize = 250;

/// A terminal LDAP directory browser with folding tree pages.
#[derive(Parser, Debug)]
#[command(name = "ldb", version, about)]
struct Cli {
    /// JSON fixture describing connections, entries, searches and bookmarks
    fixture: Option<PathBuf>,

    /// Generate a directory with N people under ou=people instead of a fixture
    #[arg(long, value_name = "N", conflicts_with = "fixture")]
    synthetic: Option<usize>,

    /// Path to config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file (filter with LDB_LOG, default "info")
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Show large child lists flat instead of folding them into pages
    #[arg(long)]
    no_folding: bool,

    /// Page size at which folding begins
    #[arg(long, value_name = "N")]
    folding_size: Option<usize>,

    /// Entry ordering: none, rdn, rdn_value
    #[arg(long, value_name = "BY")]
    sort_by: Option<String>,

    /// Sort entries in descending order
    #[arg(long)]
    descending: bool,

    /// Color scheme: dark, light, custom
    #[arg(long, value_name = "SCHEME")]
    theme: Option<String>,
}

impl Cli {
    /// Partial config holding only what the flags set.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            folding: FoldingConfig {
                enabled: self.no_folding.then_some(false),
                size: self.folding_size,
            },
            sort: SortConfig {
                by: self.sort_by.clone(),
                order: self.descending.then(|| "descending".to_string()),
                ..Default::default()
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                custom: None,
            },
            ..Default::default()
        }
    }
}

/// Install a file-backed subscriber. The terminal belongs to the TUI, so
/// nothing is logged without `--log-file`.
fn init_logging(path: &Path) -> error::Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env("LDB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_fixture(cli: &Cli) -> error::Result<DirectoryFixture> {
    match &cli.fixture {
        Some(path) => {
            if !path.exists() {
                return Err(AppError::InvalidPath(format!("{} does not exist", path.display())));
            }
            DirectoryFixture::load(path)
        }
        None => Ok(DirectoryFixture::synthetic(
            cli.synthetic.unwrap_or(DEFAULT_SYNTHETIC_PEOPLE),
        )),
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let mut directory = Directory::new();
    let sources = load_fixture(&cli)?.install(&mut directory, config.count_limit())?;
    tracing::info!(
        connections = directory.connection_ids().count(),
        latency_ms = config.latency().as_millis() as u64,
        theme = config.theme_scheme(),
        "directory loaded"
    );

    install_panic_hook();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(16));

    let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
    let _worker = FetchWorker::spawn(sources, fetch_rx, events.sender(), config.latency());

    let theme = theme::resolve_theme(&config.theme);
    let mut app = App::new(directory, config.preferences(), FetchTrigger::new(fetch_tx), theme);

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => app.clear_expired_status(),
            Event::Resize => {}
            Event::Fetched(outcome) => app.handle_fetched(outcome),
        }

        if app.should_quit {
            break;
        }
    }

    app.provider.dispose();
    tui.restore()?;
    Ok(())
}
