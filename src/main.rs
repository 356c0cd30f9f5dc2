//! topic-feed: a terminal browser for topic- and theme-keyed post feeds.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ FetchOutcome ┌──────────┐  draw()  ┌──────────┐
//! │ fetch.rs │ ───────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (thread) │ ◄─────────── │ (state)  │          │ (render) │
//! └──────────┘ FetchRequest └──────────┘          └──────────┘
//!                                ▲
//!                                │ handle_key_event()
//!                           ┌──────────┐
//!                           │ input.rs │
//!                           └──────────┘
//! ```
//!
//! * **`source/`**: the `PostSource` trait, the `Post` record and the JSON
//!   implementation.
//! * **`fetch`**: a worker thread that runs fetches and reports outcomes.
//! * **`feed`**: the feed controller: selections, sorting, paging and the
//!   render pipeline, with no I/O of its own.
//! * **`sort`**, **`paginate`**, **`render`**, **`read_more`**: the pure
//!   steps the controller is built from.
//! * **`config`**: topics, themes, the source mapping and the card template.
//! * **`app`**: terminal-only state (selection, scroll, measured width).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`main`**: wires everything together: parse args, set up logging and
//!   the terminal, and run the event loop.

mod app;
mod config;
mod feed;
mod fetch;
mod input;
mod paginate;
mod read_more;
mod render;
mod sort;
mod source;
mod ui;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use reqwest::Url;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use config::FeedConfig;
use feed::FeedController;
use source::JsonSource;

/// Browse JSON post feeds by topic and theme.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.  Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL relative sources are resolved against (http(s):// or file://).
    #[arg(long)]
    base_url: Option<String>,

    /// Theme to show first.
    #[arg(long)]
    theme: Option<String>,

    /// Topic to show first.
    #[arg(long)]
    topic: Option<String>,

    /// Where to write the log.  The terminal belongs to the UI.
    #[arg(long, default_value = "topic-feed.log")]
    log_file: PathBuf,
}

impl Cli {
    fn load_config(&self) -> Result<FeedConfig> {
        let mut config = match &self.config {
            Some(path) => FeedConfig::load(path)?,
            None => FeedConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(theme) = &self.theme {
            config.default_theme = theme.clone();
        }
        if let Some(topic) = &self.topic {
            config.default_topic = topic.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Write logs to `path`, filtered by `RUST_LOG` (default `info`).
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// The URL relative sources are resolved against: the configured base, or
/// the current directory.
fn base_url(config: &FeedConfig) -> Result<Url> {
    match &config.base_url {
        Some(raw) => {
            // A base without a trailing slash would drop its last segment on join.
            let raw = if raw.ends_with('/') {
                raw.clone()
            } else {
                format!("{raw}/")
            };
            Url::parse(&raw).with_context(|| format!("invalid base URL {raw}"))
        }
        None => {
            let cwd = std::env::current_dir().context("could not read current directory")?;
            Url::from_directory_path(&cwd)
                .map_err(|()| anyhow::anyhow!("cannot express {} as a URL", cwd.display()))
        }
    }
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    // -- configuration and data source ---------------------------------------
    let config = cli.load_config()?;
    let base = base_url(&config)?;
    info!(%base, theme = %config.default_theme, topic = %config.default_topic, "starting");

    let (fetcher, outcomes) =
        fetch::spawn(JsonSource::new(base)).context("could not start fetch worker")?;

    // -- terminal setup (Drop restores on exit or panic) ---------------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(FeedController::new(config));
    app.start();

    // Each iteration:
    //   1. Apply finished fetches.
    //   2. Render, then measure what was rendered.
    //   3. Hand new requests to the worker.
    //   4. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(outcome) = outcomes.try_recv() {
            app.apply_outcome(outcome);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;
        let fresh_page = app.feed.layout_pending();
        app.settle_layout();
        if fresh_page {
            // Show read-more toggles without waiting for the next tick.
            guard.terminal.draw(|f| ui::draw(&mut app, f))?;
        }

        for request in app.take_requests() {
            if !fetcher.submit(request) {
                warn!("fetch worker stopped; no further updates");
            }
        }

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    info!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("topic-feed").chain(args.iter().copied())).unwrap()
    }

    fn config_with_base(base: Option<&str>) -> FeedConfig {
        FeedConfig {
            base_url: base.map(String::from),
            ..FeedConfig::default()
        }
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_last_segment() {
        let base = base_url(&config_with_base(Some("http://example.com/site"))).unwrap();
        assert_eq!(base.as_str(), "http://example.com/site/");
        assert_eq!(
            base.join("data/expats.json").unwrap().as_str(),
            "http://example.com/site/data/expats.json"
        );
    }

    #[test]
    fn base_with_trailing_slash_is_used_as_is() {
        let base = base_url(&config_with_base(Some("file:///srv/feeds/"))).unwrap();
        assert_eq!(base.as_str(), "file:///srv/feeds/");
    }

    #[test]
    fn missing_base_falls_back_to_the_current_directory() {
        let base = base_url(&config_with_base(None)).unwrap();
        assert_eq!(base.scheme(), "file");
        assert!(base.path().ends_with('/'));
        assert_eq!(base.to_file_path().unwrap(), std::env::current_dir().unwrap());
    }

    #[test]
    fn unparseable_base_is_an_error() {
        assert!(base_url(&config_with_base(Some("not a url"))).is_err());
    }

    #[test]
    fn flags_override_the_built_in_defaults() {
        let config = cli(&["--theme", "givenBirth", "--topic", "uscis", "--base-url", "http://x.test/"])
            .load_config()
            .unwrap();
        assert_eq!(config.default_theme, "givenBirth");
        assert_eq!(config.default_topic, "uscis");
        assert_eq!(config.base_url.as_deref(), Some("http://x.test/"));
    }

    #[test]
    fn flags_override_the_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 5\ndefault_topic = \"immigration\"").unwrap();
        let path = file.path().to_str().unwrap();

        let config = cli(&["--config", path]).load_config().unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.default_topic, "immigration");

        let config = cli(&["--config", path, "--topic", "uscis"]).load_config().unwrap();
        assert_eq!(config.default_topic, "uscis");
    }

    #[test]
    fn unknown_override_fails_validation() {
        let err = cli(&["--topic", "nope"]).load_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidValue { name, .. }) if name == "default_topic"
        ));

        let err = cli(&["--theme", "nope"]).load_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidValue { name, .. }) if name == "default_theme"
        ));
    }

    #[test]
    fn log_file_defaults_to_the_working_directory() {
        assert_eq!(cli(&[]).log_file, PathBuf::from("topic-feed.log"));
    }
}
