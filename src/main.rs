//! torrentplayer - terminal client for a torrent streaming server
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! torrentplayer
//!
//! # CLI mode (for automation)
//! torrentplayer search "inception"
//! torrentplayer play 42 --watch
//! torrentplayer status --session session_k3j9x0a1b --json
//! ```

use std::io::{stdout, Stdout};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use torrentplayer::api::PlayerApi;
use torrentplayer::cache::CacheHelper;
use torrentplayer::cli::{Cli, Command, ExitCode, Output};
use torrentplayer::commands;
use torrentplayer::config::Config;
use torrentplayer::models::SessionId;
use torrentplayer::{ui, App, SessionRuntime};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if cli.is_cli_mode() {
        init_tracing_stderr(cli.quiet);
        let exit_code = run_cli(cli, config).await;
        std::process::exit(exit_code.into());
    } else {
        let cache = CacheHelper::register_default(config.cache_enabled);
        init_tracing_file(cache.as_ref());
        run_tui(config, cache).await
    }
}

/// Config file (explicit or default), then env, then command-line flags
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            config
        }
        None => Config::load(),
    };
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    if let Some(quality) = cli.quality {
        config.quality = quality;
    }
    Ok(config)
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// CLI mode: logs go to stderr so stdout stays parseable
fn init_tracing_stderr(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// TUI mode: logs go to a file in the cache dir, or nowhere
fn init_tracing_file(cache: Option<&CacheHelper>) {
    let file = cache.and_then(|c| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(c.log_path())
            .ok()
    });
    let Some(file) = file else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: Config) -> ExitCode {
    let output = Output::new(&cli);
    let api = PlayerApi::new(config.server_url.clone());
    let quality = config.quality;

    match cli.command {
        Some(Command::Search(cmd)) => commands::search_cmd(cmd, &api, quality, &output).await,
        Some(Command::Browse(cmd)) => commands::browse_cmd(cmd, &api, quality, &output).await,
        Some(Command::Info(cmd)) => commands::info_cmd(cmd, &api, &output).await,
        Some(Command::Torrent(cmd)) => commands::torrent_cmd(cmd, &api, quality, &output).await,
        Some(Command::Play(cmd)) => {
            commands::play_cmd(cmd, &api, &config, quality, &output).await
        }
        Some(Command::Pause(arg)) => commands::pause_cmd(arg, &api, &output).await,
        Some(Command::Resume(arg)) => commands::resume_cmd(arg, &api, &output).await,
        Some(Command::Stop(arg)) => commands::stop_cmd(arg, &api, &output).await,
        Some(Command::Status(cmd)) => commands::status_cmd(cmd, &api, &output).await,
        None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI
async fn run_tui(config: Config, cache: Option<CacheHelper>) -> Result<()> {
    let session = SessionId::generate();
    let (columns, _) = crossterm::terminal::size().context("Could not read terminal size")?;
    info!(%session, server = %config.server_url, "starting TUI");

    let mut runtime = SessionRuntime::initialize(&config, session, config.viewport(columns), cache);
    if let Some(cache) = runtime.cache() {
        info!(log = %cache.log_path().display(), "cache helper ready");
    }
    let mut terminal = init_terminal()?;
    let mut app = App::new();

    let result = run_event_loop(&mut terminal, &mut app, &mut runtime, &config);

    // Always restore terminal, even on error
    runtime.shutdown();
    restore_terminal(&mut terminal)?;
    result
}

/// Main event loop - drains completions and push events, handles input,
/// renders
fn run_event_loop(
    terminal: &mut Tui,
    app: &mut App,
    runtime: &mut SessionRuntime,
    config: &Config,
) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);

    while app.running {
        runtime.pump();
        app.sync(&runtime.controller);
        terminal.draw(|frame| ui::render(frame, app, &runtime.controller))?;

        if event::poll(TICK_RATE)? {
            match event::read()? {
                // Only handle key press events (ignore releases on Windows)
                TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(event) = app.handle_key(key, &runtime.controller) {
                        runtime.dispatch(event);
                    }
                }
                TermEvent::Resize(columns, _) => {
                    runtime.controller.set_viewport(config.viewport(columns));
                }
                _ => {}
            }
        }
    }

    Ok(())
}
