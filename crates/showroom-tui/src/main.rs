//! `showroom` — terminal client for the car-showcase backend.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `showroom-core`'s [`LiveQuery`](showroom_core::LiveQuery) and
//! review/author boards. Screens are navigable via number keys; the admin
//! screens appear once an admin signs in.
//!
//! Logs are written to a file (default `/tmp/showroom.log`) to avoid
//! corrupting the terminal UI. A background data bridge task continuously
//! streams catalogue updates from the backend into the TUI action loop.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use showroom_core::{BackendConfig, Showroom};

use crate::app::App;

/// Terminal client for browsing and administering the car showcase.
#[derive(Parser, Debug)]
#[command(name = "showroom", version, about)]
struct Cli {
    /// Backend base URL (e.g., https://showcase.example.com)
    #[arg(short = 'u', long, env = "SHOWROOM_URL")]
    backend_url: Option<String>,

    /// Config profile name (defaults to the config file's default)
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// Accept invalid TLS certificates (self-hosted backends)
    #[arg(long)]
    insecure: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/showroom.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "showroom={log_level},showroom_core={log_level},showroom_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("showroom.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Build a [`Showroom`] from CLI args, if a URL was provided.
fn build_from_cli(cli: &Cli) -> Result<Option<Showroom>> {
    let Some(ref url_str) = cli.backend_url else {
        return Ok(None);
    };
    let url = url_str
        .parse()
        .map_err(|e| eyre!("invalid backend URL {url_str:?}: {e}"))?;

    let mut config = BackendConfig::new(url);
    if cli.insecure {
        config.tls = showroom_core::TlsVerification::DangerAcceptInvalid;
    }
    Ok(Some(Showroom::new(config)))
}

/// Build a [`Showroom`] from the config file (named or default profile).
fn build_from_config(cli: &Cli) -> Result<Option<Showroom>> {
    let config = match showroom_config::load_config() {
        Ok(c) => c,
        Err(e) => {
            info!(error = %e, "no usable config file");
            return Ok(None);
        }
    };

    let profile_name = cli
        .profile
        .clone()
        .or_else(|| config.default_profile.clone());
    let Some(profile_name) = profile_name else {
        return Ok(None);
    };
    if !config.profiles.contains_key(&profile_name) {
        if cli.profile.is_some() {
            return Err(eyre!("unknown profile '{profile_name}'"));
        }
        return Ok(None);
    }

    let backend = showroom_config::profile_to_backend_config(&config, &profile_name)
        .map_err(|e| eyre!("profile '{profile_name}': {e}"))?;
    Ok(Some(Showroom::new(backend)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    // Priority: CLI flags > config file
    let showroom = build_from_cli(&cli)?
        .or(build_from_config(&cli)?)
        .ok_or_else(|| {
            eyre!(
                "no backend configured: pass --backend-url or add a profile to {}",
                showroom_config::config_path().display()
            )
        })?;

    info!(url = %showroom.config().url, "starting showroom");

    let mut app = App::new(showroom);
    app.run().await?;

    Ok(())
}
