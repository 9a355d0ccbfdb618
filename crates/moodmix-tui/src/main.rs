mod action;
mod api;
mod app;
mod app_state;
mod carousel;
mod component;
mod components;
mod download;
mod generation;
mod mpv;
mod playback;
mod remix;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;

use moodmix_proto::config::{Config, TimelineMode};
use moodmix_proto::platform;

#[derive(Parser)]
#[command(name = "moodmix")]
#[command(about = "Turn a picture into a mood playlist, right in the terminal")]
#[command(version)]
struct Cli {
    /// Image to generate a playlist for; skips the upload screen
    image: Option<PathBuf>,

    /// Override the API base URL from config.toml
    #[arg(long = "api-base")]
    api_base: Option<String>,

    /// Generating-screen pacing: fast or slow
    #[arg(long)]
    timeline: Option<TimelineMode>,

    /// Directory for saved images and mixes
    #[arg(long = "downloads-dir")]
    downloads_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("moodmix log: {}", log_path.display());

    tracing::info!("moodmix starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config: {:#}; using defaults", e);
            Config::default()
        }
    };
    if let Some(base) = cli.api_base {
        config.api.base_url = base.trim_end_matches('/').to_string();
    }
    if let Some(mode) = cli.timeline {
        config.generation.timeline = mode;
    }
    if let Some(dir) = cli.downloads_dir {
        config.paths.downloads_dir = dir;
    }
    tracing::info!(
        "api base {}, timeline {:?}, downloads {:?}",
        config.api.base_url,
        config.generation.timeline,
        config.paths.downloads_dir
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(config, cli.image)?;
    app.run().await?;

    Ok(())
}
