//! cadence server binary.
//!
//! Reads `cadence.toml` (or the path given with `--config`), opens the SQLite
//! snapshot store, and serves the JSON API over HTTP. The `import`
//! subcommand loads a CSV file into the store and exits.

use std::path::PathBuf;

use anyhow::Context as _;
use cadence_api::AppState;
use cadence_core::{book::ContactBook, stage::WeekDay};
use cadence_insights::ChatInsights;
use cadence_server::{ServerConfig, expand_tilde};
use cadence_store_sqlite::SqliteSnapshots;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cadence outreach tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cadence.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Import contacts from a CSV file and exit.
  Import {
    file: PathBuf,
    /// Weekday bucket for every imported contact.
    #[arg(short, long, default_value = "monday")]
    day:  WeekDay,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let snapshots = SqliteSnapshots::open(&store_path)
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let mut book = ContactBook::open(snapshots).context("failed to load contact book")?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Import { file, day } => {
      let import = cadence_server::import_file(&mut book, &file, day)?;
      let result = &import.result;
      println!("imported {} contacts, {} rows failed", result.succeeded, result.failed);
      for failure in &result.failures {
        let line = import.line_of(failure.row).unwrap_or(failure.row + 2);
        println!("  line {line}: missing {}", failure.missing.join(", "));
      }
      Ok(())
    }
    Command::Serve => {
      if cfg.insights.api_key.is_empty() {
        tracing::warn!("no insights API key configured; insight requests will fail");
      }
      let insights =
        ChatInsights::new(cfg.insights.clone()).context("failed to build insight client")?;
      let app = cadence_server::app(AppState::new(book, insights));
      let address = cfg.address();

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, app).await.context("server error")?;
      Ok(())
    }
  }
}
