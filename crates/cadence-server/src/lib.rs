//! Cadence server: configuration, application assembly and the one-shot
//! CSV import used by the `cadence` binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use cadence_api::AppState;
use cadence_core::{
  book::{ContactBook, ImportResult},
  insights::InsightSource,
  persist::SnapshotStore,
  stage::WeekDay,
};
use cadence_insights::InsightsConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `cadence.toml` and `CADENCE_*`
/// environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path: PathBuf,
  pub insights:   InsightsConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       3000,
      store_path: PathBuf::from("~/.local/share/cadence/cadence.db"),
      insights:   InsightsConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Layer the file at `path` (optional) under the environment.
  ///
  /// Nested keys use a double underscore, e.g.
  /// `CADENCE_INSIGHTS__API_KEY`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(
        config::Environment::with_prefix("CADENCE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full HTTP application: the JSON API under `/api`, with request
/// tracing.
pub fn app<P, I>(state: AppState<P, I>) -> Router
where
  P: SnapshotStore + 'static,
  I: InsightSource + 'static,
{
  Router::new()
    .nest("/api", cadence_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── One-shot import ──────────────────────────────────────────────────────────

/// Outcome of [`import_file`], with each submitted row's CSV line.
#[derive(Debug, Clone)]
pub struct FileImport {
  pub result: ImportResult,
  /// Line each batch entry started on, indexed like the batch.
  pub lines:  Vec<usize>,
}

impl FileImport {
  /// CSV line of the batch entry at `row`.
  pub fn line_of(&self, row: usize) -> Option<usize> { self.lines.get(row).copied() }
}

/// Import the CSV at `path` into `book`, assigning every row to `day`.
pub fn import_file<P: SnapshotStore>(
  book: &mut ContactBook<P>,
  path: &Path,
  day: WeekDay,
) -> anyhow::Result<FileImport> {
  let csv = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  let rows = cadence_import::parse_rows(&csv)
    .with_context(|| format!("failed to parse {}", path.display()))?;

  let lines = rows.iter().map(|r| r.line).collect();
  let batch = rows.into_iter().map(|r| r.into_new_contact(day)).collect();
  let result = book.import_batch(batch).context("import failed")?;

  tracing::info!(
    succeeded = result.succeeded,
    failed = result.failed,
    "imported {}",
    path.display()
  );
  Ok(FileImport { result, lines })
}
