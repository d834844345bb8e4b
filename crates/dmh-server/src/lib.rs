//! Server wiring for the DataMatchHub department registry.
//!
//! Loads [`ServerConfig`], opens the SQLite-backed [`Registry`], optionally
//! seeds the default departments and attaches a [`WebhookNotifier`], then
//! exposes the JSON API under `/api`.

pub mod error;
pub mod notify;

pub use error::{Error, Result};
pub use notify::WebhookNotifier;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use dmh_core::{
  Registry, RegistryOptions, department::default_departments, store::SnapshotStore,
};
use dmh_store_sqlite::SqliteStore;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered with
/// `DMH_`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  /// Insert the built-in departments that are missing on startup.
  #[serde(default = "default_seed")]
  pub seed_defaults: bool,
  /// Cap on change records kept per department.
  #[serde(default)]
  pub history_limit: Option<usize>,
  /// Where to POST `{type, data}` notifications after each mutation.
  #[serde(default)]
  pub notify_url:    Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/datamatchhub/registry.db") }
fn default_seed() -> bool { true }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay the `DMH_*` environment.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DMH"))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn registry_options(&self) -> RegistryOptions {
    RegistryOptions { history_limit: self.history_limit }
  }
}

// ─── Startup ──────────────────────────────────────────────────────────────────

/// Open the store named by `config`, load the registry, and apply seeding and
/// notification settings. Must run inside a tokio runtime.
pub async fn open_registry(config: &ServerConfig) -> Result<Registry<SqliteStore>> {
  let store_path = expand_tilde(&config.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
    && let Err(e) = std::fs::create_dir_all(parent)
  {
    tracing::warn!(error = %e, dir = ?parent, "could not create store directory");
  }

  let store = SqliteStore::open(&store_path).await?;
  prepare_registry(store, config).await
}

/// Registry setup shared by [`open_registry`] and tests.
pub async fn prepare_registry<S: SnapshotStore>(
  store: S,
  config: &ServerConfig,
) -> Result<Registry<S>> {
  let mut registry = Registry::open_with(store, config.registry_options()).await?;

  if config.seed_defaults {
    registry.seed(default_departments()).await?;
  }

  if let Some(url) = &config.notify_url {
    registry = registry.with_notifier(Arc::new(WebhookNotifier::spawn(url.clone())?));
    tracing::info!(%url, "forwarding registry notifications");
  }

  Ok(registry)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full HTTP surface: `/health` plus the JSON API nested under `/api`.
pub fn router<S>(registry: Arc<Registry<S>>) -> Router
where
  S: SnapshotStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", dmh_api::api_router(registry))
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
