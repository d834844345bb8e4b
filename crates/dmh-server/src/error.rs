//! Error type for `dmh-server` startup and wiring.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("store error: {0}")]
  Store(#[from] dmh_store_sqlite::Error),

  #[error("registry error: {0}")]
  Registry(#[from] dmh_core::Error),

  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
