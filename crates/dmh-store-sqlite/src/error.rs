//! Error type for `dmh-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The stored version column does not fit a `u32`.
  #[error("invalid snapshot version in database: {0}")]
  InvalidVersion(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
