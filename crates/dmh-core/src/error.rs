//! Error types for `dmh-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed input (absent `id`, blank `name`, bad username...).
  #[error("validation error: {0}")]
  Validation(String),

  /// The operation referenced an id that is not an active department.
  #[error("department not found: {0}")]
  NotFound(String),

  /// Duplicate id on create, or a stale `updatedAt` on a guarded update.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unsupported snapshot version {found} (newest known is {current})")]
  UnsupportedVersion { found: u32, current: u32 },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
