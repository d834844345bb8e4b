//! Optional notification sink for registry mutations.
//!
//! The registry reports each successful mutation to a [`Notifier`]. Delivery
//! is best-effort: a failing notifier is logged and otherwise ignored, so
//! registry correctness never depends on it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The `{type, data}` payload sent to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  #[serde(rename = "type")]
  pub kind: String,
  pub data: Value,
}

impl Notification {
  pub fn new(kind: impl Into<String>, data: Value) -> Self {
    Self { kind: kind.into(), data }
  }
}

#[derive(Debug, Error)]
#[error("notification rejected: {0}")]
pub struct NotifyError(pub String);

/// Receives notifications. Implementations must not block: anything slow
/// (network delivery) belongs on a background task.
pub trait Notifier: Send + Sync {
  fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> { Ok(()) }
}
