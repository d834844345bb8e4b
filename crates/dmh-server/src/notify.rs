//! [`WebhookNotifier`]: forwards registry notifications over HTTP.

use std::time::Duration;

use dmh_core::notify::{Notification, Notifier, NotifyError};
use reqwest::Client;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::Result;

/// Notifications waiting for delivery before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Queues notifications and POSTs them as JSON from a background task.
///
/// [`Notifier::notify`] never waits on the network. It fails when the queue
/// is full or the delivery task has stopped. Delivery failures are logged
/// and dropped.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  tx: mpsc::Sender<Notification>,
}

impl WebhookNotifier {
  /// Start the delivery task. Must be called inside a tokio runtime.
  pub fn spawn(url: String) -> Result<Self> {
    Self::spawn_with_capacity(url, DEFAULT_QUEUE_CAPACITY)
  }

  /// Like [`spawn`](Self::spawn) with an explicit queue size. `capacity`
  /// is raised to 1 if zero.
  pub fn spawn_with_capacity(url: String, capacity: usize) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()?;
    let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));

    tokio::spawn(async move {
      while let Some(notification) = rx.recv().await {
        match client.post(&url).json(&notification).send().await {
          Ok(resp) if resp.status().is_success() => {
            tracing::debug!(kind = %notification.kind, "notification delivered");
          }
          Ok(resp) => {
            tracing::warn!(
              kind = %notification.kind,
              status = %resp.status(),
              "notification endpoint rejected payload"
            );
          }
          Err(e) => {
            tracing::warn!(kind = %notification.kind, error = %e, "notification delivery failed");
          }
        }
      }
    });

    Ok(Self { tx })
  }
}

impl Notifier for WebhookNotifier {
  fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
    self.tx.try_send(notification.clone()).map_err(|e| {
      let reason = match e {
        TrySendError::Full(_) => "webhook queue is full; notification dropped",
        TrySendError::Closed(_) => "webhook delivery task has stopped",
      };
      NotifyError(reason.to_owned())
    })
  }
}
