//! The `SnapshotStore` port and an in-memory implementation.
//!
//! The trait is implemented by storage backends (e.g. `dmh-store-sqlite`).
//! The [`Registry`](crate::Registry) depends on this abstraction, not on any
//! concrete backend.

use std::{
  future::Future,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;

use crate::snapshot::Snapshot;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable home of the registry snapshot.
///
/// The registry calls [`save`](Self::save) with the complete next state on
/// every mutation; implementations replace what they hold atomically.
pub trait SnapshotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The last saved snapshot, or `None` if nothing has been saved yet.
  /// No migration is applied here.
  fn load(
    &self,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  /// Replace the stored snapshot.
  fn save<'a>(
    &'a self,
    snapshot: &'a Snapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("memory store is failing writes")]
  WritesFailing,
  #[error("memory store lock poisoned")]
  Poisoned,
}

/// A store that keeps the snapshot in process memory.
///
/// Cloning is cheap and clones share the same slot, so a test can hand one
/// clone to a registry and inspect or reload through another. Writes can be
/// made to fail on demand to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  slot:       Arc<Mutex<Option<Snapshot>>>,
  fail_saves: Arc<AtomicBool>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// A store that already holds `snapshot`.
  pub fn with_snapshot(snapshot: Snapshot) -> Self {
    let store = Self::default();
    if let Ok(mut slot) = store.slot.lock() {
      *slot = Some(snapshot);
    }
    store
  }

  /// Make subsequent saves fail (or succeed again).
  pub fn fail_saves(&self, fail: bool) { self.fail_saves.store(fail, Ordering::SeqCst); }

  /// The currently stored snapshot, if any.
  pub fn stored(&self) -> Option<Snapshot> {
    self.slot.lock().ok().and_then(|slot| slot.clone())
  }
}

impl SnapshotStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn load(&self) -> Result<Option<Snapshot>, MemoryStoreError> {
    let slot = self.slot.lock().map_err(|_| MemoryStoreError::Poisoned)?;
    Ok(slot.clone())
  }

  async fn save(&self, snapshot: &Snapshot) -> Result<(), MemoryStoreError> {
    if self.fail_saves.load(Ordering::SeqCst) {
      return Err(MemoryStoreError::WritesFailing);
    }
    let mut slot = self.slot.lock().map_err(|_| MemoryStoreError::Poisoned)?;
    *slot = Some(snapshot.clone());
    Ok(())
  }
}
