//! [`SqliteStore`]: the SQLite implementation of [`SnapshotStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use dmh_core::{snapshot::Snapshot, store::SnapshotStore};

use crate::{
  encode::{RawSnapshot, encode_dt, encode_snapshot},
  schema::SCHEMA,
  Result,
};

/// Row name under which the registry snapshot is kept.
pub const SNAPSHOT_NAME: &str = "department-store";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry snapshot store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SnapshotStore impl ──────────────────────────────────────────────────────

impl SnapshotStore for SqliteStore {
  type Error = crate::Error;

  async fn load(&self) -> Result<Option<Snapshot>> {
    let raw: Option<RawSnapshot> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT version, state_json, saved_at FROM snapshots WHERE name = ?1",
            rusqlite::params![SNAPSHOT_NAME],
            |row| {
              Ok(RawSnapshot {
                version:    row.get(0)?,
                state_json: row.get(1)?,
                saved_at:   row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    let Some(raw) = raw else { return Ok(None) };
    let (snapshot, saved_at) = raw.into_snapshot()?;
    tracing::debug!(%saved_at, version = snapshot.version, "loaded registry snapshot");
    Ok(Some(snapshot))
  }

  async fn save(&self, snapshot: &Snapshot) -> Result<()> {
    let (version, state_json) = encode_snapshot(snapshot)?;
    let saved_at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO snapshots (name, version, state_json, saved_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(name) DO UPDATE SET
             version    = excluded.version,
             state_json = excluded.state_json,
             saved_at   = excluded.saved_at",
          rusqlite::params![SNAPSHOT_NAME, version, state_json, saved_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
