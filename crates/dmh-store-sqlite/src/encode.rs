//! Encoding and decoding helpers between the registry snapshot and the
//! plain-text columns stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings. The snapshot itself is stored
//! as compact JSON next to an integer copy of its version.

use chrono::{DateTime, Utc};
use dmh_core::snapshot::Snapshot;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<(i64, String)> {
  Ok((i64::from(snapshot.version), serde_json::to_string(snapshot)?))
}

/// A `snapshots` row as read from the database, before decoding.
pub struct RawSnapshot {
  pub version:    i64,
  pub state_json: String,
  pub saved_at:   String,
}

impl RawSnapshot {
  /// Decode the row into the snapshot and the time it was saved. The
  /// `version` column is authoritative over the copy embedded in the JSON.
  pub fn into_snapshot(self) -> Result<(Snapshot, DateTime<Utc>)> {
    let saved_at = decode_dt(&self.saved_at)?;
    let mut snapshot: Snapshot = serde_json::from_str(&self.state_json)?;
    snapshot.version =
      u32::try_from(self.version).map_err(|_| Error::InvalidVersion(self.version))?;
    Ok((snapshot, saved_at))
  }
}
