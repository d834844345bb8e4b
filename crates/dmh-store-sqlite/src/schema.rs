//! SQL schema for the registry's SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` tracks the
//! schema itself; the snapshot's own format version lives in its row.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per named snapshot. The registry only ever writes
-- 'department-store', replacing it on every mutation.
CREATE TABLE IF NOT EXISTS snapshots (
    name        TEXT PRIMARY KEY,
    version     INTEGER NOT NULL,   -- snapshot format version
    state_json  TEXT NOT NULL,      -- full serialised Snapshot
    saved_at    TEXT NOT NULL       -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
