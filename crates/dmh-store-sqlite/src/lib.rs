//! SQLite backend for the DataMatchHub department registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The registry snapshot is stored as a
//! single row, replaced wholesale on every save.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SNAPSHOT_NAME, SqliteStore};
