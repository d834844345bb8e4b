//! Core types and the department registry for DataMatchHub.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Persistence is reached through the [`store::SnapshotStore`] port; concrete
//! backends (e.g. `dmh-store-sqlite`) live in their own crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod department;
pub mod email;
pub mod error;
pub mod notify;
pub mod registry;
pub mod route;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
pub use registry::{Registry, RegistryOptions};

#[cfg(test)]
mod tests;
