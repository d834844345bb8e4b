//! Handler for `GET /search`.
//!
//! `q` is matched case-insensitively against department names and feature
//! tags. A missing or blank `q` returns every active department.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use dmh_core::{Registry, department::Department, store::SnapshotStore};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub q: Option<String>,
}

/// `GET /search[?q=...]`
pub async fn handler<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Query(params): Query<SearchParams>,
) -> Json<Vec<Department>> {
  Json(registry.search(params.q.as_deref().unwrap_or_default()).await)
}
