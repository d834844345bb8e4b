//! Handlers for `/archive` endpoints (read-only).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use dmh_core::{Registry, department::ArchivedDepartment, store::SnapshotStore};

use crate::error::ApiError;

/// `GET /archive`
pub async fn list<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
) -> Json<Vec<ArchivedDepartment>> {
  Json(registry.list_archived().await)
}

/// `GET /archive/:id`
pub async fn get_one<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
) -> Result<Json<ArchivedDepartment>, ApiError> {
  let archived = registry
    .get_archived(&id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("archived department {id} not found")))?;
  Ok(Json(archived))
}
