//! Handlers for `/departments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/departments` | All active departments |
//! | `POST`   | `/departments` | Body: [`NewDepartment`]; returns 201 |
//! | `GET`    | `/departments/:id` | 404 if not active |
//! | `PATCH`  | `/departments/:id` | Body: [`UpdateBody`] |
//! | `DELETE` | `/departments/:id` | Archives; returns the archived record |
//! | `GET`    | `/departments/:id/emails` | `?username=` required |
//! | `GET`    | `/departments/:id/routes` | Route table |
//! | `GET`    | `/departments/:id/url` | Optional `?username=` |
//! | `GET`    | `/departments/:id/email-config` | Address templates and username rules |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use dmh_core::{
  Registry,
  department::{ArchivedDepartment, Department, DepartmentUpdate, NewDepartment},
  email::{EmailConfig, EmailFormats},
  route::DepartmentRoutes,
  store::SnapshotStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /departments`
pub async fn list<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
) -> Json<Vec<Department>> {
  Json(registry.list().await)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /departments`: returns 201 + the stored [`Department`].
pub async fn create<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Json(body): Json<NewDepartment>,
) -> Result<impl IntoResponse, ApiError> {
  let dept = registry.create(body).await?;
  Ok((StatusCode::CREATED, Json(dept)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /departments/:id`
pub async fn get_one<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
) -> Result<Json<Department>, ApiError> {
  let dept = registry
    .get(&id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;
  Ok(Json(dept))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /departments/:id`: the fields to change, plus
/// an optional `expectedUpdatedAt` guard against lost updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  #[serde(flatten)]
  pub changes:             DepartmentUpdate,
  pub expected_updated_at: Option<DateTime<Utc>>,
}

/// `PATCH /departments/:id`
pub async fn update<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Department>, ApiError> {
  let dept = registry
    .update_if_unmodified(&id, body.changes, body.expected_updated_at)
    .await?;
  Ok(Json(dept))
}

// ─── Archive ──────────────────────────────────────────────────────────────────

/// `DELETE /departments/:id`
pub async fn archive<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
) -> Result<Json<ArchivedDepartment>, ApiError> {
  Ok(Json(registry.archive(&id).await?))
}

// ─── Derived data ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UsernameParams {
  pub username: Option<String>,
}

/// `GET /departments/:id/emails?username=<name>`
pub async fn emails<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
  Query(params): Query<UsernameParams>,
) -> Result<Json<EmailFormats>, ApiError> {
  let username = params.username.unwrap_or_default();
  Ok(Json(registry.generate_email_formats(&id, &username).await?))
}

/// `GET /departments/:id/email-config`
pub async fn email_config<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
) -> Result<Json<EmailConfig>, ApiError> {
  Ok(Json(registry.email_config(&id).await?))
}

/// `GET /departments/:id/routes`
pub async fn routes<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
) -> Result<Json<DepartmentRoutes>, ApiError> {
  Ok(Json(registry.routes(&id).await?))
}

/// `GET /departments/:id/url[?username=<name>]`: body: `{"url":"/path/name"}`
pub async fn url<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Path(id): Path<String>,
  Query(params): Query<UsernameParams>,
) -> Result<Json<Value>, ApiError> {
  let url = registry
    .department_url(&id, params.username.as_deref())
    .await?;
  Ok(Json(json!({ "url": url })))
}
