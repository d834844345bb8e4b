//! Handlers for route discovery and validation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/paths` | Routing path of every active department |
//! | `GET`  | `/routes` | Route table of every active department, keyed by id |
//! | `GET`  | `/routes/validate` | `?route=/blogger/alice`; returns validity and params |
//! | `GET`  | `/breadcrumbs` | `?location=/blogger/alice` |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use dmh_core::{
  Registry,
  route::{Breadcrumb, DepartmentRoutes, RouteParams, parse_route},
  store::SnapshotStore,
};
use serde::{Deserialize, Serialize};

/// `GET /paths`
pub async fn paths<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
) -> Json<Vec<String>> {
  Json(registry.paths().await)
}

/// `GET /routes`
pub async fn all<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
) -> Json<BTreeMap<String, DepartmentRoutes>> {
  Json(registry.all_routes().await)
}

#[derive(Debug, Deserialize)]
pub struct BreadcrumbParams {
  #[serde(default)]
  pub location: String,
}

/// `GET /breadcrumbs?location=<path>`
pub async fn breadcrumbs<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Query(query): Query<BreadcrumbParams>,
) -> Json<Vec<Breadcrumb>> {
  Json(registry.breadcrumbs(&query.location).await)
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
  #[serde(default)]
  pub route: String,
}

#[derive(Debug, Serialize)]
pub struct RouteValidation {
  pub valid:  bool,
  /// Present only when the route is valid.
  pub params: Option<RouteParams>,
}

/// `GET /routes/validate?route=<route>`
pub async fn validate<S: SnapshotStore>(
  State(registry): State<Arc<Registry<S>>>,
  Query(query): Query<ValidateParams>,
) -> Json<RouteValidation> {
  let valid = registry.validate_route(&query.route).await;
  Json(RouteValidation {
    valid,
    params: valid.then(|| parse_route(&query.route)),
  })
}
