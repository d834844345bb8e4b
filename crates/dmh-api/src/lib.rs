//! JSON REST API for the DataMatchHub department registry.
//!
//! Exposes an axum [`Router`] backed by a shared [`Registry`] over any
//! [`SnapshotStore`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dmh_api::api_router(registry.clone()))
//! ```

pub mod archive;
pub mod departments;
pub mod error;
pub mod routing;
pub mod search;
pub mod stakeholder;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use dmh_core::{Registry, store::SnapshotStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `registry`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(registry: Arc<Registry<S>>) -> Router<()>
where
  S: SnapshotStore + 'static,
{
  Router::new()
    // Departments
    .route(
      "/departments",
      get(departments::list::<S>).post(departments::create::<S>),
    )
    .route(
      "/departments/{id}",
      get(departments::get_one::<S>)
        .patch(departments::update::<S>)
        .delete(departments::archive::<S>),
    )
    .route("/departments/{id}/emails", get(departments::emails::<S>))
    .route("/departments/{id}/routes", get(departments::routes::<S>))
    .route("/departments/{id}/url", get(departments::url::<S>))
    .route(
      "/departments/{id}/email-config",
      get(departments::email_config::<S>),
    )
    // Archive
    .route("/archive", get(archive::list::<S>))
    .route("/archive/{id}", get(archive::get_one::<S>))
    // Search and routing
    .route("/search", get(search::handler::<S>))
    .route("/paths", get(routing::paths::<S>))
    .route("/routes", get(routing::all::<S>))
    .route("/routes/validate", get(routing::validate::<S>))
    .route("/breadcrumbs", get(routing::breadcrumbs::<S>))
    // Stakeholder stub
    .route("/functions/update-stakeholder", post(stakeholder::handler))
    .with_state(registry)
    .layer(TraceLayer::new_for_http())
}
