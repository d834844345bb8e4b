//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Body text of every 500 response. Store details only go to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<dmh_core::Error> for ApiError {
  fn from(e: dmh_core::Error) -> Self {
    match e {
      dmh_core::Error::Validation(m) => ApiError::BadRequest(m),
      dmh_core::Error::NotFound(id) => {
        ApiError::NotFound(format!("department {id} not found"))
      }
      dmh_core::Error::Conflict(m) => ApiError::Conflict(m),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "registry failure");
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
