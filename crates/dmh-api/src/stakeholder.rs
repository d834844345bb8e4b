//! `POST /functions/update-stakeholder`: accept-or-reject stub.
//!
//! Mirrors the serverless placeholder the web client posts to: it validates
//! the envelope and echoes it back. Nothing is persisted.

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// Body: `{"type": "...", "stakeholderData": {...}}`.
///
/// - malformed JSON: 500 with the parse error
/// - missing `type` or `stakeholderData`: 400
/// - otherwise: 200 echoing both fields
pub async fn handler(body: String) -> (StatusCode, Json<Value>) {
  let data: Value = match serde_json::from_str(&body) {
    Ok(v) => v,
    Err(e) => {
      return (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Error updating stakeholder", "error": e.to_string() })),
      );
    }
  };

  let kind = data.get("type").filter(|v| is_present(v));
  let stakeholder = data.get("stakeholderData").filter(|v| is_present(v));
  let (Some(kind), Some(stakeholder)) = (kind, stakeholder) else {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({ "message": "Missing required fields" })),
    );
  };

  tracing::debug!(%kind, "stakeholder update accepted");
  (
    StatusCode::OK,
    Json(json!({
      "message": "Stakeholder updated successfully",
      "type": kind,
      "stakeholderData": stakeholder,
    })),
  )
}

/// `null`, `false`, `""` and `0` count as absent, like the web client.
fn is_present(v: &Value) -> bool {
  match v {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::String(s) => !s.is_empty(),
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::Array(_) | Value::Object(_) => true,
  }
}
