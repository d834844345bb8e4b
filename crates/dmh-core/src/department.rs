//! Department records: the sole persisted entity of the registry.
//!
//! A department is keyed by an immutable `id`. Everything else is mutable
//! through [`DepartmentUpdate`], and every update leaves a [`ChangeRecord`]
//! behind on the record itself.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static SLUG_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug regex"));
static EMAIL_PREFIX_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{1,8}$").expect("valid email prefix regex"));

// ─── Records ─────────────────────────────────────────────────────────────────

/// An active department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
  pub id:             String,
  pub name:           String,
  /// URL slug used for routing (`/{path}/{username}`).
  pub path:           String,
  /// Short tag used by the abbreviated email form.
  pub email_prefix:   String,
  #[serde(default)]
  pub features:       BTreeSet<String>,
  #[serde(default)]
  pub default_stats:  BTreeMap<String, f64>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
  #[serde(default)]
  pub change_history: Vec<ChangeRecord>,
}

impl Department {
  /// Case-insensitive substring match against the name or any feature tag.
  /// `needle` must already be lowercased.
  pub(crate) fn matches(&self, needle: &str) -> bool {
    self.name.to_lowercase().contains(needle)
      || self
        .features
        .iter()
        .any(|f| f.to_lowercase().contains(needle))
  }
}

/// One entry in a department's change history: exactly the fields that a
/// single update supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
  pub timestamp: DateTime<Utc>,
  pub changes:   DepartmentUpdate,
}

/// A department that has been removed from the active set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedDepartment {
  #[serde(flatten)]
  pub department:  Department,
  pub archived_at: DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`Registry::create`](crate::Registry::create).
///
/// `id`, `name` and `path` are required. They default to empty strings when
/// deserialised so that an absent field surfaces as a validation error rather
/// than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
  #[serde(default)]
  pub id:            String,
  #[serde(default)]
  pub name:          String,
  #[serde(default)]
  pub path:          String,
  #[serde(default)]
  pub email_prefix:  Option<String>,
  #[serde(default)]
  pub features:      BTreeSet<String>,
  #[serde(default)]
  pub default_stats: BTreeMap<String, f64>,
}

impl NewDepartment {
  /// A department whose path defaults to its id.
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    let id = id.into();
    Self {
      path: id.clone(),
      id,
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn with_path(mut self, path: impl Into<String>) -> Self {
    self.path = path.into();
    self
  }

  pub fn with_email_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.email_prefix = Some(prefix.into());
    self
  }

  pub fn with_features<I, T>(mut self, features: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.features = features.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_stat(mut self, name: impl Into<String>, baseline: f64) -> Self {
    self.default_stats.insert(name.into(), baseline);
    self
  }

  /// Check required fields first (reporting all that are missing), then the
  /// format of each supplied field.
  pub fn validate(&self) -> Result<()> {
    let missing: Vec<&str> = [
      ("id", self.id.trim().is_empty()),
      ("name", self.name.trim().is_empty()),
      ("path", self.path.trim().is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();

    if !missing.is_empty() {
      return Err(Error::validation(format!(
        "missing required fields: {}",
        missing.join(", ")
      )));
    }

    validate_slug("id", &self.id)?;
    validate_slug("path", &self.path)?;
    if let Some(prefix) = self.email_prefix.as_deref().filter(|p| !p.is_empty()) {
      validate_email_prefix(prefix)?;
    }
    validate_stats(&self.default_stats)
  }

  /// Normalise into a stored record. Assumes [`validate`](Self::validate)
  /// has passed.
  pub(crate) fn into_department(self, now: DateTime<Utc>) -> Department {
    let email_prefix = self
      .email_prefix
      .filter(|p| !p.is_empty())
      .unwrap_or_else(|| default_email_prefix(&self.id));
    Department {
      id: self.id,
      name: self.name,
      path: self.path,
      email_prefix,
      features: self.features,
      default_stats: self.default_stats,
      created_at: now,
      updated_at: now,
      change_history: Vec::new(),
    }
  }
}

/// A partial update. Only the fields that are `Some` are applied, and only
/// those fields are serialised into the resulting [`ChangeRecord`].
///
/// `id` is deliberately absent: it is immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_prefix:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub features:      Option<BTreeSet<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_stats: Option<BTreeMap<String, f64>>,
}

impl DepartmentUpdate {
  pub fn name(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.path.is_none()
      && self.email_prefix.is_none()
      && self.features.is_none()
      && self.default_stats.is_none()
  }

  pub fn validate(&self) -> Result<()> {
    if self.is_empty() {
      return Err(Error::validation("update supplies no fields"));
    }
    if let Some(name) = &self.name
      && name.trim().is_empty()
    {
      return Err(Error::validation("name must not be empty"));
    }
    if let Some(path) = &self.path {
      validate_slug("path", path)?;
    }
    if let Some(prefix) = &self.email_prefix {
      validate_email_prefix(prefix)?;
    }
    if let Some(stats) = &self.default_stats {
      validate_stats(stats)?;
    }
    Ok(())
  }

  /// Merge the supplied fields over `dept`. Timestamps and history are the
  /// registry's business.
  pub(crate) fn apply_to(&self, dept: &mut Department) {
    if let Some(name) = &self.name {
      dept.name = name.clone();
    }
    if let Some(path) = &self.path {
      dept.path = path.clone();
    }
    if let Some(prefix) = &self.email_prefix {
      dept.email_prefix = prefix.clone();
    }
    if let Some(features) = &self.features {
      dept.features = features.clone();
    }
    if let Some(stats) = &self.default_stats {
      dept.default_stats = stats.clone();
    }
  }
}

// ─── Validation helpers ──────────────────────────────────────────────────────

fn validate_slug(field: &str, value: &str) -> Result<()> {
  if SLUG_RE.is_match(value) {
    Ok(())
  } else {
    Err(Error::validation(format!(
      "{field} must contain only letters, digits, '-' or '_': {value:?}"
    )))
  }
}

fn validate_email_prefix(prefix: &str) -> Result<()> {
  if EMAIL_PREFIX_RE.is_match(prefix) {
    Ok(())
  } else {
    Err(Error::validation(format!(
      "emailPrefix must be 1-8 letters or digits: {prefix:?}"
    )))
  }
}

/// JSON has no NaN or infinity, so a non-finite baseline could be saved but
/// never loaded back.
fn validate_stats(stats: &BTreeMap<String, f64>) -> Result<()> {
  match stats.iter().find(|(_, v)| !v.is_finite()) {
    Some((name, value)) => Err(Error::validation(format!(
      "defaultStats.{name} must be a finite number, got {value}"
    ))),
    None => Ok(()),
  }
}

/// First character of the id. Ids are validated as non-empty slugs before
/// this is called; the `"d"` fallback only guards direct misuse.
fn default_email_prefix(id: &str) -> String {
  id.chars()
    .next()
    .map_or_else(|| "d".to_owned(), |c| c.to_string())
}

// ─── Seed data ───────────────────────────────────────────────────────────────

/// The departments a fresh deployment starts with.
pub fn default_departments() -> Vec<NewDepartment> {
  vec![
    NewDepartment::new("blogger", "Blogger")
      .with_email_prefix("b")
      .with_features(["content", "analytics", "collaboration"])
      .with_stat("posts", 0.0)
      .with_stat("views", 0.0)
      .with_stat("followers", 0.0),
    NewDepartment::new("influencer", "Influencer")
      .with_email_prefix("i")
      .with_features(["engagement", "campaigns", "analytics"])
      .with_stat("followers", 0.0)
      .with_stat("engagement", 0.0)
      .with_stat("reach", 0.0),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_fields_are_all_reported() {
    let err = NewDepartment::default().validate().unwrap_err();
    assert!(
      matches!(&err, Error::Validation(m) if m.contains("id, name, path")),
      "{err}"
    );
  }

  #[test]
  fn new_defaults_path_from_id() {
    let nd = NewDepartment::new("expert", "Expert");
    assert_eq!(nd.path, "expert");
    assert!(nd.validate().is_ok());
  }

  #[test]
  fn slug_rejects_slashes_and_spaces() {
    let nd = NewDepartment::new("expert", "Expert").with_path("a/b");
    assert!(matches!(nd.validate(), Err(Error::Validation(_))));
    let nd = NewDepartment::new("my dept", "Mine");
    assert!(matches!(nd.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn email_prefix_defaults_to_first_char() {
    let dept = NewDepartment::new("expert", "Expert").into_department(Utc::now());
    assert_eq!(dept.email_prefix, "e");
  }

  #[test]
  fn empty_email_prefix_falls_back_to_default() {
    let nd = NewDepartment::new("expert", "Expert").with_email_prefix("");
    assert!(nd.validate().is_ok());
    assert_eq!(nd.into_department(Utc::now()).email_prefix, "e");
  }

  #[test]
  fn non_finite_stats_are_rejected() {
    let nd = NewDepartment::new("blogger", "Blogger").with_stat("reach", f64::NAN);
    assert!(matches!(nd.validate(), Err(Error::Validation(m)) if m.contains("reach")));

    let update = DepartmentUpdate {
      default_stats: Some(BTreeMap::from([("views".to_owned(), f64::INFINITY)])),
      ..DepartmentUpdate::default()
    };
    assert!(matches!(update.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn empty_update_is_rejected() {
    assert!(matches!(
      DepartmentUpdate::default().validate(),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn update_serialises_only_supplied_fields() {
    let json = serde_json::to_value(DepartmentUpdate::name("X")).unwrap();
    assert_eq!(json, serde_json::json!({ "name": "X" }));
  }

  #[test]
  fn archived_department_flattens_record() {
    let dept = NewDepartment::new("blogger", "Blogger").into_department(Utc::now());
    let archived = ArchivedDepartment { department: dept, archived_at: Utc::now() };
    let json = serde_json::to_value(&archived).unwrap();
    assert_eq!(json["id"], "blogger");
    assert!(json.get("archivedAt").is_some());

    let back: ArchivedDepartment = serde_json::from_value(json).unwrap();
    assert_eq!(back, archived);
  }
}
