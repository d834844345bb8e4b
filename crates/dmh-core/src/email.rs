//! Derived email addresses.
//!
//! Addresses are never stored. They are computed from a department id, the
//! department's email prefix and a username:
//!
//! | Kind       | Shape |
//! |------------|-------|
//! | `standard` | `{username}@{department}.datamatchhub.com` |
//! | `short`    | `{username}.{prefix}@datamatchhub.com` |
//! | `internal` | `{username}@internal.datamatchhub.com` |

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{department::Department, Error, Result};

pub const DOMAIN: &str = "datamatchhub.com";

static USERNAME_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,20}$").expect("valid username regex"));
static STANDARD_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.datamatchhub\.com$")
    .expect("valid standard address regex")
});
static SHORT_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[a-zA-Z0-9_%+-]+\.[a-zA-Z0-9]+@datamatchhub\.com$")
    .expect("valid short address regex")
});

/// Reject usernames outside `^[a-zA-Z0-9_-]{3,20}$`.
pub fn validate_username(username: &str) -> Result<()> {
  if USERNAME_RE.is_match(username) {
    Ok(())
  } else {
    Err(Error::validation(format!("invalid username format: {username:?}")))
  }
}

/// The address forms derived for one user in one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailFormats {
  pub standard: String,
  pub short:    String,
  pub internal: String,
}

impl EmailFormats {
  /// Build all forms. The username is validated; the department id and
  /// prefix are trusted to come from a stored record.
  pub fn generate(department_id: &str, email_prefix: &str, username: &str) -> Result<Self> {
    validate_username(username)?;
    Ok(Self {
      standard: format!("{username}@{department_id}.{DOMAIN}"),
      short:    format!("{username}.{email_prefix}@{DOMAIN}"),
      internal: format!("{username}@internal.{DOMAIN}"),
    })
  }
}

/// Username limits, mirroring [`validate_username`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameRules {
  pub min_length: usize,
  pub max_length: usize,
  pub pattern:    String,
}

impl Default for UsernameRules {
  fn default() -> Self {
    Self {
      min_length: 3,
      max_length: 20,
      pattern:    USERNAME_RE.as_str().to_owned(),
    }
  }
}

/// Address templates for a department, with `{username}` as placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
  pub domain:              String,
  pub pattern:             String,
  pub alternative_pattern: String,
  pub username:            UsernameRules,
}

impl EmailConfig {
  pub fn for_department(dept: &Department) -> Self {
    let id = &dept.id;
    Self {
      domain:              format!("{id}.{DOMAIN}"),
      pattern:             format!("{{username}}@{id}.{DOMAIN}"),
      alternative_pattern: format!("{{username}}.{}@{DOMAIN}", dept.email_prefix),
      username:            UsernameRules::default(),
    }
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
  Standard,
  Short,
}

impl EmailKind {
  /// A local part of the form `user.tag` marks the short form; anything else
  /// is read as standard.
  pub fn detect(address: &str) -> Self {
    let local = address.split('@').next().unwrap_or_default();
    if local.split('.').count() == 2 { Self::Short } else { Self::Standard }
  }
}

/// Whether `address` is a well-formed platform address of the given kind.
/// Internal addresses are standard-form addresses under `internal.`.
pub fn is_valid_email(address: &str, kind: EmailKind) -> bool {
  match kind {
    EmailKind::Standard => STANDARD_RE.is_match(address),
    EmailKind::Short => SHORT_RE.is_match(address),
  }
}

/// The pieces recovered from a platform address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddress {
  pub kind:     EmailKind,
  pub username: String,
  /// The department id (standard form) or email prefix (short form).
  pub department_tag: String,
}

/// Split a platform address back into username and department tag.
pub fn parse_address(address: &str) -> Result<ParsedAddress> {
  let kind = EmailKind::detect(address);
  if !is_valid_email(address, kind) {
    return Err(Error::validation(format!("not a platform address: {address:?}")));
  }

  let (local, host) = address
    .split_once('@')
    .ok_or_else(|| Error::validation(format!("missing '@' in {address:?}")))?;

  let (username, tag) = match kind {
    EmailKind::Short => local
      .split_once('.')
      .ok_or_else(|| Error::validation(format!("missing prefix in {address:?}")))?,
    EmailKind::Standard => {
      let tag = host.split('.').next().unwrap_or_default();
      (local, tag)
    }
  };

  Ok(ParsedAddress {
    kind,
    username: username.to_owned(),
    department_tag: tag.to_owned(),
  })
}
