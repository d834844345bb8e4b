//! The versioned, whole-registry persisted value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  department::{ArchivedDepartment, Department},
  Error, Result,
};

/// Version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  pub version:     u32,
  pub departments: BTreeMap<String, Department>,
  #[serde(default)]
  pub archived:    BTreeMap<String, ArchivedDepartment>,
}

impl Default for Snapshot {
  fn default() -> Self {
    Self {
      version:     SNAPSHOT_VERSION,
      departments: BTreeMap::new(),
      archived:    BTreeMap::new(),
    }
  }
}

impl Snapshot {
  /// Bring a loaded snapshot up to [`SNAPSHOT_VERSION`].
  ///
  /// Version 0 has the same shape as version 1 (the archive may simply be
  /// missing), so both are accepted unchanged apart from the version stamp.
  /// Snapshots written by a newer build are refused rather than guessed at.
  pub fn migrate(mut self) -> Result<Self> {
    match self.version {
      SNAPSHOT_VERSION => Ok(self),
      0 => {
        self.version = SNAPSHOT_VERSION;
        Ok(self)
      }
      found => Err(Error::UnsupportedVersion { found, current: SNAPSHOT_VERSION }),
    }
  }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  pub fn from_json(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }

  /// True when `id` is taken in either partition.
  pub(crate) fn contains(&self, id: &str) -> bool {
    self.departments.contains_key(id) || self.archived.contains_key(id)
  }
}
