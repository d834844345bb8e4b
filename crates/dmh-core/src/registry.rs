//! [`Registry`]: the authoritative, persisted set of departments.
//!
//! State lives behind a single async mutex. Every mutation holds the lock
//! while it validates, builds the next snapshot on a copy, saves it through
//! the [`SnapshotStore`], and only then swaps it in. A failed validation or a
//! failed save therefore leaves both memory and storage untouched, and
//! concurrent updates to the same department serialise.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::Mutex;

use crate::{
  department::{ArchivedDepartment, ChangeRecord, Department, DepartmentUpdate, NewDepartment},
  email::{EmailConfig, EmailFormats},
  notify::{NoopNotifier, Notification, Notifier},
  route::{self, Breadcrumb, DepartmentRoutes},
  snapshot::Snapshot,
  store::SnapshotStore,
  Error, Result,
};

/// Tuning knobs for a [`Registry`].
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
  /// Keep at most this many change records per department, dropping the
  /// oldest first. `None` keeps everything.
  pub history_limit: Option<usize>,
}

pub struct Registry<S> {
  store:    S,
  state:    Mutex<Snapshot>,
  options:  RegistryOptions,
  notifier: Arc<dyn Notifier>,
}

impl<S: SnapshotStore> Registry<S> {
  /// Load the registry from `store`, starting empty if nothing was saved.
  pub async fn open(store: S) -> Result<Self> {
    Self::open_with(store, RegistryOptions::default()).await
  }

  pub async fn open_with(store: S, options: RegistryOptions) -> Result<Self> {
    let snapshot = match store.load().await.map_err(Error::storage)? {
      Some(stored) => stored.migrate()?,
      None => Snapshot::default(),
    };
    tracing::debug!(
      active = snapshot.departments.len(),
      archived = snapshot.archived.len(),
      "department registry loaded"
    );
    Ok(Self {
      store,
      state: Mutex::new(snapshot),
      options,
      notifier: Arc::new(NoopNotifier),
    })
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// A copy of the whole current state.
  pub async fn snapshot(&self) -> Snapshot { self.state.lock().await.clone() }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Insert a new department.
  ///
  /// Fails with [`Error::Conflict`] if the id is already used by an active
  /// or an archived department.
  pub async fn create(&self, input: NewDepartment) -> Result<Department> {
    input.validate()?;

    let mut state = self.state.lock().await;
    if state.contains(&input.id) {
      return Err(Error::Conflict(format!("department {} already exists", input.id)));
    }

    let dept = input.into_department(Utc::now());
    let mut next = state.clone();
    next.departments.insert(dept.id.clone(), dept.clone());
    self.commit(&mut state, next).await?;
    drop(state);

    tracing::info!(id = %dept.id, "department created");
    self.emit("department_created", json!(dept));
    Ok(dept)
  }

  /// Merge `update` over the department `id`.
  pub async fn update(&self, id: &str, update: DepartmentUpdate) -> Result<Department> {
    self.update_if_unmodified(id, update, None).await
  }

  /// Like [`update`](Self::update), but when `expected_updated_at` is given
  /// the update only applies if the stored `updatedAt` still equals it.
  pub async fn update_if_unmodified(
    &self,
    id: &str,
    update: DepartmentUpdate,
    expected_updated_at: Option<DateTime<Utc>>,
  ) -> Result<Department> {
    let mut state = self.state.lock().await;
    let current = state
      .departments
      .get(id)
      .ok_or_else(|| Error::NotFound(id.to_owned()))?;
    update.validate()?;

    if let Some(expected) = expected_updated_at
      && expected != current.updated_at
    {
      return Err(Error::Conflict(format!(
        "department {id} was modified at {}",
        current.updated_at.to_rfc3339()
      )));
    }

    let now = Utc::now();
    let mut dept = current.clone();
    update.apply_to(&mut dept);
    dept.updated_at = now;
    dept.change_history.push(ChangeRecord { timestamp: now, changes: update.clone() });
    if let Some(limit) = self.options.history_limit {
      let excess = dept.change_history.len().saturating_sub(limit);
      dept.change_history.drain(..excess);
    }

    let mut next = state.clone();
    next.departments.insert(id.to_owned(), dept.clone());
    self.commit(&mut state, next).await?;
    drop(state);

    tracing::info!(%id, "department updated");
    self.emit("department_updated", json!({ "id": id, "changes": update }));
    Ok(dept)
  }

  /// Move the department `id` into the archive.
  pub async fn archive(&self, id: &str) -> Result<ArchivedDepartment> {
    let mut state = self.state.lock().await;
    let mut next = state.clone();
    let department = next
      .departments
      .remove(id)
      .ok_or_else(|| Error::NotFound(id.to_owned()))?;

    let archived = ArchivedDepartment { department, archived_at: Utc::now() };
    next.archived.insert(id.to_owned(), archived.clone());
    self.commit(&mut state, next).await?;
    drop(state);

    tracing::info!(%id, "department archived");
    self.emit("department_archived", json!(archived));
    Ok(archived)
  }

  /// Create every department in `departments` whose id is not yet taken
  /// (active or archived), in a single save. Returns how many were added.
  pub async fn seed(&self, departments: Vec<NewDepartment>) -> Result<usize> {
    for input in &departments {
      input.validate()?;
    }

    let mut state = self.state.lock().await;
    let now = Utc::now();
    let mut next = state.clone();
    let mut added = 0;
    for input in departments {
      if next.contains(&input.id) {
        continue;
      }
      let dept = input.into_department(now);
      next.departments.insert(dept.id.clone(), dept);
      added += 1;
    }

    if added > 0 {
      self.commit(&mut state, next).await?;
      tracing::info!(added, "seeded default departments");
    }
    Ok(added)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get(&self, id: &str) -> Option<Department> {
    self.state.lock().await.departments.get(id).cloned()
  }

  /// All active departments, ordered by id.
  pub async fn list(&self) -> Vec<Department> {
    self.state.lock().await.departments.values().cloned().collect()
  }

  pub async fn get_archived(&self, id: &str) -> Option<ArchivedDepartment> {
    self.state.lock().await.archived.get(id).cloned()
  }

  pub async fn list_archived(&self) -> Vec<ArchivedDepartment> {
    self.state.lock().await.archived.values().cloned().collect()
  }

  /// Case-insensitive substring search over names and feature tags. A blank
  /// query matches every active department.
  pub async fn search(&self, query: &str) -> Vec<Department> {
    let needle = query.trim().to_lowercase();
    let state = self.state.lock().await;
    state
      .departments
      .values()
      .filter(|d| needle.is_empty() || d.matches(&needle))
      .cloned()
      .collect()
  }

  /// Routing paths of all active departments.
  pub async fn paths(&self) -> Vec<String> {
    self
      .state
      .lock()
      .await
      .departments
      .values()
      .map(|d| d.path.clone())
      .collect()
  }

  // ── Derived data ──────────────────────────────────────────────────────────

  pub async fn generate_email_formats(
    &self,
    department_id: &str,
    username: &str,
  ) -> Result<EmailFormats> {
    let dept = self.require(department_id).await?;
    EmailFormats::generate(&dept.id, &dept.email_prefix, username)
  }

  pub async fn department_url(&self, id: &str, username: Option<&str>) -> Result<String> {
    let dept = self.require(id).await?;
    route::department_url(&dept, username)
  }

  pub async fn routes(&self, id: &str) -> Result<DepartmentRoutes> {
    let dept = self.require(id).await?;
    Ok(DepartmentRoutes::for_department(&dept))
  }

  /// The route table of every active department, keyed by id.
  pub async fn all_routes(&self) -> BTreeMap<String, DepartmentRoutes> {
    let state = self.state.lock().await;
    route::dynamic_routes(state.departments.values())
  }

  pub async fn breadcrumbs(&self, location: &str) -> Vec<Breadcrumb> {
    let state = self.state.lock().await;
    route::breadcrumbs(location, state.departments.values())
  }

  pub async fn email_config(&self, id: &str) -> Result<EmailConfig> {
    let dept = self.require(id).await?;
    Ok(EmailConfig::for_department(&dept))
  }

  /// Whether `route` points at an active department page.
  pub async fn validate_route(&self, route: &str) -> bool {
    let state = self.state.lock().await;
    route::validate_route(route, state.departments.values())
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn require(&self, id: &str) -> Result<Department> {
    self
      .get(id)
      .await
      .ok_or_else(|| Error::NotFound(id.to_owned()))
  }

  async fn commit(&self, state: &mut Snapshot, next: Snapshot) -> Result<()> {
    self.store.save(&next).await.map_err(Error::storage)?;
    *state = next;
    Ok(())
  }

  fn emit(&self, kind: &str, data: serde_json::Value) {
    let notification = Notification::new(kind, data);
    if let Err(e) = self.notifier.notify(&notification) {
      tracing::warn!(error = %e, kind, "notifier failed; continuing");
    }
  }
}
