//! Registry tests against the in-memory store.

use std::sync::{Arc, Mutex};

use crate::{
  department::{DepartmentUpdate, NewDepartment, default_departments},
  notify::{Notification, Notifier, NotifyError},
  snapshot::{SNAPSHOT_VERSION, Snapshot},
  store::MemoryStore,
  Error, Registry, RegistryOptions,
};

async fn registry() -> Registry<MemoryStore> {
  Registry::open(MemoryStore::new()).await.expect("open registry")
}

fn blogger() -> NewDepartment {
  NewDepartment::new("blogger", "Blogger")
    .with_email_prefix("b")
    .with_features(["content"])
}

fn influencer() -> NewDepartment { NewDepartment::new("influencer", "Influencer") }

// ─── Create / get / list ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get_returns_input_fields() {
  let r = registry().await;
  let created = r.create(NewDepartment::new("expert", "Expert")).await.unwrap();

  let fetched = r.get("expert").await.expect("department present");
  assert_eq!(fetched, created);
  assert_eq!(fetched.id, "expert");
  assert_eq!(fetched.name, "Expert");
  assert_eq!(fetched.path, "expert");
  assert_eq!(fetched.email_prefix, "e");
  assert_eq!(fetched.created_at, fetched.updated_at);
  assert!(fetched.change_history.is_empty());
}

#[tokio::test]
async fn create_requires_id_name_and_path() {
  let r = registry().await;
  let missing_path = NewDepartment { path: String::new(), ..NewDepartment::new("x1", "X") };
  assert!(matches!(r.create(missing_path).await, Err(Error::Validation(_))));
  assert!(matches!(
    r.create(NewDepartment::new("", "Nameless id")).await,
    Err(Error::Validation(_))
  ));
  assert!(matches!(
    r.create(NewDepartment::new("x2", "  ")).await,
    Err(Error::Validation(_))
  ));
  assert!(r.list().await.is_empty());
}

#[tokio::test]
async fn duplicate_create_conflicts_and_keeps_original() {
  let r = registry().await;
  let original = r.create(blogger()).await.unwrap();

  let err = r
    .create(NewDepartment::new("blogger", "Another Blogger"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)), "{err}");
  assert_eq!(r.get("blogger").await.unwrap(), original);
}

#[tokio::test]
async fn list_returns_all_active_ordered_by_id() {
  let r = registry().await;
  r.create(influencer()).await.unwrap();
  r.create(blogger()).await.unwrap();

  let ids: Vec<String> = r.list().await.into_iter().map(|d| d.id).collect();
  assert_eq!(ids, ["blogger", "influencer"]);
  assert_eq!(r.paths().await, ["blogger", "influencer"]);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let r = registry().await;
  assert!(r.get("nobody").await.is_none());
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_changes_only_supplied_fields_and_records_history() {
  let r = registry().await;
  let before = r.create(blogger()).await.unwrap();

  let after = r.update("blogger", DepartmentUpdate::name("X")).await.unwrap();

  assert_eq!(after.name, "X");
  assert_eq!(after.path, before.path);
  assert_eq!(after.email_prefix, before.email_prefix);
  assert_eq!(after.features, before.features);
  assert_eq!(after.default_stats, before.default_stats);
  assert_eq!(after.created_at, before.created_at);
  assert!(after.updated_at >= before.updated_at);

  assert_eq!(after.change_history.len(), 1);
  let record = &after.change_history[0];
  assert_eq!(record.changes, DepartmentUpdate::name("X"));
  assert_eq!(record.timestamp, after.updated_at);
  assert_eq!(
    serde_json::to_value(&record.changes).unwrap(),
    serde_json::json!({ "name": "X" })
  );

  assert_eq!(r.get("blogger").await.unwrap(), after);
}

#[tokio::test]
async fn update_missing_is_not_found() {
  let r = registry().await;
  let err = r.update("ghost", DepartmentUpdate::name("X")).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn missing_department_takes_precedence_over_empty_update() {
  let r = registry().await;
  let err = r.update("ghost", DepartmentUpdate::default()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn update_rejects_invalid_fields() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();

  let bad_path = DepartmentUpdate { path: Some("a b".into()), ..DepartmentUpdate::default() };
  assert!(matches!(r.update("blogger", bad_path).await, Err(Error::Validation(_))));
  assert!(matches!(
    r.update("blogger", DepartmentUpdate::default()).await,
    Err(Error::Validation(_))
  ));
  assert!(r.get("blogger").await.unwrap().change_history.is_empty());
}

#[tokio::test]
async fn stale_guarded_update_conflicts() {
  let r = registry().await;
  let created = r.create(blogger()).await.unwrap();
  let stamp = created.updated_at;

  r.update_if_unmodified("blogger", DepartmentUpdate::name("First"), Some(stamp))
    .await
    .unwrap();

  let err = r
    .update_if_unmodified("blogger", DepartmentUpdate::name("Second"), Some(stamp))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)), "{err}");

  let current = r.get("blogger").await.unwrap();
  assert_eq!(current.name, "First");
  assert_eq!(current.change_history.len(), 1);
}

#[tokio::test]
async fn history_limit_keeps_newest_records() {
  let options = RegistryOptions { history_limit: Some(2) };
  let r = Registry::open_with(MemoryStore::new(), options).await.unwrap();
  r.create(blogger()).await.unwrap();

  for name in ["A", "B", "C"] {
    r.update("blogger", DepartmentUpdate::name(name)).await.unwrap();
  }

  let history = r.get("blogger").await.unwrap().change_history;
  let names: Vec<_> = history.iter().filter_map(|c| c.changes.name.as_deref()).collect();
  assert_eq!(names, ["B", "C"]);
}

#[tokio::test]
async fn concurrent_updates_all_land_in_history() {
  let r = Arc::new(registry().await);
  r.create(blogger()).await.unwrap();

  let handles: Vec<_> = (0..8)
    .map(|i| {
      let r = Arc::clone(&r);
      tokio::spawn(async move {
        r.update("blogger", DepartmentUpdate::name(format!("n{i}"))).await
      })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap();
  }

  assert_eq!(r.get("blogger").await.unwrap().change_history.len(), 8);
}

// ─── Archive ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_moves_department_out_of_active_set() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();
  r.create(influencer()).await.unwrap();

  let archived = r.archive("blogger").await.unwrap();
  assert_eq!(archived.department.id, "blogger");

  assert!(r.get("blogger").await.is_none());
  assert_eq!(r.list().await.len(), 1);

  let looked_up = r.get_archived("blogger").await.expect("archived record");
  assert_eq!(looked_up, archived);
  assert!(looked_up.archived_at >= looked_up.department.updated_at);
  assert_eq!(r.list_archived().await.len(), 1);
}

#[tokio::test]
async fn archive_missing_is_not_found() {
  let r = registry().await;
  assert!(matches!(r.archive("ghost").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn archived_id_cannot_be_recreated_or_updated() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();
  r.archive("blogger").await.unwrap();

  assert!(matches!(r.create(blogger()).await, Err(Error::Conflict(_))));
  assert!(matches!(
    r.update("blogger", DepartmentUpdate::name("X")).await,
    Err(Error::NotFound(_))
  ));
  assert!(matches!(r.archive("blogger").await, Err(Error::NotFound(_))));
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_matches_name_case_insensitively() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();
  r.create(influencer()).await.unwrap();

  let hits = r.search("blog").await;
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].id, "blogger");

  assert_eq!(r.search("BLOG").await.len(), 1);
}

#[tokio::test]
async fn search_matches_features() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();
  r.create(influencer()).await.unwrap();

  let hits = r.search("content").await;
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].id, "blogger");
}

#[tokio::test]
async fn blank_search_returns_everything() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();
  r.create(influencer()).await.unwrap();

  assert_eq!(r.search("").await.len(), 2);
  assert_eq!(r.search("   ").await.len(), 2);
  assert!(r.search("nomatch").await.is_empty());
}

#[tokio::test]
async fn search_skips_archived() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();
  r.archive("blogger").await.unwrap();
  assert!(r.search("blog").await.is_empty());
}

// ─── Derived data ────────────────────────────────────────────────────────────

#[tokio::test]
async fn email_formats_for_blogger() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();

  let formats = r.generate_email_formats("blogger", "alice").await.unwrap();
  assert_eq!(formats.standard, "alice@blogger.datamatchhub.com");
  assert_eq!(formats.short, "alice.b@datamatchhub.com");
  assert_eq!(formats.internal, "alice@internal.datamatchhub.com");
}

#[tokio::test]
async fn email_formats_reject_bad_username_and_unknown_department() {
  let r = registry().await;
  r.create(blogger()).await.unwrap();

  assert!(matches!(
    r.generate_email_formats("blogger", "a!").await,
    Err(Error::Validation(_))
  ));
  assert!(matches!(
    r.generate_email_formats("ghost", "alice").await,
    Err(Error::NotFound(_))
  ));
}

#[tokio::test]
async fn routes_and_urls_follow_path() {
  let r = registry().await;
  r.create(NewDepartment::new("expert", "Expert").with_path("experts"))
    .await
    .unwrap();

  assert_eq!(r.department_url("expert", None).await.unwrap(), "/experts");
  assert_eq!(
    r.department_url("expert", Some("carol")).await.unwrap(),
    "/experts/carol"
  );
  assert_eq!(r.routes("expert").await.unwrap().api.base, "/api/expert");
  assert!(r.validate_route("/experts/carol").await);
  assert!(!r.validate_route("/expert/carol").await);
  assert!(matches!(r.routes("ghost").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn all_routes_breadcrumbs_and_email_config() {
  let r = registry().await;
  r.create(blogger().with_path("blog")).await.unwrap();
  r.create(influencer()).await.unwrap();
  r.archive("influencer").await.unwrap();

  let table = r.all_routes().await;
  assert_eq!(table.keys().collect::<Vec<_>>(), ["blogger"]);
  assert_eq!(table["blogger"].profile, "/blog/:username");

  let trail = r.breadcrumbs("/blog/settings").await;
  assert_eq!(trail[0].name, "Blogger");
  assert_eq!(trail[1].name, "Settings");

  let config = r.email_config("blogger").await.unwrap();
  assert_eq!(config.alternative_pattern, "{username}.b@datamatchhub.com");
  assert!(matches!(r.email_config("influencer").await, Err(Error::NotFound(_))));
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn reload_reproduces_active_and_archive() {
  let store = MemoryStore::new();
  let r = Registry::open(store.clone()).await.unwrap();
  r.create(blogger()).await.unwrap();
  r.create(influencer()).await.unwrap();
  r.create(NewDepartment::new("expert", "Expert")).await.unwrap();
  r.update("influencer", DepartmentUpdate::name("Influencers")).await.unwrap();
  r.archive("expert").await.unwrap();
  let before = r.snapshot().await;

  let reloaded = Registry::open(store).await.unwrap();
  let after = reloaded.snapshot().await;
  assert_eq!(after, before);
  assert_eq!(after.departments.len(), 2);
  assert_eq!(after.archived.len(), 1);
}

#[tokio::test]
async fn json_round_trip_is_lossless() {
  let r = registry().await;
  r.create(blogger().with_stat("followers", 12.5)).await.unwrap();
  r.update("blogger", DepartmentUpdate::name("Blog")).await.unwrap();
  r.create(influencer()).await.unwrap();
  r.archive("influencer").await.unwrap();

  let snap = r.snapshot().await;
  let back = Snapshot::from_json(&snap.to_json().unwrap()).unwrap();
  assert_eq!(back, snap);
}

#[tokio::test]
async fn non_finite_stats_never_reach_the_store() {
  let store = MemoryStore::new();
  let r = Registry::open(store.clone()).await.unwrap();
  let err = r.create(blogger().with_stat("reach", f64::NAN)).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert!(store.stored().is_none());

  r.create(blogger()).await.unwrap();
  let update = DepartmentUpdate {
    default_stats: Some([("views".to_owned(), f64::NEG_INFINITY)].into()),
    ..DepartmentUpdate::default()
  };
  assert!(matches!(r.update("blogger", update).await, Err(Error::Validation(_))));

  let reopened = Registry::open(store).await.unwrap();
  assert_eq!(reopened.snapshot().await, r.snapshot().await);
}

#[tokio::test]
async fn failed_save_leaves_state_unchanged() {
  let store = MemoryStore::new();
  let r = Registry::open(store.clone()).await.unwrap();
  r.create(blogger()).await.unwrap();
  let before = r.snapshot().await;

  store.fail_saves(true);
  assert!(matches!(r.create(influencer()).await, Err(Error::Storage(_))));
  assert!(matches!(
    r.update("blogger", DepartmentUpdate::name("X")).await,
    Err(Error::Storage(_))
  ));
  assert!(matches!(r.archive("blogger").await, Err(Error::Storage(_))));

  assert_eq!(r.snapshot().await, before);
  assert_eq!(store.stored(), Some(before));
}

#[tokio::test]
async fn future_snapshot_version_refuses_to_open() {
  let store = MemoryStore::with_snapshot(Snapshot {
    version: SNAPSHOT_VERSION + 1,
    ..Snapshot::default()
  });
  assert!(matches!(
    Registry::open(store).await,
    Err(Error::UnsupportedVersion { .. })
  ));
}

#[tokio::test]
async fn seed_adds_only_missing_defaults() {
  let r = registry().await;
  r.create(NewDepartment::new("blogger", "My Blog")).await.unwrap();

  assert_eq!(r.seed(default_departments()).await.unwrap(), 1);
  assert_eq!(r.get("blogger").await.unwrap().name, "My Blog");
  assert_eq!(r.get("influencer").await.unwrap().email_prefix, "i");

  assert_eq!(r.seed(default_departments()).await.unwrap(), 0);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder(Mutex<Vec<Notification>>);

impl Notifier for Recorder {
  fn notify(&self, n: &Notification) -> Result<(), NotifyError> {
    self.0.lock().unwrap().push(n.clone());
    Ok(())
  }
}

struct Broken;

impl Notifier for Broken {
  fn notify(&self, _n: &Notification) -> Result<(), NotifyError> {
    Err(NotifyError("endpoint down".into()))
  }
}

#[tokio::test]
async fn mutations_are_reported_to_notifier() {
  let recorder = Arc::new(Recorder::default());
  let r = registry().await.with_notifier(recorder.clone());
  r.create(blogger()).await.unwrap();
  r.update("blogger", DepartmentUpdate::name("X")).await.unwrap();
  r.archive("blogger").await.unwrap();

  let seen = recorder.0.lock().unwrap();
  let kinds: Vec<&str> = seen.iter().map(|n| n.kind.as_str()).collect();
  assert_eq!(kinds, ["department_created", "department_updated", "department_archived"]);
  assert_eq!(seen[1].data["changes"], serde_json::json!({ "name": "X" }));
}

#[tokio::test]
async fn failing_notifier_does_not_fail_update() {
  let r = registry().await.with_notifier(Arc::new(Broken));
  r.create(blogger()).await.unwrap();
  let updated = r.update("blogger", DepartmentUpdate::name("X")).await.unwrap();
  assert_eq!(updated.name, "X");
}
