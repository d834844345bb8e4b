//! Route derivation for department pages.
//!
//! A department owns the URL space under `/{path}`. The second segment is
//! either a reserved section name or a username.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{department::Department, email::validate_username, Result};

/// Second-level segments that are never usernames.
pub const SECTIONS: [&str; 2] = ["settings", "analytics"];

/// The page and API routes belonging to one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRoutes {
  pub base:      String,
  pub profile:   String,
  pub settings:  String,
  pub analytics: String,
  pub api:       ApiRoutes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRoutes {
  pub base:     String,
  pub profiles: String,
  pub metrics:  String,
}

impl DepartmentRoutes {
  pub fn for_department(dept: &Department) -> Self {
    let path = &dept.path;
    let id = &dept.id;
    Self {
      base:      format!("/{path}"),
      profile:   format!("/{path}/:username"),
      settings:  format!("/{path}/settings"),
      analytics: format!("/{path}/analytics"),
      api:       ApiRoutes {
        base:     format!("/api/{id}"),
        profiles: format!("/api/{id}/profiles"),
        metrics:  format!("/api/{id}/metrics"),
      },
    }
  }
}

/// Route tables for many departments, keyed by department id.
pub fn dynamic_routes<'a, I>(departments: I) -> BTreeMap<String, DepartmentRoutes>
where
  I: IntoIterator<Item = &'a Department>,
{
  departments
    .into_iter()
    .map(|d| (d.id.clone(), DepartmentRoutes::for_department(d)))
    .collect()
}

/// `/{path}` or `/{path}/{username}`. The username is validated when given.
pub fn department_url(dept: &Department, username: Option<&str>) -> Result<String> {
  match username.filter(|u| !u.is_empty()) {
    Some(user) => {
      validate_username(user)?;
      Ok(format!("/{}/{user}", dept.path))
    }
    None => Ok(format!("/{}", dept.path)),
  }
}

/// The parameters carried by a department route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub department: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub section:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub username:   Option<String>,
}

/// Extract parameters without checking them against any registry.
pub fn parse_route(route: &str) -> RouteParams {
  let mut segments = route.split('/').filter(|s| !s.is_empty());
  let mut params = RouteParams {
    department: segments.next().map(str::to_owned),
    ..RouteParams::default()
  };
  if let Some(second) = segments.next() {
    if SECTIONS.contains(&second) {
      params.section = Some(second.to_owned());
    } else {
      params.username = Some(second.to_owned());
    }
  }
  params
}

/// A route is valid when its first segment is the path of one of
/// `departments`, and its optional second segment is a section or a
/// well-formed username. Deeper routes are rejected.
pub fn validate_route<'a, I>(route: &str, departments: I) -> bool
where
  I: IntoIterator<Item = &'a Department>,
{
  let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
  let (first, rest) = match segments.split_first() {
    Some(split) => split,
    None => return false,
  };

  if !departments.into_iter().any(|d| d.path == *first) {
    return false;
  }

  match rest {
    [] => true,
    [second] => SECTIONS.contains(second) || validate_username(second).is_ok(),
    _ => false,
  }
}

// ─── Breadcrumbs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
  pub name:    String,
  pub href:    String,
  /// Set on the crumb for the page being viewed.
  pub current: bool,
}

/// Navigation trail for `location`.
///
/// The first segment yields the department's name if it is a known path and
/// nothing otherwise. The second segment is always the last crumb: a section
/// title or the username as given. Deeper segments are ignored.
pub fn breadcrumbs<'a, I>(location: &str, departments: I) -> Vec<Breadcrumb>
where
  I: IntoIterator<Item = &'a Department>,
{
  let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
  let mut crumbs = Vec::new();

  let Some(first) = segments.first() else {
    return crumbs;
  };
  if let Some(dept) = departments.into_iter().find(|d| d.path == *first) {
    crumbs.push(Breadcrumb {
      name:    dept.name.clone(),
      href:    format!("/{first}"),
      current: segments.len() == 1,
    });
  }

  if let Some(second) = segments.get(1) {
    let name = match *second {
      "settings" => "Settings".to_owned(),
      "analytics" => "Analytics".to_owned(),
      user => user.to_owned(),
    };
    crumbs.push(Breadcrumb {
      name,
      href: format!("/{first}/{second}"),
      current: true,
    });
  }
  crumbs
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::department::NewDepartment;

  fn blogger() -> Department {
    NewDepartment::new("blogger", "Blogger")
      .with_path("blog")
      .into_department(Utc::now())
  }

  #[test]
  fn routes_use_path_for_pages_and_id_for_api() {
    let routes = DepartmentRoutes::for_department(&blogger());
    assert_eq!(routes.base, "/blog");
    assert_eq!(routes.profile, "/blog/:username");
    assert_eq!(routes.settings, "/blog/settings");
    assert_eq!(routes.api.profiles, "/api/blogger/profiles");
  }

  #[test]
  fn url_with_and_without_username() {
    let dept = blogger();
    assert_eq!(department_url(&dept, None).unwrap(), "/blog");
    assert_eq!(department_url(&dept, Some("alice")).unwrap(), "/blog/alice");
    assert!(department_url(&dept, Some("a!")).is_err());
  }

  #[test]
  fn parse_distinguishes_sections_from_usernames() {
    let p = parse_route("/blog/settings");
    assert_eq!(p.department.as_deref(), Some("blog"));
    assert_eq!(p.section.as_deref(), Some("settings"));
    assert!(p.username.is_none());

    let p = parse_route("/blog/alice/");
    assert_eq!(p.username.as_deref(), Some("alice"));

    assert_eq!(parse_route("/"), RouteParams::default());
  }

  #[test]
  fn dynamic_routes_are_keyed_by_id() {
    let influencer = NewDepartment::new("influencer", "Influencer").into_department(Utc::now());
    let table = dynamic_routes([&blogger(), &influencer]);
    assert_eq!(table.len(), 2);
    assert_eq!(table["blogger"].base, "/blog");
    assert_eq!(table["influencer"].api.base, "/api/influencer");
  }

  #[test]
  fn breadcrumbs_name_department_then_section_or_user() {
    let depts = [blogger()];

    let trail = breadcrumbs("/blog", &depts);
    assert_eq!(
      trail,
      [Breadcrumb { name: "Blogger".into(), href: "/blog".into(), current: true }]
    );

    let trail = breadcrumbs("/blog/analytics", &depts);
    assert_eq!(trail.len(), 2);
    assert!(!trail[0].current);
    assert_eq!(trail[1].name, "Analytics");
    assert_eq!(trail[1].href, "/blog/analytics");

    let trail = breadcrumbs("/blog/alice/extra", &depts);
    assert_eq!(trail[1].name, "alice");
    assert_eq!(trail.len(), 2);

    let trail = breadcrumbs("/vlog/alice", &depts);
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].name, "alice");

    assert!(breadcrumbs("/", &depts).is_empty());
  }

  #[test]
  fn validate_checks_department_and_second_segment() {
    let depts = [blogger()];
    assert!(validate_route("/blog", &depts));
    assert!(validate_route("/blog/analytics", &depts));
    assert!(validate_route("/blog/alice", &depts));
    assert!(!validate_route("/blog/a!", &depts));
    assert!(!validate_route("/vlog/alice", &depts));
    assert!(!validate_route("/", &depts));
    assert!(!validate_route("/blog/alice/extra", &depts));
  }
}
