//! Static route table of the portal.
//!
//! Routes are declared once at startup, in match order. The navigation guard
//! only ever looks at [`RouteMeta`]; the view reference is for whoever renders
//! the page.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use workportal_auth::paths;
use workportal_core::{DomainError, DomainResult};

/// Who may open a route.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    #[default]
    Public,
    /// Only signed-in accounts.
    RequiresAuth,
    /// Only visitors without a session (login, registration).
    RequiresGuest,
}

/// Per-route access metadata.
///
/// Holding a single [`RouteAccess`] keeps "requires auth" and "requires
/// guest" mutually exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RouteMeta {
    access: RouteAccess,
}

impl RouteMeta {
    pub const fn public() -> Self {
        Self {
            access: RouteAccess::Public,
        }
    }

    pub const fn auth() -> Self {
        Self {
            access: RouteAccess::RequiresAuth,
        }
    }

    pub const fn guest() -> Self {
        Self {
            access: RouteAccess::RequiresGuest,
        }
    }

    /// Build from the two boolean flags used in declarative route tables.
    pub fn from_flags(requires_auth: bool, requires_guest: bool) -> DomainResult<Self> {
        match (requires_auth, requires_guest) {
            (true, true) => Err(DomainError::validation(
                "a route cannot require both an authenticated session and a guest",
            )),
            (true, false) => Ok(Self::auth()),
            (false, true) => Ok(Self::guest()),
            (false, false) => Ok(Self::public()),
        }
    }

    pub fn access(&self) -> RouteAccess {
        self.access
    }

    pub fn requires_auth(&self) -> bool {
        self.access == RouteAccess::RequiresAuth
    }

    pub fn requires_guest(&self) -> bool {
        self.access == RouteAccess::RequiresGuest
    }
}

/// Page component a route renders.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Register,
    Dashboard,
    ProjectList,
    ProjectDetail,
    ContractorViews,
    AreaManagement,
    StaffManagement,
    DepartmentMembers,
    AdminPermissionApply,
    EnterpriseBind,
    ContractorBind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    /// Pattern such as `/projects/:id`.
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub view: Option<View>,
    /// Static redirect applied before any guard runs.
    pub redirect: Option<&'static str>,
    pub meta: RouteMeta,
}

impl RouteRecord {
    pub fn page(path: &'static str, name: &'static str, view: View, meta: RouteMeta) -> Self {
        Self {
            path,
            name: Some(name),
            view: Some(view),
            redirect: None,
            meta,
        }
    }

    pub fn redirect(path: &'static str, to: &'static str) -> Self {
        Self {
            path,
            name: None,
            view: None,
            redirect: Some(to),
            meta: RouteMeta::public(),
        }
    }

    /// Match `path` (already normalized) against this record's pattern.
    fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let pattern: Vec<&str> = segments(self.path).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (expected, got) in pattern.iter().zip(&actual) {
            match expected.strip_prefix(':') {
                Some(name) => {
                    params.insert(name.to_string(), (*got).to_string());
                }
                None if expected == got => {}
                None => return None,
            }
        }
        Some(params)
    }
}

/// A route table entry matched against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    pub record: &'a RouteRecord,
    /// Normalized concrete path.
    pub path: String,
    pub params: BTreeMap<String, String>,
}

/// Ordered, immutable list of routes; the first match wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteRecord>) -> DomainResult<Self> {
        let mut names = HashSet::new();
        for route in &routes {
            if !route.path.starts_with('/') {
                return Err(DomainError::validation(format!(
                    "route path '{}' must start with '/'",
                    route.path
                )));
            }
            if let Some(name) = route.name {
                if !names.insert(name) {
                    return Err(DomainError::validation(format!("duplicate route name '{name}'")));
                }
            }
        }
        Ok(Self { routes })
    }

    /// Routes of the personnel/project portal.
    pub fn portal() -> Self {
        use RouteRecord as R;

        Self {
            routes: vec![
                R::page(paths::LOGIN, "Login", View::Login, RouteMeta::guest()),
                R::page("/register", "Register", View::Register, RouteMeta::guest()),
                R::redirect("/", paths::DASHBOARD),
                R::page(paths::DASHBOARD, "Dashboard", View::Dashboard, RouteMeta::auth()),
                R::page("/projects", "ProjectList", View::ProjectList, RouteMeta::auth()),
                R::page("/projects/:id", "ProjectDetail", View::ProjectDetail, RouteMeta::auth()),
                R::page("/contractor", "ContractorViews", View::ContractorViews, RouteMeta::auth()),
                R::page("/areas", "AreaManagement", View::AreaManagement, RouteMeta::auth()),
                R::page("/staff", "StaffManagement", View::StaffManagement, RouteMeta::auth()),
                R::page(
                    "/staff/departments/:deptId/members",
                    "DepartmentMembers",
                    View::DepartmentMembers,
                    RouteMeta::auth(),
                ),
                R::page(
                    paths::ADMIN_PERMISSION_APPLY,
                    "AdminPermissionApply",
                    View::AdminPermissionApply,
                    RouteMeta::auth(),
                ),
                R::page(paths::ENTERPRISE_BIND, "EnterpriseBind", View::EnterpriseBind, RouteMeta::auth()),
                R::page(paths::CONTRACTOR_BIND, "ContractorBind", View::ContractorBind, RouteMeta::auth()),
            ],
        }
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute<'_>> {
        let path = normalize_path(path);
        self.routes.iter().find_map(|record| {
            record.matches(&path).map(|params| ResolvedRoute {
                record,
                path: path.clone(),
                params,
            })
        })
    }

    /// Access metadata for `path`; unmatched paths are public.
    pub fn meta_for(&self, path: &str) -> RouteMeta {
        self.resolve(path)
            .map(|resolved| resolved.record.meta)
            .unwrap_or_default()
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteRecord> {
        self.routes.iter().find(|r| r.name == Some(name))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::portal()
    }
}

/// Strip query/fragment, collapse repeated slashes and drop a trailing slash.
pub fn normalize_path(raw: &str) -> String {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let joined = segments(without_query).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_flags_are_rejected() {
        assert!(RouteMeta::from_flags(true, true).is_err());
        assert!(RouteMeta::from_flags(true, false).unwrap().requires_auth());
        assert!(RouteMeta::from_flags(false, true).unwrap().requires_guest());
        assert_eq!(RouteMeta::from_flags(false, false).unwrap(), RouteMeta::public());
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("/dashboard/"), "/dashboard");
        assert_eq!(normalize_path("//projects//7?tab=plan#top"), "/projects/7");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("login"), "/login");
    }

    #[test]
    fn resolves_parameters() {
        let table = RouteTable::portal();
        let resolved = table.resolve("/staff/departments/12/members").unwrap();
        assert_eq!(resolved.record.name, Some("DepartmentMembers"));
        assert_eq!(resolved.params.get("deptId").map(String::as_str), Some("12"));
    }

    #[test]
    fn root_redirects_to_dashboard() {
        let table = RouteTable::portal();
        let resolved = table.resolve("/").unwrap();
        assert_eq!(resolved.record.redirect, Some(paths::DASHBOARD));
    }

    #[test]
    fn unmatched_paths_are_public() {
        let table = RouteTable::portal();
        assert!(table.resolve("/no/such/page").is_none());
        assert_eq!(table.meta_for("/no/such/page"), RouteMeta::public());
    }

    #[test]
    fn remediation_pages_require_auth() {
        let table = RouteTable::portal();
        for path in [paths::ADMIN_PERMISSION_APPLY, paths::ENTERPRISE_BIND, paths::CONTRACTOR_BIND] {
            assert!(table.meta_for(path).requires_auth(), "{path}");
        }
        assert!(table.meta_for(paths::LOGIN).requires_guest());
    }

    #[test]
    fn first_match_wins() {
        let table = RouteTable::new(vec![
            RouteRecord::page("/projects/new", "NewProject", View::ProjectDetail, RouteMeta::auth()),
            RouteRecord::page("/projects/:id", "ProjectDetail", View::ProjectDetail, RouteMeta::public()),
        ])
        .unwrap();
        assert_eq!(table.resolve("/projects/new").unwrap().record.name, Some("NewProject"));
        assert!(table.resolve("/projects/new").unwrap().params.is_empty());
    }

    #[test]
    fn table_validation() {
        let dup = RouteTable::new(vec![
            RouteRecord::page("/a", "A", View::Dashboard, RouteMeta::auth()),
            RouteRecord::page("/b", "A", View::Dashboard, RouteMeta::auth()),
        ]);
        assert!(dup.is_err());

        let relative = RouteTable::new(vec![RouteRecord::redirect("a", "/b")]);
        assert!(relative.is_err());

        assert!(RouteTable::portal().by_name("Dashboard").is_some());
    }
}
