//! Navigation guard: decides, for every route transition, whether to let it
//! through or where to send the user instead.
//!
//! Each call runs `Start → SessionEnsured → Evaluated → Decided` and keeps no
//! state of its own between transitions; the only shared state is the
//! [`SessionStore`] cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use workportal_auth::{AccessVerdict, evaluate, paths};

use crate::routes::{RouteMeta, normalize_path};
use crate::session::SessionStore;

/// Outcome of one navigation attempt. Never cached across transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum NavigationDecision {
    Allow,
    RedirectTo(String),
}

impl NavigationDecision {
    pub fn redirect(path: impl Into<String>) -> Self {
        Self::RedirectTo(path.into())
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<AccessVerdict> for NavigationDecision {
    fn from(verdict: AccessVerdict) -> Self {
        match verdict {
            AccessVerdict::Allow => Self::Allow,
            AccessVerdict::RedirectTo(path) => Self::redirect(path),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardStage {
    Start,
    SessionEnsured,
    Evaluated,
    Decided,
}

/// Self-service pages that may be visited while the account is still being
/// onboarded, because they are where onboarding happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptPaths(BTreeSet<String>);

impl ExemptPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(paths.into_iter().map(|p| normalize_path(p.as_ref())).collect())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }
}

impl Default for ExemptPaths {
    fn default() -> Self {
        Self::new([
            paths::ADMIN_PERMISSION_APPLY,
            paths::ENTERPRISE_BIND,
            paths::CONTRACTOR_BIND,
        ])
    }
}

/// The per-navigation decision function.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    session: Arc<SessionStore>,
    exempt: ExemptPaths,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            exempt: ExemptPaths::default(),
        }
    }

    pub fn with_exempt_paths(mut self, exempt: ExemptPaths) -> Self {
        self.exempt = exempt;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Decide a transition to `to`, whose route carries `meta`.
    ///
    /// The only suspension point is the session fetch for auth-required
    /// routes. Every call resolves to a decision.
    pub async fn decide(&self, to: &str, meta: RouteMeta) -> NavigationDecision {
        let to = normalize_path(to);
        trace_stage(GuardStage::Start, &to);

        let decision = if meta.requires_auth() {
            self.decide_protected(&to).await
        } else if meta.requires_guest() {
            self.decide_guest_only(&to)
        } else {
            NavigationDecision::Allow
        };

        tracing::debug!(stage = ?GuardStage::Decided, path = %to, decision = ?decision, "navigation decided");
        decision
    }

    async fn decide_protected(&self, to: &str) -> NavigationDecision {
        if !self.session.is_authenticated() && !self.session.check_auth().await {
            return NavigationDecision::redirect(paths::LOGIN);
        }
        trace_stage(GuardStage::SessionEnsured, to);

        let user = self.session.user();
        let verdict = evaluate(user.as_deref());
        trace_stage(GuardStage::Evaluated, to);

        let exempt = self.exempt.contains(to);
        match verdict {
            // Onboarding already done: the apply/bind form is no longer reachable.
            AccessVerdict::Allow if exempt => NavigationDecision::redirect(paths::DASHBOARD),
            AccessVerdict::Allow => NavigationDecision::Allow,
            // An exempt page only waives the redirect that points at itself;
            // pending or unrecognized accounts are still sent to login.
            AccessVerdict::RedirectTo(target) if exempt && target == to => NavigationDecision::Allow,
            redirect => redirect.into(),
        }
    }

    /// Guest-only pages never trigger a fetch; anonymous visitors pass.
    fn decide_guest_only(&self, to: &str) -> NavigationDecision {
        let Some(user) = self.session.user() else {
            return NavigationDecision::Allow;
        };
        trace_stage(GuardStage::SessionEnsured, to);

        let verdict = evaluate(Some(user.as_ref()));
        trace_stage(GuardStage::Evaluated, to);

        match verdict {
            AccessVerdict::Allow => NavigationDecision::redirect(paths::DASHBOARD),
            redirect => redirect.into(),
        }
    }
}

fn trace_stage(stage: GuardStage, path: &str) {
    tracing::debug!(stage = ?stage, path = %path, "navigation guard");
}
