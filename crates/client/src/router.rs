//! Router driver: resolves a requested path, runs the guard and follows its
//! redirects until a page is allowed.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::guard::{NavigationDecision, NavigationGuard};
use crate::routes::{RouteTable, View, normalize_path};

/// Upper bound on redirects (static and guard-issued) per navigation.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("redirect loop while navigating to '{requested}': {}", .chain.join(" -> "))]
    RedirectLoop { requested: String, chain: Vec<String> },
}

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub requested: String,
    pub path: String,
    pub route_name: Option<&'static str>,
    pub view: Option<View>,
    pub params: BTreeMap<String, String>,
    /// Intermediate paths visited because of redirects, in order.
    pub redirects: Vec<String>,
    /// Guard decision for `path`. A redirect here points at `path` itself:
    /// the page is where the account is being sent, not one it was let into.
    pub decision: NavigationDecision,
}

impl Navigation {
    pub fn was_redirected(&self) -> bool {
        !self.redirects.is_empty()
    }

    /// `true` when the guard ended the navigation by redirecting to the
    /// current page rather than allowing it.
    pub fn settled_on_redirect(&self) -> bool {
        !self.decision.is_allow()
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
}

impl Router {
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        Self { table, guard }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Navigate to `path`, re-running the guard on every redirect target.
    ///
    /// A guard redirect to the page being opened ends the navigation there.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, NavigationError> {
        let requested = normalize_path(path);
        let mut current = requested.clone();
        let mut redirects = Vec::new();

        loop {
            let resolved = self.table.resolve(&current);

            if let Some(target) = resolved.as_ref().and_then(|r| r.record.redirect) {
                current = self.hop(&requested, &mut redirects, current, target)?;
                continue;
            }

            let meta = resolved
                .as_ref()
                .map(|r| r.record.meta)
                .unwrap_or_default();

            let decision = self.guard.decide(&current, meta).await;
            if let NavigationDecision::RedirectTo(target) = &decision {
                let next = normalize_path(target);
                if next != current {
                    current = self.hop(&requested, &mut redirects, current, &next)?;
                    continue;
                }
            }

            tracing::info!(requested = %requested, path = %current, hops = redirects.len(), "navigation complete");
            return Ok(Navigation {
                requested,
                route_name: resolved.as_ref().and_then(|r| r.record.name),
                view: resolved.as_ref().and_then(|r| r.record.view),
                params: resolved.map(|r| r.params).unwrap_or_default(),
                path: current,
                redirects,
                decision,
            });
        }
    }

    fn hop(
        &self,
        requested: &str,
        redirects: &mut Vec<String>,
        from: String,
        to: &str,
    ) -> Result<String, NavigationError> {
        redirects.push(from);
        let next = normalize_path(to);

        if redirects.len() > MAX_REDIRECTS {
            let mut chain = redirects.clone();
            chain.push(next);
            tracing::error!(requested = %requested, "redirect loop detected");
            return Err(NavigationError::RedirectLoop {
                requested: requested.to_string(),
                chain,
            });
        }

        Ok(next)
    }
}
