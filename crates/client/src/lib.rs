//! `workportal-client`
//!
//! **Responsibility:** client-side session handling and route access control
//! for the personnel/project portal.
//!
//! This crate provides:
//! - The session store (sign-in, sign-out, current account)
//! - Durable storage of the bearer credential
//! - The route table and the navigation guard that protects it
//!
//! Page rendering is out of scope; views only receive the router's decisions.

pub mod api;
pub mod config;
pub mod credentials;
pub mod guard;
pub mod http;
pub mod router;
pub mod routes;
pub mod session;

use std::sync::Arc;

pub use api::{ApiError, LoginForm, RegisterForm, SessionApi, SubmissionReceipt, TokenResponse};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use guard::{ExemptPaths, GuardStage, NavigationDecision, NavigationGuard};
pub use http::HttpSessionApi;
pub use router::{MAX_REDIRECTS, Navigation, NavigationError, Router};
pub use routes::{ResolvedRoute, RouteAccess, RouteMeta, RouteRecord, RouteTable, View};
pub use session::SessionStore;

/// Wire the HTTP-backed session store and the portal router from `config`.
pub fn connect(config: ClientConfig) -> Result<Router, ApiError> {
    let credentials: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(&config.token_path));
    let api = HttpSessionApi::new(config, Arc::clone(&credentials))?;
    let session = Arc::new(SessionStore::new(Arc::new(api), credentials));
    Ok(Router::new(RouteTable::portal(), NavigationGuard::new(session)))
}
