//! Session store: the signed-in account and its bearer credential.
//!
//! The store is an owned value shared through `Arc`; the router and views get
//! it injected instead of reaching for a global.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use workportal_auth::UserSnapshot;

use crate::api::{ApiError, LoginForm, RegisterForm, SessionApi, SubmissionReceipt, TokenResponse};
use crate::credentials::CredentialStore;

#[derive(Debug, Default)]
struct SessionState {
    user: Option<Arc<UserSnapshot>>,
    error: Option<String>,
}

/// Current session and the operations that change it.
///
/// # Invariants
/// - The snapshot is replaced or cleared as a whole, never edited in place.
/// - At most one `/users/me/` fetch is in flight; callers that queued behind
///   a fetch reuse its outcome.
/// - A fetch outcome is dropped if the snapshot was replaced while the
///   request was in flight (logout, login, refresh).
/// - No operation returns an error: failures leave the session
///   unauthenticated and, for `login`, record a message in [`Self::last_error`].
pub struct SessionStore {
    api: Arc<dyn SessionApi>,
    credentials: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
    fetch_gate: Mutex<()>,
    /// Bumped whenever the snapshot is written (fetch outcome, invalidation, logout).
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("loading", &self.is_loading())
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

/// Marks the store as busy for the lifetime of the guard.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl SessionStore {
    pub fn new(api: Arc<dyn SessionApi>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            credentials,
            state: RwLock::new(SessionState::default()),
            fetch_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Snapshot of the signed-in account.
    pub fn user(&self) -> Option<Arc<UserSnapshot>> {
        self.read_state(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state(|s| s.user.is_some())
    }

    /// `true` while a fetch or sign-in is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Message of the last failed sign-in, for display.
    pub fn last_error(&self) -> Option<String> {
        self.read_state(|s| s.error.clone())
    }

    pub fn clear_error(&self) {
        self.write_state(|s| s.error = None);
    }

    /// Make sure the session is loaded.
    ///
    /// Uses the cached snapshot when there is one; otherwise fetches the
    /// current account. Returns whether the session is authenticated
    /// afterwards. Fetch failures of any kind are logged and read as "not
    /// signed in".
    pub async fn check_auth(&self) -> bool {
        if self.is_authenticated() {
            return true;
        }

        let observed = self.generation.load(Ordering::Acquire);
        let _gate = self.fetch_gate.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            tracing::debug!("reusing result of concurrent session fetch");
            return self.is_authenticated();
        }

        self.fetch().await
    }

    /// Drop the cached snapshot and fetch it again (e.g. after an apply/bind
    /// form changed the account's audit status).
    pub async fn refresh(&self) -> bool {
        self.invalidate();
        self.check_auth().await
    }

    async fn fetch(&self) -> bool {
        let _loading = LoadingGuard::enter(&self.in_flight);
        let started_at = self.generation.load(Ordering::Acquire);

        let outcome = match self.api.fetch_current_user().await {
            Ok(user) => Some(Arc::new(user)),
            Err(err) => {
                if err.is_unauthorized() {
                    tracing::debug!(error = %err, "no authenticated session");
                } else {
                    tracing::warn!(error = %err, "session fetch failed; treating as signed out");
                }
                None
            }
        };

        // A logout, login or refresh during the request makes its answer stale.
        if !self.replace_user_if_current(started_at, outcome.clone()) {
            tracing::debug!("discarding session fetch that raced a session change");
            return self.is_authenticated();
        }

        if let Some(user) = &outcome {
            tracing::debug!(
                username = user.username(),
                user_type = user.user_type_label(),
                "session loaded"
            );
        }
        outcome.is_some()
    }

    /// Sign in and load the new session.
    ///
    /// Returns the raw token response (including the backend's `redirect_to`
    /// and `message` hints) or `None` when sign-in failed; the failure message
    /// is available from [`Self::last_error`].
    pub async fn login(&self, form: &LoginForm) -> Option<TokenResponse> {
        let _loading = LoadingGuard::enter(&self.in_flight);
        self.clear_error();

        let token = match self.api.exchange_credentials(form).await {
            Ok(token) => token,
            Err(err) => {
                tracing::info!(username = %form.username, error = %err, "sign-in rejected");
                self.record_error(&err);
                return None;
            }
        };

        if let Err(err) = self.credentials.set(&token.access_token) {
            tracing::error!(error = %err, "failed to persist credential");
            self.write_state(|s| s.error = Some(err.to_string()));
            return None;
        }

        // A new credential means a new identity; never keep the previous snapshot.
        self.invalidate();
        self.check_auth().await;

        Some(token)
    }

    /// Sign out. The local session is always cleared, whatever the backend says.
    pub async fn logout(&self) {
        if let Err(err) = self.api.revoke().await {
            tracing::warn!(error = %err, "remote logout failed");
        }
        if let Err(err) = self.credentials.clear() {
            tracing::warn!(error = %err, "failed to remove stored credential");
        }
        self.replace_user(None);
    }

    /// Create an account. Does not sign in; failures are recorded in
    /// [`Self::last_error`].
    pub async fn register(&self, form: &RegisterForm) -> Option<SubmissionReceipt> {
        let _loading = LoadingGuard::enter(&self.in_flight);
        self.clear_error();

        match self.api.register(form).await {
            Ok(receipt) => {
                tracing::info!(username = %form.username, user_type = form.user_type.as_str(), "account registered");
                Some(receipt)
            }
            Err(err) => {
                tracing::info!(username = %form.username, error = %err, "registration rejected");
                self.record_error(&err);
                None
            }
        }
    }

    /// Submit the signed-in account's apply/bind form, then reload the
    /// session so the new audit status takes effect on the next navigation.
    pub async fn submit_onboarding(&self, application: &serde_json::Value) -> Option<SubmissionReceipt> {
        let Some(user_type) = self.user().and_then(|user| user.user_type()) else {
            self.write_state(|s| s.error = Some("no onboarding form for the current account".to_string()));
            return None;
        };

        let receipt = {
            let _loading = LoadingGuard::enter(&self.in_flight);
            self.clear_error();
            self.api.submit_onboarding(user_type, application).await
        };

        match receipt {
            Ok(receipt) => {
                tracing::info!(user_type = user_type.as_str(), "onboarding form submitted");
                self.refresh().await;
                Some(receipt)
            }
            Err(err) => {
                tracing::info!(user_type = user_type.as_str(), error = %err, "onboarding submission rejected");
                self.record_error(&err);
                if err.is_unauthorized() {
                    self.invalidate();
                }
                None
            }
        }
    }

    fn record_error(&self, err: &ApiError) {
        self.write_state(|s| s.error = Some(err.to_string()));
    }

    fn invalidate(&self) {
        self.replace_user(None);
    }

    fn replace_user(&self, user: Option<Arc<UserSnapshot>>) {
        self.write_state(|s| {
            s.user = user;
            self.generation.fetch_add(1, Ordering::AcqRel);
        });
    }

    /// Write `user` only if nothing replaced the snapshot since `expected`.
    ///
    /// Generation bumps happen under the state write lock, so the check and
    /// the write are atomic with respect to other writers.
    fn replace_user_if_current(&self, expected: u64, user: Option<Arc<UserSnapshot>>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != expected {
            return false;
        }
        state.user = user;
        self.generation.fetch_add(1, Ordering::AcqRel);
        true
    }

    fn read_state<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write_state(&self, f: impl FnOnce(&mut SessionState)) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}
