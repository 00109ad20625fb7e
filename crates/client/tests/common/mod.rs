#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use workportal_auth::{UserPayload, UserSnapshot, UserType};
use workportal_client::{
    ApiError, CredentialStore, LoginForm, MemoryCredentialStore, NavigationGuard, RegisterForm, SessionApi,
    SessionStore, SubmissionReceipt, TokenResponse,
};

/// `SessionApi` fake whose answers are set by the test.
#[derive(Debug)]
pub struct ScriptedApi {
    user: Mutex<Result<UserSnapshot, ApiError>>,
    token: Mutex<Result<TokenResponse, ApiError>>,
    revoke: Mutex<Result<(), ApiError>>,
    submission: Mutex<Result<SubmissionReceipt, ApiError>>,
    submitted: Mutex<Vec<(UserType, serde_json::Value)>>,
    delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
    exchanges: AtomicUsize,
    revokes: AtomicUsize,
}

impl ScriptedApi {
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self {
            user: Mutex::new(Err(ApiError::Unauthorized("no stored credential".to_string()))),
            token: Mutex::new(Err(ApiError::Unauthorized("Incorrect username or password".to_string()))),
            revoke: Mutex::new(Ok(())),
            submission: Mutex::new(Ok(receipt("submitted"))),
            submitted: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            exchanges: AtomicUsize::new(0),
            revokes: AtomicUsize::new(0),
        })
    }

    pub fn with_user(user: UserSnapshot) -> Arc<Self> {
        let api = Self::anonymous();
        api.set_user(Ok(user));
        api
    }

    pub fn set_user(&self, user: Result<UserSnapshot, ApiError>) {
        *self.user.lock().unwrap() = user;
    }

    pub fn set_token(&self, token: Result<TokenResponse, ApiError>) {
        *self.token.lock().unwrap() = token;
    }

    pub fn set_revoke(&self, outcome: Result<(), ApiError>) {
        *self.revoke.lock().unwrap() = outcome;
    }

    pub fn set_submission(&self, outcome: Result<SubmissionReceipt, ApiError>) {
        *self.submission.lock().unwrap() = outcome;
    }

    pub fn submitted(&self) -> Vec<(UserType, serde_json::Value)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn revokes(&self) -> usize {
        self.revokes.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.fetches.store(0, Ordering::SeqCst);
        self.exchanges.store(0, Ordering::SeqCst);
        self.revokes.store(0, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SessionApi for ScriptedApi {
    async fn fetch_current_user(&self) -> Result<UserSnapshot, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // The answer reflects the account as it was when the request was sent.
        let answer = self.user.lock().unwrap().clone();
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }

    async fn exchange_credentials(&self, _form: &LoginForm) -> Result<TokenResponse, ApiError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        self.token.lock().unwrap().clone()
    }

    async fn revoke(&self) -> Result<(), ApiError> {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        self.revoke.lock().unwrap().clone()
    }

    async fn register(&self, form: &RegisterForm) -> Result<SubmissionReceipt, ApiError> {
        if form.username.is_empty() {
            return Err(ApiError::Status {
                status: 422,
                detail: "username is required".to_string(),
            });
        }
        Ok(receipt("registered"))
    }

    async fn submit_onboarding(
        &self,
        user_type: UserType,
        application: &serde_json::Value,
    ) -> Result<SubmissionReceipt, ApiError> {
        self.submitted.lock().unwrap().push((user_type, application.clone()));
        self.submission.lock().unwrap().clone()
    }
}

pub fn receipt(message: &str) -> SubmissionReceipt {
    SubmissionReceipt {
        message: message.to_string(),
        user_id: Some(7),
    }
}

pub fn user(user_type: &str, audit_status: Option<i64>, user_level: Option<i64>) -> UserSnapshot {
    UserSnapshot::from_payload(UserPayload {
        user_type: user_type.to_string(),
        username: format!("{user_type}-user"),
        audit_status,
        user_level,
        ..Default::default()
    })
    .expect("valid user payload")
}

pub fn token(access_token: &str) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        token_type: "bearer".to_string(),
        redirect_to: None,
        message: None,
    }
}

pub struct Fixture {
    pub api: Arc<ScriptedApi>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub session: Arc<SessionStore>,
}

impl Fixture {
    pub fn new(api: Arc<ScriptedApi>) -> Self {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let session = Arc::new(SessionStore::new(
            api.clone(),
            credentials.clone() as Arc<dyn CredentialStore>,
        ));
        Self {
            api,
            credentials,
            session,
        }
    }

    /// Fixture whose session is already loaded for `user`; counters start at zero.
    pub async fn signed_in(user: UserSnapshot) -> Self {
        let fixture = Self::new(ScriptedApi::with_user(user));
        assert!(fixture.session.check_auth().await);
        fixture.api.reset_counts();
        fixture
    }

    pub fn guard(&self) -> NavigationGuard {
        NavigationGuard::new(self.session.clone())
    }
}
