//! Contract of the portal API as seen by the session store.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use workportal_auth::{UserSnapshot, UserType};

/// Sign-in form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Account type the user picked on the login page; informational for the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            user_type: None,
        }
    }
}

/// `POST /register` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    pub phone: String,
    pub email: String,
    /// Client-generated correlation token for the registration request.
    pub temp_token: String,
}

impl RegisterForm {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            user_type,
            phone: phone.into(),
            email: email.into(),
            temp_token: Uuid::now_v7().to_string(),
        }
    }
}

/// Acknowledgement of a registration or an onboarding submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// `POST /token` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Page the backend suggests opening after sign-in.
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("API returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Remote session operations.
///
/// Implementations own transport details (base URL, bearer header); callers
/// only see typed snapshots and token responses.
#[async_trait::async_trait]
pub trait SessionApi: Send + Sync {
    /// Fetch and normalize the account behind the stored credential.
    async fn fetch_current_user(&self) -> Result<UserSnapshot, ApiError>;

    /// Exchange a username/password pair for a bearer token.
    async fn exchange_credentials(&self, form: &LoginForm) -> Result<TokenResponse, ApiError>;

    /// Tell the backend the session is over.
    async fn revoke(&self) -> Result<(), ApiError>;

    /// Create a new account. Needs no credential.
    async fn register(&self, form: &RegisterForm) -> Result<SubmissionReceipt, ApiError>;

    /// Submit the apply/bind form of `user_type` for the signed-in account.
    ///
    /// On success the backend moves the account to pending review.
    async fn submit_onboarding(
        &self,
        user_type: UserType,
        application: &serde_json::Value,
    ) -> Result<SubmissionReceipt, ApiError>;
}
