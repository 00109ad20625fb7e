//! `reqwest`-backed implementation of [`SessionApi`].

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use tracing::instrument;

use workportal_auth::{UserSnapshot, UserType};

use crate::api::{ApiError, LoginForm, RegisterForm, SessionApi, SubmissionReceipt, TokenResponse};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;

const TOKEN_ENDPOINT: &str = "/token";
const CURRENT_USER_ENDPOINT: &str = "/users/me/";
const LOGOUT_ENDPOINT: &str = "/logout";
const REGISTER_ENDPOINT: &str = "/register";

/// Backend endpoint receiving the apply/bind form of each account type.
fn onboarding_endpoint(user_type: UserType) -> &'static str {
    match user_type {
        UserType::Admin => "/admin/permission-apply/submit",
        UserType::Enterprise => "/enterprise-backend/bind/submit",
        UserType::Contractor => "/contractor-backend/bind/submit",
    }
}

/// HTTP client for the portal backend.
///
/// Reads the bearer credential from the shared [`CredentialStore`] on every
/// request and drops it as soon as the backend answers `401`.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    config: ClientConfig,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpSessionApi {
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            credentials,
        })
    }

    /// The stored token, if it is still worth sending.
    ///
    /// Expired tokens are discarded locally instead of costing a round trip.
    fn bearer(&self) -> Result<String, ApiError> {
        let Some(token) = self.credentials.get() else {
            return Err(ApiError::Unauthorized("no stored credential".to_string()));
        };

        if !self.credentials.is_valid(&token) {
            self.forget_credential();
            return Err(ApiError::Unauthorized("stored credential has expired".to_string()));
        }

        Ok(token)
    }

    fn forget_credential(&self) {
        if let Err(err) = self.credentials.clear() {
            tracing::warn!(error = %err, "failed to clear rejected credential");
        }
    }

    /// Map non-success statuses to [`ApiError`] and return the body.
    async fn into_body(&self, response: Response) -> Result<Vec<u8>, ApiError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            self.forget_credential();
            return Err(ApiError::Unauthorized(error_detail(&body, status)));
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&body, status),
            });
        }

        Ok(body.to_vec())
    }
}

#[async_trait::async_trait]
impl SessionApi for HttpSessionApi {
    #[instrument(skip(self), fields(api_base = %self.config.api_base), err)]
    async fn fetch_current_user(&self) -> Result<UserSnapshot, ApiError> {
        let token = self.bearer()?;

        let response = self
            .client
            .get(self.config.endpoint(CURRENT_USER_ENDPOINT))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = self.into_body(response).await?;
        UserSnapshot::from_json(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    #[instrument(skip(self, form), fields(username = %form.username), err)]
    async fn exchange_credentials(&self, form: &LoginForm) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(self.config.endpoint(TOKEN_ENDPOINT))
            .form(&[("username", form.username.as_str()), ("password", form.password.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = self.into_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("token response: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn revoke(&self) -> Result<(), ApiError> {
        let mut request = self.client.post(self.config.endpoint(LOGOUT_ENDPOINT));
        if let Some(token) = self.credentials.get() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        self.into_body(response).await.map(|_| ())
    }

    #[instrument(skip(self, form), fields(username = %form.username, user_type = form.user_type.as_str()), err)]
    async fn register(&self, form: &RegisterForm) -> Result<SubmissionReceipt, ApiError> {
        let response = self
            .client
            .post(self.config.endpoint(REGISTER_ENDPOINT))
            .json(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = self.into_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("registration response: {e}")))
    }

    #[instrument(skip(self, application), fields(user_type = user_type.as_str()), err)]
    async fn submit_onboarding(
        &self,
        user_type: UserType,
        application: &serde_json::Value,
    ) -> Result<SubmissionReceipt, ApiError> {
        let token = self.bearer()?;

        let response = self
            .client
            .post(self.config.endpoint(onboarding_endpoint(user_type)))
            .bearer_auth(token)
            .json(application)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = self.into_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("submission response: {e}")))
    }
}

/// Pull the human-readable message out of an error body.
///
/// The backend answers errors as `{"detail": ...}` where `detail` is either a
/// string or a list of validation problems.
fn error_detail(body: &[u8], status: StatusCode) -> String {
    let fallback = || format!("HTTP error! status: {}", status.as_u16());

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => fallback(),
        },
        _ => fallback(),
    }
}
