use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims the portal backend embeds in its bearer tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username the token was issued to.
    #[serde(default)]
    pub sub: Option<String>,

    /// Account type at issue time.
    #[serde(default)]
    pub user_type: Option<String>,

    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not valid base64url")]
    Encoding,

    #[error("token payload is not a valid claims object: {0}")]
    Claims(String),

    #[error("token has expired")]
    Expired,
}

/// Decode the payload segment of a JWT.
///
/// Note: the signature is **not** verified. The backend verifies tokens on
/// every request; the client only needs the expiry to skip obviously dead
/// credentials.
pub fn decode_unverified(token: &str) -> Result<TokenClaims, TokenError> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Claims(e.to_string()))
}

/// Deterministically check the expiry claim against `now`.
pub fn validate_expiry(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(())
}

/// `true` when `token` decodes and has not expired at `now`.
pub fn is_token_valid(token: &str, now: DateTime<Utc>) -> bool {
    match decode_unverified(token).and_then(|claims| validate_expiry(&claims, now)) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "stored token rejected");
            false
        }
    }
}
