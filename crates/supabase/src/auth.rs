//! Auth (GoTrue) API client.
//!
//! Covers the password grant, sign-up, sign-out, and user lookup. Sessions
//! are time-bounded; consumers must treat an absent or expired session as
//! "unauthenticated", never as an error.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use larkspur_core::UserId;

use crate::{ClientInner, SupabaseError};

/// The authenticated principal a session belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Auth-service user ID.
    pub id: UserId,
    /// Email the account was registered with.
    #[serde(default)]
    pub email: Option<String>,
}

/// A session returned by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// Opaque bearer token sent with user-scoped requests.
    pub access_token: String,
    /// Token lifetime in seconds, relative to issuance.
    pub expires_in: i64,
    /// Absolute expiry as a unix timestamp, when the service provides one.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Token for obtaining a fresh session (unused; re-login instead).
    #[serde(default)]
    pub refresh_token: String,
    /// The signed-in user.
    pub user: AuthUser,
}

impl Session {
    /// Absolute expiry of this session.
    ///
    /// Prefers the service-provided timestamp; falls back to `expires_in`
    /// relative to now.
    #[must_use]
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + TimeDelta::seconds(self.expires_in))
    }
}

/// Credentials payload for sign-in and sign-up.
#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for the auth API (`/auth/v1`).
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

impl AuthClient {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Sign in with an email and password.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::InvalidCredentials`] when the auth service
    /// rejects the credentials, or another variant for transport failures.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SupabaseError> {
        let url = format!("{}/token?grant_type=password", self.inner.config.auth_url());
        let request = self
            .inner
            .authed(self.inner.http.post(&url), None)
            .json(&Credentials { email, password });

        let body = match self.inner.execute(request).await {
            Ok(body) => body,
            // The password grant reports bad credentials as a client error.
            Err(SupabaseError::Api { status: 400 | 401, .. }) => {
                return Err(SupabaseError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        Ok(serde_json::from_str(&body)?)
    }

    /// Register a new account.
    ///
    /// Returns the initial session. Projects with email confirmation enabled
    /// return a session without a usable token until the address is
    /// confirmed; callers should fall back to the login page in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created (e.g., the address
    /// is already registered) or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, SupabaseError> {
        let url = format!("{}/signup", self.inner.config.auth_url());
        let request = self
            .inner
            .authed(self.inner.http.post(&url), None)
            .json(&Credentials { email, password });

        let body = self.inner.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers treat this as
    /// best-effort and clear local state regardless.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = format!("{}/logout", self.inner.config.auth_url());
        let request = self
            .inner
            .authed(self.inner.http.post(&url), Some(access_token));

        self.inner.execute(request).await?;
        Ok(())
    }

    /// Look up the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error for revoked or expired tokens.
    #[instrument(skip(self, access_token))]
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let url = format!("{}/user", self.inner.config.auth_url());
        let request = self
            .inner
            .authed(self.inner.http.get(&url), Some(access_token));

        let body = self.inner.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deserialize() {
        let json = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1767225600,
            "refresh_token": "refresh",
            "user": {"id": "8b7f26d6-3c0c-44a4-9c2e-1f2b0f6a4c55", "email": "a@b.c"}
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_session_expiry_prefers_absolute_timestamp() {
        let json = r#"{
            "access_token": "t",
            "expires_in": 3600,
            "expires_at": 1767225600,
            "user": {"id": "8b7f26d6-3c0c-44a4-9c2e-1f2b0f6a4c55"}
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.expiry().timestamp(), 1_767_225_600);
    }

    #[test]
    fn test_session_expiry_falls_back_to_relative() {
        let json = r#"{
            "access_token": "t",
            "expires_in": 3600,
            "user": {"id": "8b7f26d6-3c0c-44a4-9c2e-1f2b0f6a4c55"}
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        let expiry = session.expiry();
        assert!(expiry > Utc::now() + TimeDelta::seconds(3500));
        assert!(expiry <= Utc::now() + TimeDelta::seconds(3700));
    }
}
