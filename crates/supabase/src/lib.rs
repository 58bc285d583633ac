//! Supabase REST client.
//!
//! # Architecture
//!
//! - Supabase is the source of truth for users, catalog rows, and uploaded
//!   images - NO local database, direct API calls
//! - One [`Supabase`] handle per process, cheaply cloneable; sub-clients for
//!   auth, tables, and storage share the same HTTP client and configuration
//! - Every response body is deserialized into a typed record at this
//!   boundary; rows with missing fields fail here, not in handlers
//!
//! # APIs
//!
//! ## Auth (`/auth/v1`)
//! - Password sign-in, sign-up, sign-out, user lookup
//!
//! ## Tables (`/rest/v1`)
//! - PostgREST-style `select`/`eq`/`order`/`limit` reads, plus insert,
//!   update, and delete with filters
//!
//! ## Storage (`/storage/v1`)
//! - Object upload (service-role key) and public URL construction
//!
//! # Example
//!
//! ```rust,ignore
//! use larkspur_supabase::{Supabase, SupabaseConfig};
//!
//! let client = Supabase::new(SupabaseConfig::from_env()?);
//!
//! // Sign in and read the user's cart
//! let session = client.auth().sign_in_with_password("a@b.c", "hunter2!").await?;
//! let lines: Vec<CartLine> = client
//!     .table("cart_items")
//!     .auth(&session.access_token)
//!     .select("*")
//!     .eq("user_id", &session.user.id.to_string())
//!     .fetch()
//!     .await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod events;
pub mod storage;
pub mod table;

pub use auth::{AuthClient, AuthUser, Session};
pub use config::{ConfigError, SupabaseConfig};
pub use events::{AuthEvent, AuthEvents};
pub use storage::StorageClient;
pub use table::TableRequest;

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected record shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Supabase returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// Expected row absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Sign-in rejected by the auth service.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An operation needed the service-role key but none is configured.
    #[error("service role key not configured")]
    MissingServiceKey,
}

/// Handle to a Supabase project.
///
/// Cheaply cloneable; all sub-clients share one HTTP connection pool.
#[derive(Clone)]
pub struct Supabase {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) config: SupabaseConfig,
}

impl Supabase {
    /// Create a new client for the configured project.
    #[must_use]
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http: reqwest::Client::new(),
                config,
            }),
        }
    }

    /// The configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &SupabaseConfig {
        &self.inner.config
    }

    /// Auth sub-client (`/auth/v1`).
    #[must_use]
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(Arc::clone(&self.inner))
    }

    /// Start a request against a table (`/rest/v1/{name}`).
    #[must_use]
    pub fn table(&self, name: &str) -> TableRequest {
        TableRequest::new(Arc::clone(&self.inner), name)
    }

    /// Storage sub-client (`/storage/v1`).
    #[must_use]
    pub fn storage(&self) -> StorageClient {
        StorageClient::new(Arc::clone(&self.inner))
    }

    /// Cheap connectivity probe against the REST root, for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST API is unreachable or rejects the
    /// project key.
    pub async fn ping(&self) -> Result<(), SupabaseError> {
        let url = format!("{}/", self.inner.config.rest_url());
        let request = self.inner.authed(self.inner.http.get(&url), None);
        self.inner.execute(request).await?;
        Ok(())
    }
}

impl ClientInner {
    /// Send a request and return the response body, mapping non-success
    /// statuses to [`SupabaseError::Api`] with a truncated body for
    /// diagnostics.
    pub(crate) async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<String, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body, 500),
                "Supabase returned non-success status"
            );
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        Ok(body)
    }

    /// Attach the standard auth headers: the project `apikey` plus a bearer
    /// token (a user JWT when given, the anon key otherwise).
    pub(crate) fn authed(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let bearer = token.unwrap_or(&self.config.anon_key);
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }
}

/// Truncate a response body for logs and error messages.
fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SupabaseError::NotFound("product 3".to_string());
        assert_eq!(err.to_string(), "Not found: product 3");

        let err = SupabaseError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error (503): upstream unavailable");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("", 3), "");
    }
}
