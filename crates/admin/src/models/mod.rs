//! Domain models for the admin panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use larkspur_core::UserId;

/// Session-stored admin identity.
///
/// Stored at login; the role itself is never cached here - the gate
/// re-resolves it on every request, so revoking the admin role takes
/// effect immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Supabase auth user ID.
    pub id: UserId,
    /// Email the account was registered with.
    pub email: String,
    /// Bearer token for Supabase calls on the admin's behalf.
    pub access_token: String,
    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,
}

impl CurrentAdmin {
    /// Whether the access token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
