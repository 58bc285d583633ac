//! Session-related types.
//!
//! Types stored in the cookie session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use larkspur_core::UserId;

/// Session-stored user identity.
///
/// Holds the Supabase access token alongside the identity so user-scoped
/// table calls can be made on the user's behalf. The token is time-bounded;
/// readers must check [`CurrentUser::is_expired`] and treat an expired
/// identity as unauthenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Supabase auth user ID.
    pub id: UserId,
    /// Email the account was registered with.
    pub email: String,
    /// Bearer token for user-scoped Supabase calls.
    pub access_token: String,
    /// Absolute expiry of the access token.
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    /// Whether the access token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use uuid::Uuid;

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let user = CurrentUser {
            id: UserId::new(Uuid::new_v4()),
            email: "a@b.c".to_string(),
            access_token: "token".to_string(),
            expires_at: now + TimeDelta::seconds(60),
        };

        assert!(!user.is_expired(now));
        assert!(user.is_expired(now + TimeDelta::seconds(61)));
    }
}
