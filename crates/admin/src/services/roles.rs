//! Role resolver.
//!
//! Looks up a user's role from their `profiles` row. The failure policy is
//! deliberate and load-bearing: any lookup error - network failure, missing
//! row, malformed row - resolves to [`Role::User`]. Elevated privileges
//! fail closed while basic access fails open; a backend hiccup locks nobody
//! out of the shop, it only keeps the admin panel shut.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{Role, UserId};
use larkspur_supabase::{Supabase, SupabaseError};

use crate::gate::{GateSession, RoleProbe};

/// The single column read from a `profiles` row.
#[derive(Debug, Deserialize)]
struct ProfileRow {
    role: Role,
}

/// Resolves a user's role from the remote `profiles` table.
#[derive(Clone)]
pub struct RoleResolver {
    client: Supabase,
}

impl RoleResolver {
    /// Create a resolver over the given Supabase client.
    #[must_use]
    pub const fn new(client: Supabase) -> Self {
        Self { client }
    }

    /// Resolve the role for `user_id`, reading with the user's own token.
    ///
    /// Never fails: errors degrade to [`Role::User`].
    #[instrument(skip(self, access_token))]
    pub async fn resolve(&self, user_id: UserId, access_token: &str) -> Role {
        let result = self
            .client
            .table("profiles")
            .auth(access_token)
            .select("role")
            .eq("id", user_id)
            .single::<ProfileRow>()
            .await;

        role_or_default(user_id, result)
    }
}

#[async_trait]
impl RoleProbe for RoleResolver {
    async fn resolve_role(&self, session: &GateSession) -> Role {
        self.resolve(session.user_id, &session.access_token).await
    }
}

/// Apply the fail-open policy to a lookup result.
fn role_or_default(user_id: UserId, result: Result<ProfileRow, SupabaseError>) -> Role {
    match result {
        Ok(row) => row.role,
        Err(e) => {
            tracing::warn!(
                error = %e,
                user_id = %user_id,
                "role lookup failed, defaulting to user"
            );
            Role::User
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_lookup_error_defaults_to_user() {
        let user_id = UserId::new(Uuid::new_v4());
        let result = Err(SupabaseError::Api {
            status: 503,
            message: "down".to_string(),
        });

        assert_eq!(role_or_default(user_id, result), Role::User);
    }

    #[test]
    fn test_missing_row_defaults_to_user() {
        let user_id = UserId::new(Uuid::new_v4());
        let result = Err(SupabaseError::NotFound("no matching row".to_string()));

        assert_eq!(role_or_default(user_id, result), Role::User);
    }

    #[test]
    fn test_found_role_passes_through() {
        let user_id = UserId::new(Uuid::new_v4());
        let result = Ok(ProfileRow { role: Role::Admin });

        assert_eq!(role_or_default(user_id, result), Role::Admin);
    }
}
