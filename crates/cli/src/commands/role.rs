//! Set the role on a user's profile row.

use serde::Deserialize;
use tracing::info;

use larkspur_core::{Role, UserId};
use larkspur_supabase::{Supabase, SupabaseConfig};

/// The columns read when locating a profile by email.
#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: UserId,
}

/// Set the role for the account registered under `email`.
///
/// Unlike the resolver's read path, unknown role names are rejected here -
/// a typo on the command line must not silently demote an account.
///
/// # Errors
///
/// Returns an error if the role name is unknown, no profile matches the
/// email, or the backend calls fail.
pub async fn set(email: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let role = match role {
        "admin" => Role::Admin,
        "user" => Role::User,
        other => return Err(format!("Unknown role: {other} (expected admin or user)").into()),
    };

    let config = SupabaseConfig::from_env()?;
    config.require_service_role_key()?;
    let client = Supabase::new(config);

    let profile: ProfileRow = client
        .table("profiles")
        .service_role()?
        .select("id")
        .eq("email", email)
        .single()
        .await?;

    client
        .table("profiles")
        .service_role()?
        .update(&serde_json::json!({ "role": role.as_str() }))
        .eq("id", profile.id)
        .execute()
        .await?;

    info!(%email, role = %role, "Role updated");
    Ok(())
}
