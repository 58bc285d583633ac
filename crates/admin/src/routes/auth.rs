//! Admin authentication route handlers.
//!
//! Login checks the password against Supabase auth, then resolves the role
//! before a session is stored at all: a valid password with a non-admin
//! role is turned away and the freshly minted token revoked.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use larkspur_supabase::SupabaseError;

use crate::models::{CurrentAdmin, session_keys};
use crate::routes::render;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Map a flash error code to display text.
fn flash_message(code: &str) -> String {
    match code {
        "invalid" => "Invalid email or password.".to_string(),
        "forbidden" => "This account does not have admin access.".to_string(),
        _ => "Something went wrong. Please try again.".to_string(),
    }
}

/// Display the login page.
#[instrument]
pub async fn login_page(Query(query): Query<MessageQuery>) -> Html<String> {
    render(&LoginTemplate {
        error: query.error.as_deref().map(flash_message),
    })
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let supabase_session = match state
        .supabase()
        .auth()
        .sign_in_with_password(form.email.trim(), &form.password)
        .await
    {
        Ok(supabase_session) => supabase_session,
        Err(SupabaseError::InvalidCredentials) => {
            return Redirect::to("/auth/login?error=invalid").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "admin login failed");
            return Redirect::to("/auth/login?error=unavailable").into_response();
        }
    };

    // Resolve the role before storing anything; a valid password is not
    // enough to get a session on this binary.
    let role = state
        .roles()
        .resolve(supabase_session.user.id, &supabase_session.access_token)
        .await;

    if !role.is_admin() {
        tracing::warn!(user_id = %supabase_session.user.id, "non-admin login attempt");
        if let Err(e) = state
            .supabase()
            .auth()
            .sign_out(&supabase_session.access_token)
            .await
        {
            tracing::warn!(error = %e, "failed to revoke non-admin session");
        }
        return Redirect::to("/auth/login?error=forbidden").into_response();
    }

    let admin = CurrentAdmin {
        id: supabase_session.user.id,
        email: supabase_session
            .user
            .email
            .clone()
            .unwrap_or_else(|| form.email.trim().to_string()),
        access_token: supabase_session.access_token.clone(),
        expires_at: supabase_session.expiry(),
    };

    if let Err(e) = session.insert(session_keys::CURRENT_ADMIN, &admin).await {
        tracing::error!(error = %e, "failed to store admin session");
        return Redirect::to("/auth/login?error=unavailable").into_response();
    }

    tracing::info!(user_id = %admin.id, "admin signed in");
    Redirect::to("/products").into_response()
}

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Ok(Some(admin)) = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
    {
        // Best effort; the local session is cleared regardless.
        if let Err(e) = state.supabase().auth().sign_out(&admin.access_token).await {
            tracing::warn!(error = %e, "remote admin sign-out failed");
        }
    }

    let _ = session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await;

    Redirect::to("/auth/login")
}
