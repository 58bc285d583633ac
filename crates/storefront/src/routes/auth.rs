//! Authentication route handlers.
//!
//! Login, registration, and logout via Supabase password auth. All auth
//! state changes go through the session oracle so the rest of the process
//! hears about them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use larkspur_supabase::SupabaseError;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::SessionError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Map a flash error code to display text.
fn flash_message(code: &str) -> String {
    match code {
        "invalid" => "Invalid email or password.".to_string(),
        "mismatch" => "Passwords do not match.".to_string(),
        "register" => "Could not create the account. The address may already be registered.".to_string(),
        _ => "Something went wrong. Please try again.".to_string(),
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state, user))]
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> LoginTemplate {
    let cart_count = state.cart().count(user.as_ref()).await;
    LoginTemplate {
        error: query.error.as_deref().map(flash_message),
        signed_in: user.is_some(),
        cart_count,
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state
        .oracle()
        .sign_in(&session, form.email.trim(), &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user signed in");
            Redirect::to("/").into_response()
        }
        Err(SessionError::Supabase(SupabaseError::InvalidCredentials)) => {
            Redirect::to("/auth/login?error=invalid").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            Redirect::to("/auth/login?error=unavailable").into_response()
        }
    }
}

/// Display the register page.
#[instrument(skip(state, user))]
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> RegisterTemplate {
    let cart_count = state.cart().count(user.as_ref()).await;
    RegisterTemplate {
        error: query.error.as_deref().map(flash_message),
        signed_in: user.is_some(),
        cart_count,
    }
}

/// Handle registration form submission.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=mismatch").into_response();
    }

    match state
        .oracle()
        .sign_up(&session, form.email.trim(), &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "account created");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "registration failed");
            Redirect::to("/auth/register?error=register").into_response()
        }
    }
}

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    state.oracle().sign_out(&session).await;
    Redirect::to("/")
}
