//! Authentication middleware and extractors for admin.
//!
//! `RequireAdmin` runs the authorization gate from scratch on every
//! request: session check first, then a fresh role resolution. No verdict
//! is cached between requests, and the login route sits outside the gated
//! router, so the redirect for an unauthorized caller cannot loop.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::gate::{AuthorizationGate, GateSession, GateState, SessionProbe};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user with the admin role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when the gate does not authorize the request.
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Session probe over the tower-sessions cookie session.
struct CookieSessionProbe {
    session: Session,
}

#[async_trait]
impl SessionProbe for CookieSessionProbe {
    async fn current_session(&self) -> Option<GateSession> {
        let admin: CurrentAdmin = self
            .session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()?;

        // Expired tokens read as unauthenticated, not as an error.
        if admin.is_expired(Utc::now()) {
            return None;
        }

        Some(GateSession {
            user_id: admin.id,
            email: admin.email,
            access_token: admin.access_token,
        })
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let sessions = CookieSessionProbe { session };
        let mut gate = AuthorizationGate::new(&sessions, state.roles());

        match gate.check().await {
            GateState::Authorized(gate_session) => {
                // Re-read the stored identity for its expiry; the gate only
                // carries what the probes needed.
                let admin = CurrentAdmin {
                    id: gate_session.user_id,
                    email: gate_session.email.clone(),
                    access_token: gate_session.access_token.clone(),
                    expires_at: sessions
                        .session
                        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                        .await
                        .ok()
                        .flatten()
                        .map_or_else(Utc::now, |stored| stored.expires_at),
                };
                Ok(Self(admin))
            }
            _ => {
                let is_api = parts.uri.path().starts_with("/api/");
                if is_api {
                    Err(AdminAuthRejection::Unauthorized)
                } else {
                    Err(AdminAuthRejection::RedirectToLogin)
                }
            }
        }
    }
}
