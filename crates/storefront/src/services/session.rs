//! Session oracle.
//!
//! Single owner of the authentication lifecycle: it wraps the Supabase auth
//! client, persists the signed-in identity into the cookie session, and
//! publishes sign-in/sign-out transitions so process-wide state (the cart
//! count cache) can re-synchronize. Nothing else in the storefront writes
//! auth state.
//!
//! A `None` from [`SessionOracle::current`] always means "unauthenticated" -
//! absent and expired sessions are indistinguishable to callers, and neither
//! is an error.

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::instrument;

use larkspur_supabase::{AuthClient, AuthEvent, AuthEvents, Supabase, SupabaseError};

use crate::models::{CurrentUser, session_keys};

/// Errors from the session oracle.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The auth service rejected or failed the operation.
    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    /// The cookie session could not be read or written.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Owner of auth state and publisher of auth transitions.
#[derive(Clone)]
pub struct SessionOracle {
    auth: AuthClient,
    events: AuthEvents,
}

impl SessionOracle {
    /// Create an oracle over the given Supabase client.
    #[must_use]
    pub fn new(supabase: &Supabase) -> Self {
        Self {
            auth: supabase.auth(),
            events: AuthEvents::new(),
        }
    }

    /// Subscribe to subsequent sign-in/sign-out transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Point-in-time read of the signed-in user.
    ///
    /// Returns `None` for absent or expired sessions; an expired identity is
    /// also removed from the cookie session so later reads are cheap.
    pub async fn current(&self, session: &Session) -> Option<CurrentUser> {
        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()?;

        if user.is_expired(Utc::now()) {
            let _ = session
                .remove::<CurrentUser>(session_keys::CURRENT_USER)
                .await;
            return None;
        }

        Some(user)
    }

    /// Sign in with an email and password.
    ///
    /// On success the identity is stored in the cookie session and a
    /// `SignedIn` event is published.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::InvalidCredentials`] (wrapped) for bad
    /// credentials, or a store error if the session cannot be written.
    #[instrument(skip(self, session, password), fields(email = %email))]
    pub async fn sign_in(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, SessionError> {
        let supabase_session = self.auth.sign_in_with_password(email, password).await?;
        self.store_identity(session, email, supabase_session).await
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails or the session cannot be
    /// written.
    #[instrument(skip(self, session, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, SessionError> {
        let supabase_session = self.auth.sign_up(email, password).await?;
        self.store_identity(session, email, supabase_session).await
    }

    /// Sign the current user out.
    ///
    /// The remote revocation is best-effort: local state is cleared and a
    /// `SignedOut` event published even if the auth service call fails, so
    /// the process never keeps acting on behalf of a user who asked to
    /// leave.
    #[instrument(skip(self, session))]
    pub async fn sign_out(&self, session: &Session) {
        let Some(user) = self.current(session).await else {
            return;
        };

        if let Err(e) = self.auth.sign_out(&user.access_token).await {
            tracing::warn!(error = %e, user_id = %user.id, "remote sign-out failed");
        }

        let _ = session
            .remove::<CurrentUser>(session_keys::CURRENT_USER)
            .await;

        self.events.publish(AuthEvent::SignedOut { user_id: user.id });
    }

    /// Persist a fresh Supabase session into the cookie session and publish
    /// the sign-in.
    async fn store_identity(
        &self,
        session: &Session,
        email: &str,
        supabase_session: larkspur_supabase::Session,
    ) -> Result<CurrentUser, SessionError> {
        let user = CurrentUser {
            id: supabase_session.user.id,
            email: supabase_session
                .user
                .email
                .clone()
                .unwrap_or_else(|| email.to_string()),
            access_token: supabase_session.access_token.clone(),
            expires_at: supabase_session.expiry(),
        };

        session
            .insert(session_keys::CURRENT_USER, &user)
            .await?;

        self.events.publish(AuthEvent::SignedIn {
            user_id: user.id,
            access_token: user.access_token.clone(),
        });

        Ok(user)
    }
}
