//! Authorization gate.
//!
//! The single decision point for whether admin content may be produced.
//! The gate is a small state machine:
//!
//! ```text
//! Unknown --check()--> Checking --no session--------------> Unauthorized
//!                         |
//!                         +------session, role == admin---> Authorized
//!                         +------session, role != admin---> Unauthorized
//! ```
//!
//! Nothing is rendered from `Unknown` or `Checking`; in this HTTP rendition
//! the response simply is not produced until a check completes. A verdict
//! never outlives the request that computed it - the extractor builds a
//! fresh gate per request - so a sign-out can never leave a stale
//! `Authorized` behind. `invalidate` exists for longer-lived holders (and
//! the tests) to force re-checking after an auth transition.

use async_trait::async_trait;

use larkspur_core::{Role, UserId};

/// The session a gate check found, carried into `Authorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSession {
    pub user_id: UserId,
    pub email: String,
    pub access_token: String,
}

/// Source of the current session, if any.
///
/// `None` means "unauthenticated" - expired sessions must be reported as
/// absent, never as an error.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    async fn current_session(&self) -> Option<GateSession>;
}

/// Source of a user's role.
///
/// Implementations are infallible by contract: any lookup failure must
/// already have been degraded to [`Role::User`].
#[async_trait]
pub trait RoleProbe: Send + Sync {
    async fn resolve_role(&self, session: &GateSession) -> Role;
}

/// Gate states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// No check has run yet.
    Unknown,
    /// A check is in flight; protected content must not be produced.
    Checking,
    /// Session present and role is admin.
    Authorized(GateSession),
    /// No session, or the role is not admin.
    Unauthorized,
}

/// Per-request authorization gate over a session probe and a role probe.
pub struct AuthorizationGate<'a> {
    sessions: &'a dyn SessionProbe,
    roles: &'a dyn RoleProbe,
    state: GateState,
}

impl<'a> AuthorizationGate<'a> {
    /// Create a gate in the `Unknown` state.
    #[must_use]
    pub const fn new(sessions: &'a dyn SessionProbe, roles: &'a dyn RoleProbe) -> Self {
        Self {
            sessions,
            roles,
            state: GateState::Unknown,
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &GateState {
        &self.state
    }

    /// Run a full check: session first, then role. The role probe is never
    /// consulted without a session, so an admin verdict cannot be produced
    /// for an unauthenticated caller under any interleaving.
    pub async fn check(&mut self) -> &GateState {
        self.state = GateState::Checking;

        self.state = match self.sessions.current_session().await {
            None => GateState::Unauthorized,
            Some(session) => match self.roles.resolve_role(&session).await {
                Role::Admin => GateState::Authorized(session),
                Role::User => GateState::Unauthorized,
            },
        };

        &self.state
    }

    /// Discard the current verdict. Callers must re-run [`check`](Self::check)
    /// before producing protected content.
    pub fn invalidate(&mut self) {
        self.state = GateState::Unknown;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uuid::Uuid;

    struct FakeSessions {
        session: Mutex<Option<GateSession>>,
    }

    impl FakeSessions {
        fn with(session: Option<GateSession>) -> Self {
            Self {
                session: Mutex::new(session),
            }
        }

        fn sign_out(&self) {
            *self.session.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl SessionProbe for FakeSessions {
        async fn current_session(&self) -> Option<GateSession> {
            self.session.lock().unwrap().clone()
        }
    }

    struct FakeRoles {
        role: Role,
        calls: AtomicUsize,
    }

    impl FakeRoles {
        const fn with(role: Role) -> Self {
            Self {
                role,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RoleProbe for FakeRoles {
        async fn resolve_role(&self, _session: &GateSession) -> Role {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.role
        }
    }

    fn session() -> GateSession {
        GateSession {
            user_id: UserId::new(Uuid::new_v4()),
            email: "admin@example.com".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let sessions = FakeSessions::with(None);
        let roles = FakeRoles::with(Role::Admin);
        let gate = AuthorizationGate::new(&sessions, &roles);

        assert_eq!(*gate.state(), GateState::Unknown);
    }

    #[tokio::test]
    async fn test_no_session_is_unauthorized_without_role_lookup() {
        let sessions = FakeSessions::with(None);
        // Even an admin role cannot rescue a missing session.
        let roles = FakeRoles::with(Role::Admin);
        let mut gate = AuthorizationGate::new(&sessions, &roles);

        assert_eq!(*gate.check().await, GateState::Unauthorized);
        assert_eq!(roles.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_admin_session_is_authorized() {
        let expected = session();
        let sessions = FakeSessions::with(Some(expected.clone()));
        let roles = FakeRoles::with(Role::Admin);
        let mut gate = AuthorizationGate::new(&sessions, &roles);

        assert_eq!(*gate.check().await, GateState::Authorized(expected));
    }

    #[tokio::test]
    async fn test_non_admin_session_is_unauthorized() {
        let sessions = FakeSessions::with(Some(session()));
        let roles = FakeRoles::with(Role::User);
        let mut gate = AuthorizationGate::new(&sessions, &roles);

        assert_eq!(*gate.check().await, GateState::Unauthorized);
    }

    #[tokio::test]
    async fn test_sign_out_between_checks_revokes_the_verdict() {
        let sessions = FakeSessions::with(Some(session()));
        let roles = FakeRoles::with(Role::Admin);
        let mut gate = AuthorizationGate::new(&sessions, &roles);

        assert!(matches!(gate.check().await, GateState::Authorized(_)));

        sessions.sign_out();
        gate.invalidate();
        assert_eq!(*gate.state(), GateState::Unknown);

        assert_eq!(*gate.check().await, GateState::Unauthorized);
    }

    #[tokio::test]
    async fn test_repeated_checks_are_idempotent() {
        let sessions = FakeSessions::with(None);
        let roles = FakeRoles::with(Role::Admin);
        let mut gate = AuthorizationGate::new(&sessions, &roles);

        assert_eq!(*gate.check().await, GateState::Unauthorized);
        assert_eq!(*gate.check().await, GateState::Unauthorized);
        assert_eq!(*gate.check().await, GateState::Unauthorized);
    }
}
