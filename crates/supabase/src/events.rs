//! Auth transition events.
//!
//! Sign-in and sign-out publish onto a broadcast channel so process-wide
//! state (e.g., a per-user cart count cache) can re-synchronize without
//! holding a reference to the auth flow. Subscribers that lag simply miss
//! events; there is no replay or reconnection logic here.

use larkspur_core::UserId;
use tokio::sync::broadcast;

/// Default channel capacity. Auth transitions are rare; a small buffer is
/// plenty before a subscriber counts as lagged.
const CHANNEL_CAPACITY: usize = 16;

/// An auth state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user signed in. Carries the token subscribers need for
    /// user-scoped reads triggered by the event.
    SignedIn {
        user_id: UserId,
        access_token: String,
    },
    /// A user signed out.
    SignedOut { user_id: UserId },
}

/// Broadcast hub for [`AuthEvent`]s.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    /// Create a new hub.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to subsequent events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// Publishing with no subscribers is not an error; the event is dropped.
    pub fn publish(&self, event: AuthEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("auth event published with no subscribers");
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let events = AuthEvents::new();
        let mut rx = events.subscribe();

        let user_id = UserId::new(Uuid::new_v4());
        events.publish(AuthEvent::SignedOut { user_id });

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut { user_id });
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let events = AuthEvents::new();
        events.publish(AuthEvent::SignedOut {
            user_id: UserId::new(Uuid::new_v4()),
        });
    }
}
