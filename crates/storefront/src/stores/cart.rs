//! Cart store.
//!
//! Mirrors the remote `cart_items` table - one row per `(user, item)` pair -
//! and keeps a per-user running count of total quantity. The count cache is
//! the single source of truth for badges and is only written after a remote
//! mutation has been confirmed, or on auth transitions; handlers never touch
//! it directly. Failed remote calls leave the cache untouched and are
//! surfaced to the caller; nothing is retried automatically.
//!
//! All mutations for a user run under a per-user async lock, so two rapid
//! adds of the same item serialize instead of both reading the same
//! pre-update quantity. That only covers this process; a multi-instance
//! deployment would need the increment pushed into the backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::instrument;

use larkspur_core::{CartLine, ItemId, NewCartLine, UserId};
use larkspur_supabase::{AuthEvent, Supabase, SupabaseError};

use crate::models::CurrentUser;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation requires a signed-in user.
    #[error("sign in to use the cart")]
    Unauthenticated,

    /// The backend call failed; local state is unchanged.
    #[error("cart update failed: {0}")]
    Remote(#[from] SupabaseError),
}

/// Remote operations the cart store needs.
///
/// The production implementation talks to the `cart_items` table; tests use
/// an in-memory fake.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// The line for `(user, item)`, if one exists.
    async fn find_line(
        &self,
        token: &str,
        user: UserId,
        item: ItemId,
    ) -> Result<Option<CartLine>, SupabaseError>;

    /// Insert a new line.
    async fn insert_line(&self, token: &str, line: &NewCartLine) -> Result<(), SupabaseError>;

    /// Set the quantity of an existing line.
    async fn set_quantity(
        &self,
        token: &str,
        line_id: i64,
        quantity: u32,
    ) -> Result<(), SupabaseError>;

    /// Delete one line.
    async fn delete_line(&self, token: &str, line_id: i64) -> Result<(), SupabaseError>;

    /// Delete every line belonging to `user`.
    async fn delete_all(&self, token: &str, user: UserId) -> Result<(), SupabaseError>;

    /// All lines belonging to `user`.
    async fn fetch_lines(&self, token: &str, user: UserId) -> Result<Vec<CartLine>, SupabaseError>;
}

/// Production backend over the `cart_items` table.
///
/// Every call carries the user's own access token, so row-level security
/// scopes reads and writes to that user's rows.
pub struct SupabaseCartBackend {
    client: Supabase,
}

impl SupabaseCartBackend {
    /// Create a backend over the given Supabase client.
    #[must_use]
    pub const fn new(client: Supabase) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CartBackend for SupabaseCartBackend {
    async fn find_line(
        &self,
        token: &str,
        user: UserId,
        item: ItemId,
    ) -> Result<Option<CartLine>, SupabaseError> {
        self.client
            .table("cart_items")
            .auth(token)
            .select("*")
            .eq("user_id", user)
            .eq("item_id", item)
            .maybe_single()
            .await
    }

    async fn insert_line(&self, token: &str, line: &NewCartLine) -> Result<(), SupabaseError> {
        self.client
            .table("cart_items")
            .auth(token)
            .insert(std::slice::from_ref(line))
            .await
    }

    async fn set_quantity(
        &self,
        token: &str,
        line_id: i64,
        quantity: u32,
    ) -> Result<(), SupabaseError> {
        self.client
            .table("cart_items")
            .auth(token)
            .update(&serde_json::json!({ "quantity": quantity }))
            .eq("id", line_id)
            .execute()
            .await
    }

    async fn delete_line(&self, token: &str, line_id: i64) -> Result<(), SupabaseError> {
        self.client
            .table("cart_items")
            .auth(token)
            .delete()
            .eq("id", line_id)
            .execute()
            .await
    }

    async fn delete_all(&self, token: &str, user: UserId) -> Result<(), SupabaseError> {
        self.client
            .table("cart_items")
            .auth(token)
            .delete()
            .eq("user_id", user)
            .execute()
            .await
    }

    async fn fetch_lines(&self, token: &str, user: UserId) -> Result<Vec<CartLine>, SupabaseError> {
        self.client
            .table("cart_items")
            .auth(token)
            .select("*")
            .eq("user_id", user)
            .fetch()
            .await
    }
}

/// Process-wide cart state.
///
/// Cheaply cloneable; all clones share the count cache and per-user locks.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    backend: Box<dyn CartBackend>,
    /// Running total quantity per user. Entries exist only for users whose
    /// carts have been read or mutated since sign-in.
    counts: RwLock<HashMap<UserId, u32>>,
    /// Per-user mutation locks.
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl CartStore {
    /// Create a store over the given backend.
    pub fn new(backend: impl CartBackend + 'static) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                backend: Box::new(backend),
                counts: RwLock::new(HashMap::new()),
                user_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Add `quantity` units of `item` to the user's cart.
    ///
    /// Increments the existing line if one exists, inserts otherwise.
    /// Returns the new running count.
    ///
    /// # Errors
    ///
    /// [`CartError::Unauthenticated`] without a signed-in user;
    /// [`CartError::Remote`] if the backend call fails (count unchanged).
    #[instrument(skip(self, user), fields(item = %item, quantity))]
    pub async fn add(
        &self,
        user: Option<&CurrentUser>,
        item: ItemId,
        quantity: u32,
    ) -> Result<u32, CartError> {
        let user = user.ok_or(CartError::Unauthenticated)?;
        let lock = self.user_lock(user.id).await;
        let _guard = lock.lock().await;

        match self
            .inner
            .backend
            .find_line(&user.access_token, user.id, item)
            .await?
        {
            Some(line) => {
                self.inner
                    .backend
                    .set_quantity(&user.access_token, line.id, line.quantity + quantity)
                    .await?;
            }
            None => {
                self.inner
                    .backend
                    .insert_line(
                        &user.access_token,
                        &NewCartLine {
                            user_id: user.id,
                            item_id: item,
                            quantity,
                        },
                    )
                    .await?;
            }
        }

        self.adjust_count(user, i64::from(quantity)).await
    }

    /// Remove the line for `item` from the user's cart.
    ///
    /// A missing line is a benign no-op, not an error. Returns the running
    /// count after the operation.
    ///
    /// # Errors
    ///
    /// [`CartError::Unauthenticated`] without a signed-in user;
    /// [`CartError::Remote`] if the backend call fails (count unchanged).
    #[instrument(skip(self, user), fields(item = %item))]
    pub async fn remove(
        &self,
        user: Option<&CurrentUser>,
        item: ItemId,
    ) -> Result<u32, CartError> {
        let user = user.ok_or(CartError::Unauthenticated)?;
        let lock = self.user_lock(user.id).await;
        let _guard = lock.lock().await;

        let Some(line) = self
            .inner
            .backend
            .find_line(&user.access_token, user.id, item)
            .await?
        else {
            return Ok(self.count(Some(user)).await);
        };

        self.inner
            .backend
            .delete_line(&user.access_token, line.id)
            .await?;

        self.adjust_count(user, -i64::from(line.quantity)).await
    }

    /// Delete every line in the user's cart.
    ///
    /// # Errors
    ///
    /// [`CartError::Unauthenticated`] without a signed-in user;
    /// [`CartError::Remote`] if the backend call fails (count unchanged).
    #[instrument(skip(self, user))]
    pub async fn clear(&self, user: Option<&CurrentUser>) -> Result<(), CartError> {
        let user = user.ok_or(CartError::Unauthenticated)?;
        let lock = self.user_lock(user.id).await;
        let _guard = lock.lock().await;

        self.inner
            .backend
            .delete_all(&user.access_token, user.id)
            .await?;

        self.inner.counts.write().await.insert(user.id, 0);
        Ok(())
    }

    /// The user's running count. Always 0 for the unauthenticated.
    ///
    /// A cache miss triggers an authoritative fetch; a failed fetch reads
    /// as 0 without poisoning the cache.
    pub async fn count(&self, user: Option<&CurrentUser>) -> u32 {
        let Some(user) = user else { return 0 };

        if let Some(count) = self.inner.counts.read().await.get(&user.id).copied() {
            return count;
        }

        match self.refresh(user.id, &user.access_token).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "cart count fetch failed");
                0
            }
        }
    }

    /// All lines in the user's cart, for display.
    ///
    /// The fetch is authoritative, so the count cache is refreshed as a
    /// side effect.
    ///
    /// # Errors
    ///
    /// [`CartError::Unauthenticated`] without a signed-in user;
    /// [`CartError::Remote`] if the backend call fails.
    pub async fn lines(&self, user: Option<&CurrentUser>) -> Result<Vec<CartLine>, CartError> {
        let user = user.ok_or(CartError::Unauthenticated)?;
        let lines = self
            .inner
            .backend
            .fetch_lines(&user.access_token, user.id)
            .await?;
        let count = lines.iter().map(|line| line.quantity).sum();
        self.inner.counts.write().await.insert(user.id, count);
        Ok(lines)
    }

    /// Refetch the user's count from the backend and cache it.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cache entry is left as it was.
    pub async fn refresh(&self, user_id: UserId, access_token: &str) -> Result<u32, CartError> {
        let lines = self.inner.backend.fetch_lines(access_token, user_id).await?;
        let count = lines.iter().map(|line| line.quantity).sum();
        self.inner.counts.write().await.insert(user_id, count);
        Ok(count)
    }

    /// Drop cached state for a user (called on sign-out).
    pub async fn evict(&self, user_id: UserId) {
        self.inner.counts.write().await.remove(&user_id);
        self.inner.user_locks.lock().await.remove(&user_id);
    }

    /// Keep the count cache in sync with auth transitions: refetch on
    /// sign-in, evict on sign-out. Runs until the event channel closes.
    pub fn spawn_auth_listener(
        &self,
        mut events: broadcast::Receiver<AuthEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedIn {
                        user_id,
                        access_token,
                    }) => {
                        if let Err(e) = store.refresh(user_id, &access_token).await {
                            tracing::warn!(
                                error = %e,
                                user_id = %user_id,
                                "cart count refresh after sign-in failed"
                            );
                        }
                    }
                    Ok(AuthEvent::SignedOut { user_id }) => store.evict(user_id).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "cart store lagged behind auth events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Apply a confirmed delta to the cached count, fetching an
    /// authoritative baseline if the user has no entry yet.
    async fn adjust_count(&self, user: &CurrentUser, delta: i64) -> Result<u32, CartError> {
        let mut counts = self.inner.counts.write().await;
        if let Some(count) = counts.get_mut(&user.id) {
            *count = u32::try_from(i64::from(*count) + delta).unwrap_or(0);
            return Ok(*count);
        }
        drop(counts);

        self.refresh(user.id, &user.access_token).await
    }

    async fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.inner.user_locks.lock().await;
        Arc::clone(locks.entry(user_id).or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    use chrono::{TimeDelta, Utc};
    use uuid::Uuid;

    /// In-memory stand-in for the `cart_items` table.
    #[derive(Default)]
    struct MemoryBackend {
        lines: std::sync::Mutex<Vec<CartLine>>,
        next_id: AtomicI64,
        fail: AtomicBool,
    }

    impl MemoryBackend {
        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), SupabaseError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(SupabaseError::Api {
                    status: 503,
                    message: "backend down".to_string(),
                })
            } else {
                Ok(())
            }
        }

        fn line_count(&self) -> usize {
            self.lines.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CartBackend for Arc<MemoryBackend> {
        async fn find_line(
            &self,
            _token: &str,
            user: UserId,
            item: ItemId,
        ) -> Result<Option<CartLine>, SupabaseError> {
            self.check()?;
            Ok(self
                .lines
                .lock()
                .unwrap()
                .iter()
                .find(|line| line.user_id == user && line.item_id == item)
                .cloned())
        }

        async fn insert_line(&self, _token: &str, line: &NewCartLine) -> Result<(), SupabaseError> {
            self.check()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.lines.lock().unwrap().push(CartLine {
                id,
                user_id: line.user_id,
                item_id: line.item_id,
                quantity: line.quantity,
            });
            Ok(())
        }

        async fn set_quantity(
            &self,
            _token: &str,
            line_id: i64,
            quantity: u32,
        ) -> Result<(), SupabaseError> {
            self.check()?;
            let mut lines = self.lines.lock().unwrap();
            if let Some(line) = lines.iter_mut().find(|line| line.id == line_id) {
                line.quantity = quantity;
            }
            Ok(())
        }

        async fn delete_line(&self, _token: &str, line_id: i64) -> Result<(), SupabaseError> {
            self.check()?;
            self.lines.lock().unwrap().retain(|line| line.id != line_id);
            Ok(())
        }

        async fn delete_all(&self, _token: &str, user: UserId) -> Result<(), SupabaseError> {
            self.check()?;
            self.lines.lock().unwrap().retain(|line| line.user_id != user);
            Ok(())
        }

        async fn fetch_lines(
            &self,
            _token: &str,
            user: UserId,
        ) -> Result<Vec<CartLine>, SupabaseError> {
            self.check()?;
            Ok(self
                .lines
                .lock()
                .unwrap()
                .iter()
                .filter(|line| line.user_id == user)
                .cloned()
                .collect())
        }
    }

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(Uuid::new_v4()),
            email: "shopper@example.com".to_string(),
            access_token: "token".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        }
    }

    fn store() -> (CartStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::default());
        (CartStore::new(Arc::clone(&backend)), backend)
    }

    #[tokio::test]
    async fn test_add_requires_authentication() {
        let (store, _backend) = store();

        let result = store.add(None, ItemId::new(42), 1).await;
        assert!(matches!(result, Err(CartError::Unauthenticated)));
        assert_eq!(store.count(None).await, 0);
    }

    #[tokio::test]
    async fn test_add_inserts_then_increments_single_line() {
        let (store, backend) = store();
        let user = test_user();

        let count = store.add(Some(&user), ItemId::new(7), 2).await.unwrap();
        assert_eq!(count, 2);

        // Repeat add mutates the existing line instead of inserting another.
        let count = store.add(Some(&user), ItemId::new(7), 3).await.unwrap();
        assert_eq!(count, 5);
        assert_eq!(backend.line_count(), 1);
        assert_eq!(store.count(Some(&user)).await, 5);
    }

    #[tokio::test]
    async fn test_remove_returns_count_to_pre_add_value() {
        let (store, _backend) = store();
        let user = test_user();

        store.add(Some(&user), ItemId::new(1), 4).await.unwrap();
        let before = store.count(Some(&user)).await;

        store.add(Some(&user), ItemId::new(7), 2).await.unwrap();
        let after = store.remove(Some(&user), ItemId::new(7)).await.unwrap();

        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_remove_deletes_whole_line() {
        let (store, backend) = store();
        let user = test_user();

        store.add(Some(&user), ItemId::new(7), 5).await.unwrap();
        let count = store.remove(Some(&user), ItemId::new(7)).await.unwrap();

        assert_eq!(count, 0);
        assert_eq!(backend.line_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_absent_line_is_noop() {
        let (store, _backend) = store();
        let user = test_user();

        store.add(Some(&user), ItemId::new(1), 2).await.unwrap();
        let count = store.remove(Some(&user), ItemId::new(99)).await.unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_clear_resets_count() {
        let (store, backend) = store();
        let user = test_user();

        store.add(Some(&user), ItemId::new(1), 2).await.unwrap();
        store.add(Some(&user), ItemId::new(2), 3).await.unwrap();

        store.clear(Some(&user)).await.unwrap();
        assert_eq!(store.count(Some(&user)).await, 0);
        assert_eq!(backend.line_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_count_unchanged() {
        let (store, backend) = store();
        let user = test_user();

        store.add(Some(&user), ItemId::new(7), 2).await.unwrap();

        backend.set_failing(true);
        let result = store.add(Some(&user), ItemId::new(7), 3).await;
        assert!(matches!(result, Err(CartError::Remote(_))));

        backend.set_failing(false);
        assert_eq!(store.count(Some(&user)).await, 2);
    }

    #[tokio::test]
    async fn test_count_is_scoped_per_user() {
        let (store, _backend) = store();
        let alice = test_user();
        let bob = test_user();

        store.add(Some(&alice), ItemId::new(1), 2).await.unwrap();
        store.add(Some(&bob), ItemId::new(1), 7).await.unwrap();

        assert_eq!(store.count(Some(&alice)).await, 2);
        assert_eq!(store.count(Some(&bob)).await, 7);
    }

    #[tokio::test]
    async fn test_count_cold_cache_fetches_from_backend() {
        let (store, backend) = store();
        let user = test_user();

        // Rows exist remotely but the cache has never seen this user.
        backend
            .insert_line(
                "token",
                &NewCartLine {
                    user_id: user.id,
                    item_id: ItemId::new(3),
                    quantity: 4,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.count(Some(&user)).await, 4);
    }

    #[tokio::test]
    async fn test_concurrent_adds_serialize_per_user() {
        let (store, backend) = store();
        let user = test_user();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                store.add(Some(&user), ItemId::new(7), 1).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // All adds landed on one line and none were lost.
        assert_eq!(backend.line_count(), 1);
        assert_eq!(store.count(Some(&user)).await, 8);
    }

    #[tokio::test]
    async fn test_auth_listener_evicts_on_sign_out() {
        let (store, _backend) = store();
        let user = test_user();

        store.add(Some(&user), ItemId::new(1), 2).await.unwrap();

        let events = larkspur_supabase::AuthEvents::new();
        let handle = store.spawn_auth_listener(events.subscribe());

        events.publish(AuthEvent::SignedOut { user_id: user.id });
        drop(events);
        handle.await.unwrap();

        // The next count read is a cold fetch, still authoritative.
        assert_eq!(store.count(Some(&user)).await, 2);
        assert!(store.inner.counts.read().await.contains_key(&user.id));
    }
}
