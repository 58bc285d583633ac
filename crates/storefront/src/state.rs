//! Application state shared across handlers.

use std::sync::Arc;

use larkspur_supabase::Supabase;

use crate::config::StorefrontConfig;
use crate::services::{Catalog, SessionOracle};
use crate::stores::{CartStore, FavoritesStore, SupabaseCartBackend};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and owns the stores and the
/// session oracle outright - there are no module-level singletons. Stores
/// are wired to auth transitions via [`AppState::start_auth_listener`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    supabase: Supabase,
    oracle: SessionOracle,
    cart: CartStore,
    favorites: FavoritesStore,
    catalog: Catalog,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let supabase = Supabase::new(config.supabase.clone());
        let oracle = SessionOracle::new(&supabase);
        let cart = CartStore::new(SupabaseCartBackend::new(supabase.clone()));
        let favorites = FavoritesStore::load(&config.favorites_path);
        let catalog = Catalog::new(supabase.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                oracle,
                cart,
                favorites,
                catalog,
            }),
        }
    }

    /// Subscribe the cart store to sign-in/sign-out transitions.
    ///
    /// Called once at startup; the listener runs for the process lifetime.
    pub fn start_auth_listener(&self) {
        let _handle = self
            .inner
            .cart
            .spawn_auth_listener(self.inner.oracle.subscribe());
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &Supabase {
        &self.inner.supabase
    }

    /// Get a reference to the session oracle.
    #[must_use]
    pub fn oracle(&self) -> &SessionOracle {
        &self.inner.oracle
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the favorites store.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore {
        &self.inner.favorites
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
