//! Application state shared across handlers.

use std::sync::Arc;

use larkspur_supabase::Supabase;

use crate::config::AdminConfig;
use crate::services::RoleResolver;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    supabase: Supabase,
    roles: RoleResolver,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        let supabase = Supabase::new(config.supabase.clone());
        let roles = RoleResolver::new(supabase.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                roles,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the Supabase client.
    #[must_use]
    pub fn supabase(&self) -> &Supabase {
        &self.inner.supabase
    }

    /// Get a reference to the role resolver.
    #[must_use]
    pub fn roles(&self) -> &RoleResolver {
        &self.inner.roles
    }
}
