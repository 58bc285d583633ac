//! Process-wide state stores.
//!
//! Both stores are owned by `AppState` and injected into handlers; neither
//! is a module-level singleton. The cart store mirrors remote rows and
//! subscribes to auth transitions; the favorites store is device-local.

pub mod cart;
pub mod favorites;

pub use cart::{CartBackend, CartError, CartStore, SupabaseCartBackend};
pub use favorites::FavoritesStore;
