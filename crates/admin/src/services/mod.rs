//! Admin services.

pub mod roles;

pub use roles::RoleResolver;
