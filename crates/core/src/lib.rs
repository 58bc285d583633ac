//! Larkspur Core - Shared types library.
//!
//! This crate provides common types used across all Larkspur components:
//! - `storefront` - Public-facing shop site
//! - `admin` - Internal administration panel for catalog management
//! - `cli` - Command-line tools for catalog seeding and role management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Every row
//! shape the remote backend returns is deserialized into one of these types
//! at the client boundary, so missing or malformed fields fail there instead
//! of leaking into handlers.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the role enum, and the remote row records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
