//! Shared type definitions.

pub mod cart;
pub mod favorite;
pub mod feedback;
pub mod id;
pub mod product;
pub mod role;

pub use cart::{CartLine, NewCartLine};
pub use favorite::FavoriteEntry;
pub use feedback::{FeedbackEntry, NewFeedback, Rating, RatingError};
pub use id::{FeedbackId, ItemId, UserId};
pub use product::{NewProduct, Product};
pub use role::Role;
