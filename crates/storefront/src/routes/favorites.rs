//! Favorites route handlers.
//!
//! Favorites live on this device only; toggling never makes a network call
//! beyond the (cached) product lookup that fills in display fields.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{FavoriteEntry, ItemId};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Favorite display data for templates.
#[derive(Clone)]
pub struct FavoriteView {
    pub item_id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl From<&FavoriteEntry> for FavoriteView {
    fn from(entry: &FavoriteEntry) -> Self {
        Self {
            item_id: entry.item_id.as_i64(),
            name: entry.name.clone(),
            category: entry.category.clone(),
            description: entry.description.clone(),
            image_url: entry.image_url.clone(),
        }
    }
}

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub item_id: i64,
}

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites/index.html")]
pub struct FavoritesIndexTemplate {
    pub favorites: Vec<FavoriteView>,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Favorite toggle button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/favorite_button.html")]
pub struct FavoriteButtonTemplate {
    pub item_id: i64,
    pub favorited: bool,
}

/// Display the favorites page.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> FavoritesIndexTemplate {
    let favorites = state
        .favorites()
        .all()
        .iter()
        .map(FavoriteView::from)
        .collect();
    let cart_count = state.cart().count(user.as_ref()).await;

    FavoritesIndexTemplate {
        favorites,
        signed_in: user.is_some(),
        cart_count,
    }
}

/// Toggle an item's favorite state (HTMX).
///
/// Returns the refreshed toggle button fragment.
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    Form(form): Form<ToggleForm>,
) -> Response {
    let item_id = ItemId::new(form.item_id);

    // Denormalize display fields from the (cached) catalog row so the
    // favorites page renders without further lookups.
    let product = match state.catalog().get(item_id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, %item_id, "favorite toggle for unknown product");
            return (
                StatusCode::NOT_FOUND,
                Html("<span class=\"notice notice-error\">This item is no longer available</span>"),
            )
                .into_response();
        }
    };

    let favorited = state.favorites().toggle(FavoriteEntry {
        item_id,
        name: product.name.clone(),
        category: product.category.clone(),
        description: product.description.clone(),
        image_url: product.image_url.clone(),
    });

    FavoriteButtonTemplate {
        item_id: form.item_id,
        favorited,
    }
    .into_response()
}
