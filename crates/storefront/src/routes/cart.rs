//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation goes through the cart store; failures surface as inline
//! notification markup and never adjust the count badge.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::ItemId;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::stores::CartError;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub item_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            item_count: 0,
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub item_id: i64,
    pub quantity: Option<u32>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: i64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Build the display view of a user's cart by joining lines against the
/// catalog. Items whose product row has vanished are skipped.
async fn build_cart_view(state: &AppState, user: Option<&CurrentUser>) -> CartView {
    let lines = match state.cart().lines(user).await {
        Ok(lines) => lines,
        Err(CartError::Unauthenticated) => return CartView::empty(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch cart lines");
            return CartView::empty();
        }
    };

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        match state.catalog().get(line.item_id).await {
            Ok(product) => {
                let line_total = product.price * Decimal::from(line.quantity);
                items.push(CartItemView {
                    item_id: line.item_id.as_i64(),
                    name: product.name.clone(),
                    quantity: line.quantity,
                    unit_price: product.price,
                    line_total,
                });
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    item_id = %line.item_id,
                    "cart references a product that no longer exists"
                );
            }
        }
    }

    CartView {
        subtotal: items.iter().map(|item| item.line_total).sum(),
        item_count: lines.iter().map(|line| line.quantity).sum(),
        items,
    }
}

/// Display cart page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<CartShowTemplate> {
    let cart = build_cart_view(&state, user.as_ref()).await;
    let cart_count = state.cart().count(user.as_ref()).await;

    Ok(CartShowTemplate {
        cart,
        signed_in: user.is_some(),
        cart_count,
    })
}

/// Inline notification markup for failed fragment requests.
fn notice(status: StatusCode, message: &str) -> Response {
    (
        status,
        Html(format!("<span class=\"notice notice-error\">{message}</span>")),
    )
        .into_response()
}

/// Add item to cart (HTMX).
///
/// Returns the count badge with an HTMX trigger so other fragments refresh.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantity = form.quantity.unwrap_or(1).max(1);

    match state
        .cart()
        .add(user.as_ref(), ItemId::new(form.item_id), quantity)
        .await
    {
        Ok(count) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate { count },
        )
            .into_response(),
        Err(CartError::Unauthenticated) => notice(
            StatusCode::UNAUTHORIZED,
            "Sign in to add items to your cart",
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to add item to cart");
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not add to cart, please try again",
            )
        }
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    match state
        .cart()
        .remove(user.as_ref(), ItemId::new(form.item_id))
        .await
    {
        Ok(_count) => {
            let cart = build_cart_view(&state, user.as_ref()).await;
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartItemsTemplate { cart },
            )
                .into_response()
        }
        Err(CartError::Unauthenticated) => {
            notice(StatusCode::UNAUTHORIZED, "Sign in to manage your cart")
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to remove item from cart");
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not update the cart, please try again",
            )
        }
    }
}

/// Empty the cart (HTMX).
#[instrument(skip(state, user))]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    match state.cart().clear(user.as_ref()).await {
        Ok(()) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate {
                cart: CartView::empty(),
            },
        )
            .into_response(),
        Err(CartError::Unauthenticated) => {
            notice(StatusCode::UNAUTHORIZED, "Sign in to manage your cart")
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to clear cart");
            notice(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not clear the cart, please try again",
            )
        }
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let count = state.cart().count(user.as_ref()).await;
    CartCountTemplate { count }
}
