//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{ItemId, Product};

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
        }
    }
}

/// Category filter query parameters.
#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub categories: Vec<String>,
    pub current_category: Option<String>,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub item_id: i64,
    pub favorited: bool,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Display product listing page.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CategoryQuery>,
) -> Result<ProductsIndexTemplate> {
    // The unfiltered listing drives the category links; it is cached, so
    // the second fetch below is cheap.
    let all = state.catalog().list(None).await?;
    let mut categories: Vec<String> = all.iter().map(|p| p.category.clone()).collect();
    categories.sort();
    categories.dedup();

    let products = match query.category.as_deref() {
        Some(category) => state.catalog().list(Some(category)).await?,
        None => all,
    };

    let cart_count = state.cart().count(user.as_ref()).await;

    Ok(ProductsIndexTemplate {
        products: products.iter().map(ProductView::from).collect(),
        categories,
        current_category: query.category,
        signed_in: user.is_some(),
        cart_count,
    })
}

/// Display product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i64>,
) -> Result<ProductShowTemplate> {
    let item_id = ItemId::new(id);
    let product = state.catalog().get(item_id).await?;
    let favorited = state.favorites().is_favorite(item_id);
    let cart_count = state.cart().count(user.as_ref()).await;

    Ok(ProductShowTemplate {
        product: ProductView::from(product.as_ref()),
        item_id: id,
        favorited,
        signed_in: user.is_some(),
        cart_count,
    })
}
