//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Display the home page with the newest products.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<HomeTemplate> {
    let products = state.catalog().list(None).await?;
    let cart_count = state.cart().count(user.as_ref()).await;

    Ok(HomeTemplate {
        products: products
            .iter()
            .take(FEATURED_COUNT)
            .map(ProductView::from)
            .collect(),
        signed_in: user.is_some(),
        cart_count,
    })
}
