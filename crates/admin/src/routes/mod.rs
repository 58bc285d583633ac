//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /products
//! GET  /health                 - Health check
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (password + admin role)
//! POST /auth/logout            - Logout action
//!
//! # Products (gated)
//! GET  /products               - Product list
//! GET  /products/new           - New product form
//! POST /products               - Create product (multipart, optional image)
//! GET  /products/{id}/edit     - Edit product form
//! POST /products/{id}          - Update product (multipart, optional image)
//! POST /products/{id}/delete   - Delete product
//! ```

pub mod auth;
pub mod products;

use askama::Template;
use axum::{
    Router,
    response::{Html, Redirect},
    routing::{get, post},
};

use crate::state::AppState;

/// Render a template, degrading to a plain 500 body on failure.
pub fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_string()
    }))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        // Auth routes (outside the gate, so the login redirect cannot loop)
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Product CRUD (every handler takes RequireAdmin)
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/delete", post(products::delete))
}
