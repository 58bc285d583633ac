//! Product CRUD route handlers.
//!
//! Reads and row writes run under the admin's own token; image uploads go
//! through the service-role key because storage writes are bucket-level,
//! not row-level.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, Redirect},
};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use larkspur_core::{NewProduct, Product};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::render;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub created: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            created: product.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_email: String,
    pub products: Vec<ProductView>,
}

/// Product form page template (used for both create and edit).
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_email: String,
    pub heading: String,
    pub action: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image_url: Option<String>,
}

/// Parsed multipart product form.
struct ProductForm {
    name: String,
    description: String,
    category: String,
    price: Decimal,
    image: Option<UploadedImage>,
}

/// An uploaded image file.
struct UploadedImage {
    bytes: Vec<u8>,
    content_type: String,
    extension: String,
}

/// Parse the multipart product form shared by create and update.
async fn parse_product_form(multipart: &mut Multipart) -> Result<ProductForm> {
    let mut name = String::new();
    let mut description = String::new();
    let mut category = String::new();
    let mut price_raw = String::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("name") => name = field.text().await?,
            Some("description") => description = field.text().await?,
            Some("category") => category = field.text().await?,
            Some("price") => price_raw = field.text().await?,
            Some("image") => {
                let extension = field
                    .file_name()
                    .and_then(|file_name| file_name.rsplit('.').next())
                    .unwrap_or("jpg")
                    .to_ascii_lowercase();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                // Browsers submit an empty file part when nothing was chosen.
                if !bytes.is_empty() {
                    image = Some(UploadedImage {
                        bytes: bytes.to_vec(),
                        content_type,
                        extension,
                    });
                }
            }
            _ => {}
        }
    }

    let name = name.trim().to_string();
    let category = category.trim().to_lowercase();
    if name.is_empty() || category.is_empty() {
        return Err(AppError::BadRequest(
            "name and category are required".to_string(),
        ));
    }

    let price: Decimal = price_raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("price must be a number".to_string()))?;
    if price < Decimal::ZERO {
        return Err(AppError::BadRequest("price cannot be negative".to_string()));
    }

    Ok(ProductForm {
        name,
        description: description.trim().to_string(),
        category,
        price,
        image,
    })
}

/// Upload a product image and return its public URL.
async fn upload_image(state: &AppState, image: UploadedImage) -> Result<String> {
    let bucket = &state.config().image_bucket;
    let path = format!("products/{}.{}", Uuid::new_v4(), image.extension);

    state
        .supabase()
        .storage()
        .upload(bucket, &path, image.bytes, &image.content_type)
        .await?;

    Ok(state.supabase().storage().public_url(bucket, &path))
}

/// Products list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let products: Vec<Product> = state
        .supabase()
        .table("products")
        .auth(&admin.access_token)
        .select("*")
        .order("created_at", true)
        .fetch()
        .await?;

    Ok(render(&ProductsIndexTemplate {
        admin_email: admin.email,
        products: products.iter().map(ProductView::from).collect(),
    }))
}

/// New product form handler.
#[instrument(skip(admin))]
pub async fn new(RequireAdmin(admin): RequireAdmin) -> Html<String> {
    render(&ProductFormTemplate {
        admin_email: admin.email,
        heading: "New product".to_string(),
        action: "/products".to_string(),
        name: String::new(),
        description: String::new(),
        category: String::new(),
        price: String::new(),
        image_url: None,
    })
}

/// Create product handler.
#[instrument(skip(admin, state, multipart))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect> {
    let form = parse_product_form(&mut multipart).await?;

    let image_url = match form.image {
        Some(image) => Some(upload_image(&state, image).await?),
        None => None,
    };

    let row = NewProduct {
        name: form.name.clone(),
        description: form.description,
        category: form.category,
        price: form.price,
        image_url,
    };

    state
        .supabase()
        .table("products")
        .auth(&admin.access_token)
        .insert(std::slice::from_ref(&row))
        .await?;

    tracing::info!(name = %form.name, "product created");
    Ok(Redirect::to("/products"))
}

/// Edit product form handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let product: Product = state
        .supabase()
        .table("products")
        .auth(&admin.access_token)
        .select("*")
        .eq("id", id)
        .single()
        .await?;

    Ok(render(&ProductFormTemplate {
        admin_email: admin.email,
        heading: format!("Edit {}", product.name),
        action: format!("/products/{id}"),
        name: product.name,
        description: product.description,
        category: product.category,
        price: product.price.to_string(),
        image_url: product.image_url,
    }))
}

/// Update product handler.
#[instrument(skip(admin, state, multipart))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Redirect> {
    let form = parse_product_form(&mut multipart).await?;

    let mut patch = serde_json::json!({
        "name": form.name,
        "description": form.description,
        "category": form.category,
        "price": form.price,
    });

    // Only touch the stored image when a new one was uploaded.
    if let Some(image) = form.image {
        let url = upload_image(&state, image).await?;
        patch["image_url"] = serde_json::Value::String(url);
    }

    state
        .supabase()
        .table("products")
        .auth(&admin.access_token)
        .update(&patch)
        .eq("id", id)
        .execute()
        .await?;

    tracing::info!(product_id = id, "product updated");
    Ok(Redirect::to("/products"))
}

/// Delete product handler.
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    state
        .supabase()
        .table("products")
        .auth(&admin.access_token)
        .delete()
        .eq("id", id)
        .execute()
        .await?;

    tracing::info!(product_id = id, "product deleted");
    Ok(Redirect::to("/products"))
}
