//! Seed the product catalog from a YAML file.
//!
//! Reads and validates the whole file before touching the backend, then
//! inserts every product in one batch through the service-role key.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

use larkspur_core::NewProduct;
use larkspur_supabase::{Supabase, SupabaseConfig};

/// Top-level catalog file shape.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<CatalogProduct>,
}

/// One product entry in the catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Seed products from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML catalog file
/// * `clear_existing` - If true, delete every existing product row first
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or validated, or the backend calls fail.
pub async fn products(
    file_path: &str,
    clear_existing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = SupabaseConfig::from_env()?;
    config.require_service_role_key()?;

    // Verify file exists
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before touching the backend
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(products = catalog.products.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Catalog validated successfully");

    let client = Supabase::new(config);

    if clear_existing {
        warn!("Deleting all existing products");
        client
            .table("products")
            .service_role()?
            .delete()
            .execute()
            .await?;
    }

    let rows: Vec<NewProduct> = catalog
        .products
        .into_iter()
        .map(|product| NewProduct {
            name: product.name,
            description: product.description,
            category: product.category.to_lowercase(),
            price: product.price,
            image_url: product.image_url,
        })
        .collect();

    let inserted = rows.len();
    client
        .table("products")
        .service_role()?
        .insert(&rows)
        .await?;

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");

    Ok(())
}

/// Validate a parsed catalog, collecting every problem instead of stopping
/// at the first.
fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    if catalog.products.is_empty() {
        errors.push("catalog contains no products".to_string());
    }

    for (index, product) in catalog.products.iter().enumerate() {
        let position = index + 1;
        if product.name.trim().is_empty() {
            errors.push(format!("product {position}: name is empty"));
        }
        if product.category.trim().is_empty() {
            errors.push(format!("product {position}: category is empty"));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!(
                "product {position} ({}): price is negative",
                product.name
            ));
        }
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID_CATALOG: &str = r"
products:
  - name: Stoneware Mug
    description: Hand-thrown, 12oz.
    category: Ceramics
    price: 24.00
  - name: Wool Scarf
    description: Plant-dyed merino.
    category: textiles
    price: 48.00
    image_url: https://example.com/scarf.jpg
";

    #[test]
    fn test_parse_valid_catalog() {
        let catalog: CatalogFile = serde_yaml::from_str(VALID_CATALOG).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].name, "Stoneware Mug");
        assert!(catalog.products[0].image_url.is_none());
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_validate_empty_catalog() {
        let catalog: CatalogFile = serde_yaml::from_str("products: []").unwrap();
        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let yaml = r"
products:
  - name: ''
    description: d
    category: ''
    price: -1
";
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 3);
    }
}
