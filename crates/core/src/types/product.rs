//! Product catalog records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ItemId;

/// A row from the remote `products` table.
///
/// All fields except `image_url` are required; a row missing any of them is
/// rejected when the response is deserialized rather than propagated as a
/// half-empty product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Backend-assigned row ID.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Category slug (e.g., "ceramics", "textiles").
    pub category: String,
    /// Unit price in USD.
    pub price: Decimal,
    /// Public URL of the product image, if one has been uploaded.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting or updating a product row.
///
/// The backend assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_row() {
        let json = r#"{
            "id": 3,
            "name": "Stoneware Mug",
            "description": "Hand-thrown, 12oz.",
            "category": "ceramics",
            "price": "24.00",
            "image_url": null,
            "created_at": "2025-11-02T09:30:00Z"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ItemId::new(3));
        assert_eq!(product.category, "ceramics");
        assert!(product.image_url.is_none());
    }

    #[test]
    fn test_deserialize_rejects_missing_field() {
        // No price: the row must be rejected, not defaulted.
        let json = r#"{
            "id": 3,
            "name": "Stoneware Mug",
            "description": "Hand-thrown, 12oz.",
            "category": "ceramics",
            "created_at": "2025-11-02T09:30:00Z"
        }"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }

    #[test]
    fn test_new_product_skips_absent_image() {
        let new = NewProduct {
            name: "Wool Scarf".to_string(),
            description: "Plant-dyed merino.".to_string(),
            category: "textiles".to_string(),
            price: Decimal::new(4800, 2),
            image_url: None,
        };
        let json = serde_json::to_string(&new).unwrap();
        assert!(!json.contains("image_url"));
    }
}
