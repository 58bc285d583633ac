//! Locally-persisted favorite entries.

use serde::{Deserialize, Serialize};

use super::id::ItemId;

/// One bookmarked item, persisted on-device only.
///
/// Display fields are denormalized from the product at the time the item
/// was favorited so the favorites page renders without a catalog fetch.
/// They may go stale if the product is later edited; the `item_id` is the
/// identity used for membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub item_id: ItemId,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_roundtrip() {
        let entry = FavoriteEntry {
            item_id: ItemId::new(4),
            name: "Walnut Spoon".to_string(),
            category: "woodwork".to_string(),
            description: "Carved serving spoon.".to_string(),
            image_url: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: FavoriteEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }
}
