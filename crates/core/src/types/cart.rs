//! Cart line records.

use serde::{Deserialize, Serialize};

use super::id::{ItemId, UserId};

/// A row from the remote `cart_items` table.
///
/// There is at most one row per `(user_id, item_id)` pair; repeat adds
/// mutate `quantity` instead of inserting a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Backend-assigned row ID.
    pub id: i64,
    /// Owner of the line.
    pub user_id: UserId,
    /// The product this line holds.
    pub item_id: ItemId,
    /// Units of the item; always at least 1 (a line that would drop to 0
    /// is deleted instead).
    pub quantity: u32,
}

/// Fields for inserting a cart line. The backend assigns `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_deserialize_row() {
        let user = Uuid::new_v4();
        let json = format!(
            r#"{{"id": 10, "user_id": "{user}", "item_id": 7, "quantity": 2}}"#
        );
        let line: CartLine = serde_json::from_str(&json).unwrap();
        assert_eq!(line.item_id, ItemId::new(7));
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_deserialize_rejects_negative_quantity() {
        let user = Uuid::new_v4();
        let json = format!(
            r#"{{"id": 10, "user_id": "{user}", "item_id": 7, "quantity": -1}}"#
        );
        assert!(serde_json::from_str::<CartLine>(&json).is_err());
    }
}
