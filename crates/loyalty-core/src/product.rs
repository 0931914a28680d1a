//! Product catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A product available for purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// The product id.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Description.
    pub description: String,

    /// Live price, in cents. Orders snapshot this into their line items.
    pub price_cents: i64,

    /// Stock-keeping unit.
    pub sku: String,

    /// Units in stock. Never negative.
    pub stock_quantity: u32,

    /// Whether the product can currently be ordered.
    pub is_available: bool,

    /// Category label.
    pub category: String,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new available product.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price_cents: i64,
        sku: impl Into<String>,
        stock_quantity: u32,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            name: name.into(),
            description: description.into(),
            price_cents,
            sku: sku.into(),
            stock_quantity,
            is_available: true,
            category: category.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if at least `quantity` units are in stock.
    #[must_use]
    pub fn is_in_stock(&self, quantity: u32) -> bool {
        self.stock_quantity >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_is_available() {
        let product = Product::new("Mug", "Ceramic mug", 12_50, "MUG-01", 5, "kitchen");
        assert!(product.is_available);
        assert_eq!(product.stock_quantity, 5);
    }

    #[test]
    fn stock_check() {
        let product = Product::new("Mug", "Ceramic mug", 12_50, "MUG-01", 3, "kitchen");
        assert!(product.is_in_stock(3));
        assert!(!product.is_in_stock(4));
        assert!(product.is_in_stock(0));
    }
}
