//! Product catalog operations.

use std::sync::Arc;

use chrono::Utc;

use loyalty_core::{LoyaltyError, Product, ProductId, Result};
use loyalty_store::{Store, StoreError};

use super::{not_found, require_non_blank};

/// Product catalog operations.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn Store>,
}

impl ProductService {
    /// Create a new product service over a storage backend.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::Validation`] when name or SKU is blank, or
    /// the price is negative.
    pub fn create(
        &self,
        name: &str,
        description: &str,
        price_cents: i64,
        sku: &str,
        stock_quantity: u32,
        category: &str,
    ) -> Result<Product> {
        require_non_blank(name, "name")?;
        require_non_blank(sku, "sku")?;
        if price_cents < 0 {
            return Err(LoyaltyError::Validation("price must not be negative".into()));
        }

        let product = Product::new(
            name.trim(),
            description,
            price_cents,
            sku.trim(),
            stock_quantity,
            category,
        );
        self.store.put_product(&product)?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Update a product. Returns `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::Validation`] when name or SKU is blank, or
    /// the price is negative.
    pub fn update(&self, product: Product) -> Result<Option<Product>> {
        let Some(stored) = self.store.get_product(&product.id)? else {
            return Ok(None);
        };

        require_non_blank(&product.name, "name")?;
        require_non_blank(&product.sku, "sku")?;
        if product.price_cents < 0 {
            return Err(LoyaltyError::Validation("price must not be negative".into()));
        }

        let mut updated = product;
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        self.store.put_product(&updated)?;
        Ok(Some(updated))
    }

    /// Delete a product. Returns `false` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn delete(&self, product_id: &ProductId) -> Result<bool> {
        match self.store.delete_product(product_id) {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a product's stock level; availability follows the quantity.
    ///
    /// Returns `false` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn set_stock(&self, product_id: &ProductId, quantity: u32) -> Result<bool> {
        let Some(mut product) = self.store.get_product(product_id)? else {
            return Ok(false);
        };

        product.stock_quantity = quantity;
        product.is_available = quantity > 0;
        product.updated_at = Utc::now();
        self.store.put_product(&product)?;

        tracing::debug!(product_id = %product_id, quantity, "Product stock set");
        Ok(true)
    }

    /// Check whether at least `quantity` units are in stock. Unknown products
    /// are never in stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn is_in_stock(&self, product_id: &ProductId, quantity: u32) -> Result<bool> {
        Ok(self
            .store
            .get_product(product_id)?
            .is_some_and(|p| p.is_in_stock(quantity)))
    }

    /// Units currently in stock for a product.
    ///
    /// # Errors
    ///
    /// Returns [`LoyaltyError::NotFound`] when the id is unknown.
    pub fn available_stock(&self, product_id: &ProductId) -> Result<u32> {
        self.store
            .get_product(product_id)?
            .map(|p| p.stock_quantity)
            .ok_or_else(|| not_found("product", product_id))
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn get(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.store.get_product(product_id)?)
    }

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products()?)
    }

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        Ok(self.store.list_products_by_category(category)?)
    }

    /// Search products by name or description, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn search(&self, term: &str) -> Result<Vec<Product>> {
        Ok(self.store.search_products(term)?)
    }

    /// List products with stock at or below the threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    pub fn low_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        Ok(self.store.list_low_stock(threshold)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loyalty_store::MemoryStore;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn create_validates_input() {
        let products = service();

        assert!(matches!(
            products.create("", "desc", 100, "SKU", 1, "misc"),
            Err(LoyaltyError::Validation(_))
        ));
        assert!(matches!(
            products.create("Mug", "desc", 100, " ", 1, "misc"),
            Err(LoyaltyError::Validation(_))
        ));
        assert!(matches!(
            products.create("Mug", "desc", -1, "SKU", 1, "misc"),
            Err(LoyaltyError::Validation(_))
        ));
    }

    #[test]
    fn set_stock_drives_availability() {
        let products = service();
        let product = products.create("Mug", "A mug", 12_50, "MUG-01", 5, "kitchen").unwrap();

        assert!(products.set_stock(&product.id, 0).unwrap());
        let stored = products.get(&product.id).unwrap().unwrap();
        assert_eq!(stored.stock_quantity, 0);
        assert!(!stored.is_available);

        assert!(products.set_stock(&product.id, 7).unwrap());
        let stored = products.get(&product.id).unwrap().unwrap();
        assert!(stored.is_available);

        assert!(!products.set_stock(&ProductId::generate(), 1).unwrap());
    }

    #[test]
    fn stock_queries() {
        let products = service();
        let product = products.create("Mug", "A mug", 12_50, "MUG-01", 3, "kitchen").unwrap();

        assert!(products.is_in_stock(&product.id, 3).unwrap());
        assert!(!products.is_in_stock(&product.id, 4).unwrap());
        assert!(!products.is_in_stock(&ProductId::generate(), 1).unwrap());
        assert_eq!(products.available_stock(&product.id).unwrap(), 3);
        assert!(matches!(
            products.available_stock(&ProductId::generate()),
            Err(LoyaltyError::NotFound { .. })
        ));
    }

    #[test]
    fn update_unknown_returns_none_and_delete_unknown_false() {
        let products = service();
        let ghost = Product::new("Ghost", "Not stored", 100, "GH-01", 1, "misc");

        assert!(products.update(ghost).unwrap().is_none());
        assert!(!products.delete(&ProductId::generate()).unwrap());
    }

    #[test]
    fn low_stock_and_search() {
        let products = service();
        products.create("Blue Mug", "Ceramic mug", 12_50, "MUG-01", 2, "kitchen").unwrap();
        products.create("Desk Lamp", "A lamp", 40_00, "LMP-01", 50, "office").unwrap();

        let low = products.low_stock(10).unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "MUG-01");

        let found = products.search("mug").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(products.list_by_category("office").unwrap().len(), 1);
    }
}
