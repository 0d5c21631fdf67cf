//! Product catalog snapshot store.
//!
//! Holds the most recently fetched product list. Both full catalog fetches
//! and search responses replace the snapshot wholesale; entries are never
//! merged across responses, so the store always reflects exactly one server
//! reply.

use tamarind_core::Product;

/// The current product snapshot.
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: Vec<Product>,
}

impl CatalogStore {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with `products`.
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    /// The products in the current snapshot, in server order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the snapshot holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
