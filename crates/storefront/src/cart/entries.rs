//! Cart entry store.
//!
//! Holds the local mirror of the server-side cart as minimal entries.
//! Entries keep their insertion order and each product appears at most once.
//! Server snapshots replace the whole store; optimistic edits touch single
//! entries and are later confirmed or rolled back by the mutation flow.

use tamarind_core::{CartEntry, ProductId};

/// The local cart entries, in insertion order.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<CartEntry>,
}

impl EntryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries with a server snapshot.
    ///
    /// The snapshot wins outright; local entries absent from it are dropped.
    pub fn replace(&mut self, entries: Vec<CartEntry>) {
        self.entries = entries;
    }

    /// The current entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Quantity held for `product_id`, if the product is in the cart.
    #[must_use]
    pub fn quantity(&self, product_id: &ProductId) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.product_id == *product_id)
            .map(|entry| entry.quantity)
    }

    /// Whether `product_id` has an entry.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.quantity(product_id).is_some()
    }

    /// Set `product_id` to `quantity`, appending a new entry if absent.
    ///
    /// Callers remove via [`EntryStore::remove`]; `quantity` must be at
    /// least 1.
    pub fn upsert(&mut self, product_id: ProductId, quantity: u32) {
        debug_assert!(quantity >= 1, "upsert with zero quantity");
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.product_id == product_id)
        {
            entry.quantity = quantity;
        } else {
            self.entries.push(CartEntry::new(product_id, quantity));
        }
    }

    /// Remove the entry for `product_id`, returning its quantity if present.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<u32> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.product_id == *product_id)?;
        Some(self.entries.remove(index).quantity)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
