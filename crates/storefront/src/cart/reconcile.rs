//! Joining cart entries against the product catalog.

use std::collections::HashMap;

use tamarind_core::{CartEntry, CartItem, Product, ProductId};

/// Join cart entries with their catalog products.
///
/// Produces one [`CartItem`] per entry whose product exists in `catalog`,
/// preserving entry order. Entries referencing products missing from the
/// catalog are dropped rather than rendered half-populated; callers that
/// care can compare lengths.
#[must_use]
pub fn reconcile(entries: &[CartEntry], catalog: &[Product]) -> Vec<CartItem> {
    let by_id: HashMap<&ProductId, &Product> =
        catalog.iter().map(|product| (&product.id, product)).collect();

    entries
        .iter()
        .filter_map(|entry| {
            by_id.get(&entry.product_id).map(|product| CartItem {
                product: (*product).clone(),
                quantity: entry.quantity,
            })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
