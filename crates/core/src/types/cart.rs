//! Cart types.
//!
//! The cart is stored sparsely as [`CartEntry`] values (product reference
//! plus quantity). Everything a display layer needs beyond that is derived:
//! [`CartItem`] joins an entry with its catalog product, and [`OrderSummary`]
//! aggregates the joined items. Derived values are never persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::product::Product;

/// A single cart line as synchronized with the server.
///
/// Invariants (maintained by the owning store, not the type):
/// - `quantity >= 1`; a quantity of zero means the entry does not exist
/// - at most one entry per `product_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Units of the product, always at least 1.
    pub quantity: u32,
}

impl CartEntry {
    /// Create a cart entry.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A cart entry joined with its catalog product.
///
/// Recomputed from the entry and catalog snapshots on every read; carts
/// whose entry has no matching catalog product simply omit that line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The catalog product backing this line.
    pub product: Product,
    /// Units of the product.
    pub quantity: u32,
}

impl CartItem {
    /// Cost of this line (`cost * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.cost * Decimal::from(self.quantity)
    }
}

/// Aggregated cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Sum of all line quantities.
    pub item_count: u32,
    /// Sum of all line totals.
    pub subtotal: Decimal,
    /// Flat shipping fee applied to non-empty carts.
    pub shipping: Decimal,
    /// `subtotal + shipping`.
    pub total: Decimal,
}

impl OrderSummary {
    /// The summary of an empty cart. Shipping is not charged on nothing.
    pub const EMPTY: Self = Self {
        item_count: 0,
        subtotal: Decimal::ZERO,
        shipping: Decimal::ZERO,
        total: Decimal::ZERO,
    };

    /// Whether this summary describes an empty cart.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}
