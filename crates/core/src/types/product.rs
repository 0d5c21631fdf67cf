//! Product catalog types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A catalog product as served by the remote store service.
///
/// Products are immutable snapshots: the client never edits one, it only
/// replaces whole catalog listings when the server answers a fetch or a
/// search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned identifier.
    pub id: ProductId,
    /// Display name (e.g., "UNIFACTOR Mens Running Shoes").
    pub name: String,
    /// Category label (e.g., "Fashion").
    pub category: String,
    /// Unit cost in the store's single currency.
    pub cost: Decimal,
    /// Star rating, `0..=MAX_RATING`.
    pub rating: u8,
    /// URL of the product image.
    pub image_url: String,
}

impl Product {
    /// Highest representable star rating.
    pub const MAX_RATING: u8 = 5;
}
