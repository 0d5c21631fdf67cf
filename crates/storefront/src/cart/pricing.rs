//! Cart totals.

use rust_decimal::Decimal;
use tamarind_core::{CartItem, OrderSummary};

/// Aggregate reconciled cart items into an [`OrderSummary`].
///
/// An empty cart yields [`OrderSummary::EMPTY`]; the shipping fee applies
/// only once there is at least one item. Amounts are exact decimals, so
/// fractional costs sum without drift.
#[must_use]
pub fn totals(items: &[CartItem], shipping_fee: Decimal) -> OrderSummary {
    if items.is_empty() {
        return OrderSummary::EMPTY;
    }

    let item_count = items.iter().map(|item| item.quantity).sum();
    let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();

    OrderSummary {
        item_count,
        subtotal,
        shipping: shipping_fee,
        total: subtotal + shipping_fee,
    }
}

// =============================================================================
// Tests
// =============================================================================
