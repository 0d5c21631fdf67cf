//! Terminal tables for command results.
//!
//! Free-form text (identifiers, names) goes in the last column so padding
//! never has to truncate it.

use rust_decimal::Decimal;
use tamarind_core::{CartItem, OrderSummary, Product};

/// Print the catalog listing.
#[allow(clippy::print_stdout)]
pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    println!(
        "{:<18} {:>10} {:>7}  {:<14} {}",
        "ID", "COST", "RATING", "CATEGORY", "NAME"
    );
    for product in products {
        println!(
            "{:<18} {:>10} {:>7}  {:<14} {}",
            product.id.to_string(),
            product.cost.to_string(),
            format!("{}/{}", product.rating, Product::MAX_RATING),
            product.category,
            product.name,
        );
    }
    println!("({} products)", products.len());
}

/// Print cart lines and totals.
#[allow(clippy::print_stdout)]
pub fn cart(items: &[CartItem], summary: &OrderSummary) {
    if items.is_empty() {
        println!("Cart is empty.");
        return;
    }
    println!(
        "{:<18} {:>4} {:>10} {:>10}  {}",
        "ID", "QTY", "UNIT", "LINE", "NAME"
    );
    for item in items {
        println!(
            "{:<18} {:>4} {:>10} {:>10}  {}",
            item.product.id.to_string(),
            item.quantity,
            item.product.cost.to_string(),
            item.line_total().to_string(),
            item.product.name,
        );
    }
    println!();
    println!(
        "Items: {}  Subtotal: {}  Shipping: {}  Total: {}",
        summary.item_count, summary.subtotal, summary.shipping, summary.total
    );
}

/// Print the wallet balance.
#[allow(clippy::print_stdout)]
pub fn balance(balance: Decimal) {
    println!("Wallet balance: {balance}");
}
