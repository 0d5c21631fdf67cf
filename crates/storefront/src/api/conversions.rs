//! Wire-to-domain conversion functions.

use tamarind_core::{CartEntry, Product, ProductId};

use super::types::{CartEntryData, ProductData};

/// Convert a wire product into the domain type.
///
/// Out-of-range ratings are clamped rather than rejected; a bad rating is
/// not worth losing the product over.
pub fn convert_product(data: ProductData) -> Product {
    let rating = data.rating.clamp(0, i64::from(Product::MAX_RATING));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5 above
    let rating = rating as u8;

    Product {
        id: ProductId::new(data.id),
        name: data.name,
        category: data.category,
        cost: data.cost,
        rating,
        image_url: data.image,
    }
}

/// Convert a wire product listing into domain products.
pub fn convert_products(data: Vec<ProductData>) -> Vec<Product> {
    data.into_iter().map(convert_product).collect()
}

/// Convert wire cart lines into domain entries.
///
/// Lines with a zero or negative quantity are semantically absent and are
/// dropped here, so stores never hold them.
pub fn convert_cart_entries(data: Vec<CartEntryData>) -> Vec<CartEntry> {
    data.into_iter()
        .filter_map(|entry| {
            let quantity = u32::try_from(entry.qty).ok().filter(|qty| *qty > 0)?;
            Some(CartEntry::new(ProductId::new(entry.product_id), quantity))
        })
        .collect()
}
