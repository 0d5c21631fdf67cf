//! The optimistic cart mutation protocol, end to end.
//!
//! Requirements covered:
//! - Mutations apply locally first and settle against the server snapshot
//! - Guard rails: login required, duplicate adds, items not in the cart
//! - A failed write rolls the entry back and reports the failure first
//! - Writes for one product never overlap; the newest queued target wins
//! - Cart lines without a catalog product stay hidden from totals

use std::time::Duration;

use rust_decimal::Decimal;

use tamarind_core::{CartItem, OrderSummary, ProductId};
use tamarind_integration_tests::{
    TestContext, assert_no_event, await_cart, await_notification, login_through_engine,
    refresh_and_sync,
};
use tamarind_storefront::Severity;

fn quantity_of(items: &[CartItem], id: &str) -> Option<u32> {
    items
        .iter()
        .find(|item| item.product.id.as_str() == id)
        .map(|item| item.quantity)
}

// =============================================================================
// The mutation round trip
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_round_trip() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);

    let (handle, mut events) = ctx.spawn_engine();
    let session = login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    assert_eq!(session.username().as_str(), "bobook");
    assert_eq!(session.balance(), Decimal::from(5000));

    let products = refresh_and_sync(&handle, &mut events).await;
    assert_eq!(products.len(), 1);

    handle
        .add_to_cart(ProductId::from("p-shoes"))
        .expect("engine stopped");

    // The optimistic snapshot lands before the server answers.
    let (items, summary) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(1));
    assert_eq!(summary.item_count, 1);
    assert_eq!(summary.subtotal, Decimal::from(50));
    assert_eq!(summary.total, Decimal::from(50));

    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Success);
    assert_eq!(note.message, "product added to cart.");

    // The settled snapshot confirms the same quantity.
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(1));

    assert_eq!(ctx.store.cart_posts(), vec![("p-shoes".to_owned(), 1)]);
    assert_eq!(ctx.store.cart_of("bobook"), vec![("p-shoes".to_owned(), 1)]);
}

#[tokio::test]
async fn test_increment_and_decrement_walk_the_quantity() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 1)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    let shoes = ProductId::from("p-shoes");

    handle.increment_quantity(shoes.clone()).expect("engine stopped");
    let (items, summary) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(2));
    assert_eq!(summary.subtotal, Decimal::from(100));
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(2));

    handle.decrement_quantity(shoes.clone()).expect("engine stopped");
    let _ = await_cart(&mut events).await;
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(1));

    // Decrementing the last unit removes the line entirely.
    handle.decrement_quantity(shoes).expect("engine stopped");
    let (items, summary) = await_cart(&mut events).await;
    assert!(items.is_empty());
    assert_eq!(summary, OrderSummary::EMPTY);
    let _ = await_cart(&mut events).await;

    assert_eq!(
        ctx.store.cart_posts(),
        vec![
            ("p-shoes".to_owned(), 2),
            ("p-shoes".to_owned(), 1),
            ("p-shoes".to_owned(), 0),
        ]
    );
    assert!(ctx.store.cart_of("bobook").is_empty());
}

#[tokio::test]
async fn test_set_quantity_jumps_to_target_and_adds_when_absent() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 2)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    handle
        .set_quantity(ProductId::from("p-shoes"), 5)
        .expect("engine stopped");
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(5));
    let _ = await_cart(&mut events).await;

    // Setting a product that is not in the cart behaves as an add.
    handle
        .set_quantity(ProductId::from("p-phone"), 3)
        .expect("engine stopped");
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-phone"), Some(3));
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Success);
    assert_eq!(note.message, "product added to cart.");
    let _ = await_cart(&mut events).await;

    assert_eq!(
        ctx.store.cart_posts(),
        vec![("p-shoes".to_owned(), 5), ("p-phone".to_owned(), 3)]
    );
}

#[tokio::test]
async fn test_set_to_zero_removes_and_absent_removal_is_silent() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 3)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    handle
        .set_quantity(ProductId::from("p-shoes"), 0)
        .expect("engine stopped");
    let (items, summary) = await_cart(&mut events).await;
    assert!(items.is_empty());
    assert_eq!(summary, OrderSummary::EMPTY);
    let _ = await_cart(&mut events).await;

    // Removing something that was never in the cart does nothing at all.
    handle
        .set_quantity(ProductId::from("p-phone"), 0)
        .expect("engine stopped");
    assert_no_event(&mut events, Duration::from_millis(200)).await;

    assert_eq!(ctx.store.cart_posts(), vec![("p-shoes".to_owned(), 0)]);
    assert!(ctx.store.cart_of("bobook").is_empty());
}

// =============================================================================
// Guard rails
// =============================================================================

#[tokio::test]
async fn test_mutations_require_login() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);

    let (handle, mut events) = ctx.spawn_engine();
    handle
        .add_to_cart(ProductId::from("p-shoes"))
        .expect("engine stopped");

    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Login to add an item to the Cart");

    assert_no_event(&mut events, Duration::from_millis(150)).await;
    assert!(ctx.store.cart_posts().is_empty());
}

#[tokio::test]
async fn test_duplicate_add_is_rejected_locally() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 1)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    handle
        .add_to_cart(ProductId::from("p-shoes"))
        .expect("engine stopped");

    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(
        note.message,
        "Item already in cart. Use the cart sidebar to update quantity or remove item."
    );

    assert_no_event(&mut events, Duration::from_millis(150)).await;
    assert!(ctx.store.cart_posts().is_empty());
}

#[tokio::test]
async fn test_stepping_a_missing_item_warns() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    handle
        .increment_quantity(ProductId::from("p-shoes"))
        .expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Item not in cart.");

    handle
        .decrement_quantity(ProductId::from("p-shoes"))
        .expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Item not in cart.");

    assert!(ctx.store.cart_posts().is_empty());
}

// =============================================================================
// Failure and rollback
// =============================================================================

#[tokio::test]
async fn test_failed_write_rolls_back_and_recovers() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 2)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    ctx.store.set_fail_cart_writes(true);
    handle
        .increment_quantity(ProductId::from("p-shoes"))
        .expect("engine stopped");

    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(3));

    // The failure is reported before the rollback snapshot.
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(note.message, "Something went wrong. Failed to update cart.");

    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(2));
    assert_eq!(ctx.store.cart_posts(), vec![("p-shoes".to_owned(), 3)]);

    // The product is writable again once the store recovers.
    ctx.store.set_fail_cart_writes(false);
    handle
        .increment_quantity(ProductId::from("p-shoes"))
        .expect("engine stopped");
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(3));
    let (items, _) = await_cart(&mut events).await;
    assert_eq!(quantity_of(&items, "p-shoes"), Some(3));
    assert_eq!(ctx.store.cart_of("bobook"), vec![("p-shoes".to_owned(), 3)]);
}

// =============================================================================
// Write serialization
// =============================================================================

#[tokio::test]
async fn test_rapid_sets_serialize_and_newest_target_wins() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 1)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    // Hold every write response long enough for the burst to pile up.
    ctx.store.set_cart_write_delay(Duration::from_millis(100));

    let shoes = ProductId::from("p-shoes");
    handle.set_quantity(shoes.clone(), 2).expect("engine stopped");
    handle.set_quantity(shoes.clone(), 9).expect("engine stopped");
    handle.set_quantity(shoes, 4).expect("engine stopped");

    // Three optimistic snapshots, then the first write settles and the
    // coalesced follow-up (the newest target) dispatches and settles.
    let mut seen = Vec::new();
    for _ in 0..5 {
        let (items, _) = await_cart(&mut events).await;
        seen.push(quantity_of(&items, "p-shoes"));
    }
    assert_eq!(seen, vec![Some(2), Some(9), Some(4), Some(4), Some(4)]);
    assert_no_event(&mut events, Duration::from_millis(250)).await;

    // The intermediate target never reached the wire.
    assert_eq!(
        ctx.store.cart_posts(),
        vec![("p-shoes".to_owned(), 2), ("p-shoes".to_owned(), 4)]
    );
    assert_eq!(ctx.store.cart_of("bobook"), vec![("p-shoes".to_owned(), 4)]);
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn test_cart_lines_without_catalog_product_stay_hidden() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store
        .seed_cart("bobook", &[("p-shoes", 1), ("p-ghost", 2)]);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    refresh_and_sync(&handle, &mut events).await;

    // The unknown line is carried but never displayed or totalled.
    let snapshot = handle.snapshot().await.expect("engine stopped");
    assert_eq!(snapshot.cart_items.len(), 1);
    assert_eq!(quantity_of(&snapshot.cart_items, "p-shoes"), Some(1));
    assert_eq!(snapshot.summary.item_count, 1);
    assert_eq!(snapshot.summary.subtotal, Decimal::from(50));
}
