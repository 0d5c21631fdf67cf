//! Search debounce and response-ordering guarantees.
//!
//! Requirements covered:
//! - A typing burst produces one request, for the final text
//! - An empty query is valid and restores the full listing
//! - A no-match answer shows an empty listing without raising an error
//! - A slow response for superseded text never overwrites newer results
//! - A failed search reports its copy and leaves the listing alone

use std::time::Duration;

use tamarind_integration_tests::{
    TestContext, assert_no_event, await_cart, await_catalog, await_notification, wait_until,
};
use tamarind_storefront::Severity;

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test]
async fn test_typing_burst_sends_single_request() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);

    let (handle, mut events) = ctx.spawn_engine();
    handle.search_input("i").expect("engine stopped");
    handle.search_input("ip").expect("engine stopped");
    handle.search_input("iphone").expect("engine stopped");

    let products = await_catalog(&mut events).await;
    assert_eq!(products.len(), 1);
    assert_eq!(
        products.first().map(|product| product.name.as_str()),
        Some("iPhone XR")
    );

    // Only the settled text ever reached the wire.
    assert_eq!(ctx.store.search_requests(), vec!["iphone".to_owned()]);
}

#[tokio::test]
async fn test_empty_query_restores_full_listing() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);

    let (handle, mut events) = ctx.spawn_engine();
    handle.search_input("iphone").expect("engine stopped");
    assert_eq!(await_catalog(&mut events).await.len(), 1);
    let _ = await_cart(&mut events).await;

    handle.search_input("").expect("engine stopped");
    assert_eq!(await_catalog(&mut events).await.len(), 2);

    assert_eq!(
        ctx.store.search_requests(),
        vec!["iphone".to_owned(), String::new()]
    );
}

#[tokio::test]
async fn test_no_matches_yields_empty_listing_without_error() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);

    let (handle, mut events) = ctx.spawn_engine();
    handle.search_input("zzzz").expect("engine stopped");

    let products = await_catalog(&mut events).await;
    assert!(products.is_empty());
    let _ = await_cart(&mut events).await;

    // "Nothing matched" is an answer, not a failure.
    assert_no_event(&mut events, Duration::from_millis(150)).await;
}

// =============================================================================
// Response ordering
// =============================================================================

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.delay_search("fashion", Duration::from_millis(400));

    let (handle, mut events) = ctx.spawn_engine();
    handle.search_input("fashion").expect("engine stopped");
    wait_until("the slow search reaches the store", || {
        ctx.store.search_requests().iter().any(|query| query == "fashion")
    })
    .await;

    // Newer text settles while the first response is still in flight.
    handle.search_input("iphone").expect("engine stopped");
    let products = await_catalog(&mut events).await;
    assert_eq!(
        products.first().map(|product| product.name.as_str()),
        Some("iPhone XR")
    );
    let _ = await_cart(&mut events).await;

    // Let the slow response arrive; it must be dropped without a trace.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_no_event(&mut events, Duration::from_millis(50)).await;

    let snapshot = handle.snapshot().await.expect("engine stopped");
    assert_eq!(
        snapshot.products.first().map(|product| product.name.as_str()),
        Some("iPhone XR")
    );
    assert_eq!(
        ctx.store.search_requests(),
        vec!["fashion".to_owned(), "iphone".to_owned()]
    );
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_search_failure_reports_copy_and_keeps_listing() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-phone", "iPhone XR", "Phones", 100, 4);

    let (handle, mut events) = ctx.spawn_engine();
    handle.refresh().expect("engine stopped");
    assert_eq!(await_catalog(&mut events).await.len(), 1);
    let _ = await_cart(&mut events).await;

    ctx.store.set_fail_search(true);
    handle.search_input("anything").expect("engine stopped");

    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(note.message, "Something went wrong. Failed to fetch products.");

    let snapshot = handle.snapshot().await.expect("engine stopped");
    assert_eq!(snapshot.products.len(), 1);
}
