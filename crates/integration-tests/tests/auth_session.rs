//! Registration, login, and session persistence.
//!
//! Requirements covered:
//! - Register and login round trips, including the follow-up cart fetch
//! - Local validation failures warn without touching the network
//! - Server rejections surface their message verbatim
//! - Sessions persist across engines and are forgotten on logout

use std::time::Duration;

use rust_decimal::Decimal;

use tamarind_integration_tests::{
    TestContext, assert_no_event, await_cart, await_notification, await_session,
    login_through_engine, refresh_and_sync, wait_until,
};
use tamarind_storefront::Severity;

// =============================================================================
// Register and login
// =============================================================================

#[tokio::test]
async fn test_register_then_login_flow() {
    let ctx = TestContext::new().await;
    let (handle, mut events) = ctx.spawn_engine();

    handle
        .register("bobook", "learnbyheart", "learnbyheart")
        .expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Success);
    assert_eq!(note.message, "Registered Successfully");
    assert!(ctx.store.has_user("bobook"));

    handle.login("bobook", "learnbyheart").expect("engine stopped");
    let session = await_session(&mut events)
        .await
        .expect("login did not produce a session");
    assert_eq!(session.username().as_str(), "bobook");
    assert_eq!(session.balance(), Decimal::from(5000));

    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Success);
    assert_eq!(note.message, "Logged in successfully");

    // Logging in triggers a cart fetch; a new account has nothing in it.
    let (items, _) = await_cart(&mut events).await;
    assert!(items.is_empty());

    assert_eq!(ctx.store.auth_requests(), 2);
}

#[tokio::test]
async fn test_validation_failures_stay_local() {
    let ctx = TestContext::new().await;
    let (handle, mut events) = ctx.spawn_engine();

    handle
        .register("abc", "learnbyheart", "learnbyheart")
        .expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Username must be at least 6 characters");

    handle.register("bobook", "lea", "lea").expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Password must be at least 6 characters");

    handle
        .register("bobook", "learnbyheart", "different")
        .expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Passwords do not match");

    handle.login("", "whatever").expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Warning);
    assert_eq!(note.message, "Username is a required field");

    // None of the rejected requests left the client.
    assert_eq!(ctx.store.auth_requests(), 0);
}

#[tokio::test]
async fn test_server_rejections_surface_their_message() {
    let ctx = TestContext::new().await;
    ctx.store.seed_user("bobook", "learnbyheart", 5000);

    let (handle, mut events) = ctx.spawn_engine();

    handle
        .register("bobook", "learnbyheart", "learnbyheart")
        .expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(note.message, "Username is already taken");

    handle.login("bobook", "wrong-password").expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(note.message, "Password is incorrect");

    handle.login("nobody-here", "learnbyheart").expect("engine stopped");
    let note = await_notification(&mut events).await;
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(note.message, "Username does not exist");

    // Failed logins never change the session.
    assert_no_event(&mut events, Duration::from_millis(150)).await;
    let snapshot = handle.snapshot().await.expect("engine stopped");
    assert!(snapshot.session.is_none());
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_session_persists_across_engines() {
    let ctx = TestContext::new().await;
    ctx.store
        .seed_product("p-shoes", "UNIFACTOR Mens Running Shoes", "Fashion", 50, 5);
    ctx.store.seed_user("bobook", "learnbyheart", 5000);
    ctx.store.seed_cart("bobook", &[("p-shoes", 2)]);

    {
        let (handle, mut events) = ctx.spawn_engine();
        login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
        handle.shutdown().expect("engine stopped");
    }

    // A fresh engine restores the persisted session unprompted.
    let (handle, mut events) = ctx.spawn_engine();
    let session = await_session(&mut events)
        .await
        .expect("persisted session was not restored");
    assert_eq!(session.username().as_str(), "bobook");
    assert_eq!(session.balance(), Decimal::from(5000));

    // The restored token still works against the store.
    let products = refresh_and_sync(&handle, &mut events).await;
    assert_eq!(products.len(), 1);
    let snapshot = handle.snapshot().await.expect("engine stopped");
    assert_eq!(
        snapshot.cart_items.first().map(|item| item.quantity),
        Some(2)
    );
}

#[tokio::test]
async fn test_logout_forgets_the_session() {
    let ctx = TestContext::new().await;
    ctx.store.seed_user("bobook", "learnbyheart", 5000);

    let (handle, mut events) = ctx.spawn_engine();
    login_through_engine(&handle, &mut events, "bobook", "learnbyheart").await;
    assert!(ctx.config.session_file.exists());

    handle.logout().expect("engine stopped");
    let session = await_session(&mut events).await;
    assert!(session.is_none());
    let (items, _) = await_cart(&mut events).await;
    assert!(items.is_empty());

    // The file clear runs off the engine task; give it a moment.
    let path = ctx.config.session_file.clone();
    wait_until("the session file is cleared", move || !path.exists()).await;

    let (handle, _events) = ctx.spawn_engine();
    let snapshot = handle.snapshot().await.expect("engine stopped");
    assert!(snapshot.session.is_none());
}
