//! Integration tests for Tamarind.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tamarind-integration-tests
//! ```
//!
//! Tests are hermetic: each one starts an in-process [`MockStore`] speaking
//! the store's wire dialect on a random loopback port, then drives a real
//! engine against it. No external services, no state shared between tests.
//!
//! # Test Categories
//!
//! - `engine_catalog` - Catalog refresh, caching, and fetch failures
//! - `engine_search` - Debounce and stale-response handling
//! - `engine_cart` - The optimistic cart mutation protocol
//! - `auth_session` - Registration, login, and session persistence

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test helpers panic when an expectation breaks; that is their contract.
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;
use uuid::Uuid;

use tamarind_core::{CartItem, OrderSummary, Product};
use tamarind_storefront::{
    EngineEvent, Notification, Session, SessionStore, StoreClient, StorefrontConfig,
    StorefrontEngine, StorefrontHandle,
};

/// Ceiling on waiting for any single expected event or condition.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Wire types
// =============================================================================

/// A product as the store serves it, using the server-side field names.
#[derive(Debug, Clone, Serialize)]
pub struct WireProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub cost: i64,
    pub rating: i64,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
struct WireCartLine {
    #[serde(rename = "productId")]
    product_id: String,
    qty: i64,
}

#[derive(Debug, Deserialize)]
struct CartPost {
    #[serde(rename = "productId")]
    product_id: String,
    qty: u32,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    value: String,
}

#[derive(Debug, Clone)]
struct MockUser {
    password: String,
    balance: i64,
}

// =============================================================================
// Mock store
// =============================================================================

#[derive(Default)]
struct MockState {
    products: Vec<WireProduct>,
    users: HashMap<String, MockUser>,
    /// Issued tokens, keyed by token value.
    tokens: HashMap<String, String>,
    /// Server-side carts, keyed by username.
    carts: HashMap<String, Vec<WireCartLine>>,

    // Failure and latency injection.
    fail_products: bool,
    fail_search: bool,
    fail_cart_reads: bool,
    fail_cart_writes: bool,
    cart_write_delay: Option<Duration>,
    search_delays: HashMap<String, Duration>,

    // Request bookkeeping, recorded at arrival.
    product_fetches: u32,
    search_requests: Vec<String>,
    cart_posts: Vec<(String, u32)>,
    auth_requests: u32,
}

type SharedState = Arc<Mutex<MockState>>;

/// An in-process double of the remote store service.
///
/// Serves the same endpoints and JSON shapes as the real store and keeps its
/// state behind a mutex so tests can seed, reshape, and inspect it at any
/// point. Injected failures answer `500` with a plain-text body, which is how
/// an ungraceful outage looks from the client side.
pub struct MockStore {
    state: SharedState,
    addr: SocketAddr,
}

impl MockStore {
    /// Bind a random loopback port and start serving.
    pub async fn start() -> Self {
        let state: SharedState = Arc::default();
        let app = Router::new()
            .route("/api/v1/products", get(list_products))
            .route("/api/v1/products/search", get(search_products))
            .route("/api/v1/cart", get(fetch_cart).post(post_cart))
            .route("/api/v1/auth/register", post(register))
            .route("/api/v1/auth/login", post(login))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock store");
        let addr = listener.local_addr().expect("mock store has no address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock store stopped serving");
        });

        Self { state, addr }
    }

    /// Base URL for [`StorefrontConfig::api_base_url`].
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/v1", self.addr)).expect("mock base url is valid")
    }

    // Seeding ----------------------------------------------------------------

    pub fn seed_product(&self, id: &str, name: &str, category: &str, cost: i64, rating: i64) {
        self.lock().products.push(WireProduct {
            id: id.to_owned(),
            name: name.to_owned(),
            category: category.to_owned(),
            cost,
            rating,
            image: format!("https://images.test/{id}.png"),
        });
    }

    pub fn seed_user(&self, username: &str, password: &str, balance: i64) {
        self.lock().users.insert(
            username.to_owned(),
            MockUser {
                password: password.to_owned(),
                balance,
            },
        );
    }

    pub fn seed_cart(&self, username: &str, lines: &[(&str, u32)]) {
        let lines = lines
            .iter()
            .map(|(id, qty)| WireCartLine {
                product_id: (*id).to_owned(),
                qty: i64::from(*qty),
            })
            .collect();
        self.lock().carts.insert(username.to_owned(), lines);
    }

    // Failure and latency injection ------------------------------------------

    pub fn set_fail_products(&self, fail: bool) {
        self.lock().fail_products = fail;
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.lock().fail_search = fail;
    }

    pub fn set_fail_cart_reads(&self, fail: bool) {
        self.lock().fail_cart_reads = fail;
    }

    pub fn set_fail_cart_writes(&self, fail: bool) {
        self.lock().fail_cart_writes = fail;
    }

    /// Delay every cart write response by `delay`. State still changes at
    /// arrival; only the response is held back.
    pub fn set_cart_write_delay(&self, delay: Duration) {
        self.lock().cart_write_delay = Some(delay);
    }

    /// Delay the response to searches for exactly `query`.
    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.lock().search_delays.insert(query.to_owned(), delay);
    }

    // Inspection -------------------------------------------------------------

    #[must_use]
    pub fn product_fetches(&self) -> u32 {
        self.lock().product_fetches
    }

    /// Search queries in arrival order.
    #[must_use]
    pub fn search_requests(&self) -> Vec<String> {
        self.lock().search_requests.clone()
    }

    /// Cart writes in arrival order, as `(product id, quantity)` pairs.
    #[must_use]
    pub fn cart_posts(&self) -> Vec<(String, u32)> {
        self.lock().cart_posts.clone()
    }

    #[must_use]
    pub fn auth_requests(&self) -> u32 {
        self.lock().auth_requests
    }

    #[must_use]
    pub fn has_user(&self, username: &str) -> bool {
        self.lock().users.contains_key(username)
    }

    /// Server-side cart contents, as `(product id, quantity)` pairs.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(String, u32)> {
        self.lock()
            .carts
            .get(username)
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| (line.product_id.clone(), u32::try_from(line.qty).unwrap_or(0)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn error_body(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "success": false, "message": message }))
}

fn bearer_username(state: &MockState, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state.tokens.get(token).cloned()
}

async fn list_products(State(state): State<SharedState>) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    state.product_fetches += 1;
    if state.fail_products {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mock outage").into_response();
    }
    Json(state.products.clone()).into_response()
}

async fn search_products(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Response {
    // Record and resolve under the lock, then release it before sleeping.
    let (delay, response) = {
        let mut state = state.lock().expect("mock state poisoned");
        state.search_requests.push(params.value.clone());
        let delay = state.search_delays.get(&params.value).copied();

        let response = if state.fail_search {
            (StatusCode::INTERNAL_SERVER_ERROR, "mock outage").into_response()
        } else {
            let needle = params.value.to_lowercase();
            let matches: Vec<WireProduct> = state
                .products
                .iter()
                .filter(|product| {
                    product.name.to_lowercase().contains(&needle)
                        || product.category.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect();
            if matches.is_empty() {
                (StatusCode::NOT_FOUND, error_body("No products found")).into_response()
            } else {
                Json(matches).into_response()
            }
        };
        (delay, response)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response
}

async fn fetch_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.lock().expect("mock state poisoned");
    let Some(username) = bearer_username(&state, &headers) else {
        return (StatusCode::UNAUTHORIZED, error_body("Please authenticate")).into_response();
    };
    if state.fail_cart_reads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mock outage").into_response();
    }
    let lines = state.carts.get(&username).cloned().unwrap_or_default();
    Json(lines).into_response()
}

async fn post_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CartPost>,
) -> Response {
    // The cart changes at arrival; an injected delay only holds the response.
    let (delay, response) = {
        let mut state = state.lock().expect("mock state poisoned");
        let delay = state.cart_write_delay;

        let Some(username) = bearer_username(&state, &headers) else {
            return (StatusCode::UNAUTHORIZED, error_body("Please authenticate")).into_response();
        };
        state.cart_posts.push((body.product_id.clone(), body.qty));

        let response = if state.fail_cart_writes {
            (StatusCode::INTERNAL_SERVER_ERROR, "mock outage").into_response()
        } else if !state.products.iter().any(|p| p.id == body.product_id) {
            (
                StatusCode::BAD_REQUEST,
                error_body("Product doesn't exist in database"),
            )
                .into_response()
        } else {
            let cart = state.carts.entry(username).or_default();
            if body.qty == 0 {
                cart.retain(|line| line.product_id != body.product_id);
            } else if let Some(line) = cart.iter_mut().find(|l| l.product_id == body.product_id) {
                line.qty = i64::from(body.qty);
            } else {
                cart.push(WireCartLine {
                    product_id: body.product_id.clone(),
                    qty: i64::from(body.qty),
                });
            }
            Json(cart.clone()).into_response()
        };
        (delay, response)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response
}

async fn register(State(state): State<SharedState>, Json(body): Json<Credentials>) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    state.auth_requests += 1;
    if state.users.contains_key(&body.username) {
        return (
            StatusCode::BAD_REQUEST,
            error_body("Username is already taken"),
        )
            .into_response();
    }
    state.users.insert(
        body.username,
        MockUser {
            password: body.password,
            balance: 5000,
        },
    );
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn login(State(state): State<SharedState>, Json(body): Json<Credentials>) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    state.auth_requests += 1;
    let Some(user) = state.users.get(&body.username) else {
        return (
            StatusCode::BAD_REQUEST,
            error_body("Username does not exist"),
        )
            .into_response();
    };
    if user.password != body.password {
        return (StatusCode::BAD_REQUEST, error_body("Password is incorrect")).into_response();
    }
    let balance = user.balance;

    let token = Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), body.username.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": token,
            "username": body.username,
            "balance": balance,
        })),
    )
        .into_response()
}

// =============================================================================
// Test context
// =============================================================================

/// A mock store plus a config pointed at it.
///
/// The config starts with a short debounce, no catalog caching, no shipping
/// fee, and a unique session file under the system temp directory. Tests
/// adjust fields before spawning engines.
pub struct TestContext {
    pub store: MockStore,
    pub config: StorefrontConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = MockStore::start().await;
        let config = StorefrontConfig {
            api_base_url: store.base_url(),
            search_debounce: Duration::from_millis(80),
            shipping_fee: Decimal::ZERO,
            catalog_cache_ttl: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
            session_file: std::env::temp_dir().join(format!("tamarind-it-{}.json", Uuid::new_v4())),
            sentry_dsn: None,
            sentry_environment: None,
        };
        Self { store, config }
    }

    /// Spawn a fresh engine against the mock store.
    #[must_use]
    pub fn spawn_engine(&self) -> (StorefrontHandle, UnboundedReceiver<EngineEvent>) {
        let api = StoreClient::new(&self.config).expect("failed to build store client");
        let sessions = SessionStore::new(self.config.session_file.clone());
        StorefrontEngine::spawn(&self.config, api, sessions)
    }
}

// =============================================================================
// Event helpers
// =============================================================================

/// Receive the next event, panicking if the engine stays silent.
pub async fn next_event(events: &mut UnboundedReceiver<EngineEvent>) -> EngineEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for an engine event")
        .expect("engine stopped")
}

/// Wait for the next catalog event, skipping everything else.
pub async fn await_catalog(events: &mut UnboundedReceiver<EngineEvent>) -> Vec<Product> {
    loop {
        if let EngineEvent::CatalogUpdated { products } = next_event(events).await {
            return products;
        }
    }
}

/// Wait for the next cart event, skipping everything else.
pub async fn await_cart(events: &mut UnboundedReceiver<EngineEvent>) -> (Vec<CartItem>, OrderSummary) {
    loop {
        if let EngineEvent::CartUpdated { items, summary } = next_event(events).await {
            return (items, summary);
        }
    }
}

/// Wait for the next notification, skipping everything else.
pub async fn await_notification(events: &mut UnboundedReceiver<EngineEvent>) -> Notification {
    loop {
        if let EngineEvent::Notification(notification) = next_event(events).await {
            return notification;
        }
    }
}

/// Wait for the next session event, skipping everything else.
pub async fn await_session(events: &mut UnboundedReceiver<EngineEvent>) -> Option<Session> {
    loop {
        if let EngineEvent::SessionChanged { session } = next_event(events).await {
            return session;
        }
    }
}

/// Assert the engine emits nothing for `window`.
pub async fn assert_no_event(events: &mut UnboundedReceiver<EngineEvent>, window: Duration) {
    match tokio::time::timeout(window, events.recv()).await {
        Ok(Some(event)) => panic!("expected silence, got {event:?}"),
        Ok(None) => panic!("engine stopped"),
        Err(_) => {}
    }
}

/// Poll `condition` until it holds or [`EVENT_TIMEOUT`] passes.
pub async fn wait_until(description: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting until {description}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// =============================================================================
// Engine flows
// =============================================================================

/// Log in through the engine and wait for the follow-up cart fetch to land.
///
/// Consumes the session event, the success notification, and the cart event,
/// leaving the stream clean for the test body.
pub async fn login_through_engine(
    handle: &StorefrontHandle,
    events: &mut UnboundedReceiver<EngineEvent>,
    username: &str,
    password: &str,
) -> Session {
    handle.login(username, password).expect("engine stopped");
    let session = await_session(events)
        .await
        .expect("login did not produce a session");
    let _ = await_cart(events).await;
    session
}

/// Refresh and wait until both fetches settle, returning the catalog.
///
/// A logged-in refresh fans out into a catalog fetch and a cart fetch, and
/// the catalog landing re-emits the cart; it settles after exactly one
/// catalog event and two cart events, in whichever interleaving the
/// responses arrive.
pub async fn refresh_and_sync(
    handle: &StorefrontHandle,
    events: &mut UnboundedReceiver<EngineEvent>,
) -> Vec<Product> {
    handle.refresh().expect("engine stopped");
    let mut products = None;
    let mut cart_updates = 0;
    while products.is_none() || cart_updates < 2 {
        match next_event(events).await {
            EngineEvent::CatalogUpdated { products: fetched } => products = Some(fetched),
            EngineEvent::CartUpdated { .. } => cart_updates += 1,
            EngineEvent::Notification(notification) => panic!("refresh raised {notification:?}"),
            EngineEvent::SessionChanged { .. } => {}
        }
    }
    products.expect("refresh settled without a catalog")
}
