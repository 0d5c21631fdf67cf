//! The engine mailbox.

use tokio::sync::oneshot;

use tamarind_core::{CartEntry, Product, ProductId};

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::session::Session;

use super::events::EngineSnapshot;

/// Everything the engine loop can be asked to do.
///
/// User intents arrive through the handle; completion variants are posted
/// back by the I/O tasks the engine spawned. Both share one queue so the
/// loop applies them strictly in arrival order.
#[derive(Debug)]
pub(crate) enum Command {
    // =========================================================================
    // User intents
    // =========================================================================
    /// Re-fetch the catalog, and the cart when logged in.
    Refresh,
    /// The search box changed.
    SearchInput { text: String },
    /// Put one unit of a product in the cart.
    AddToCart { product_id: ProductId },
    /// Raise a cart entry's quantity by one.
    IncrementQuantity { product_id: ProductId },
    /// Lower a cart entry's quantity by one; zero removes it.
    DecrementQuantity { product_id: ProductId },
    /// Set a cart entry to an absolute quantity; zero removes it.
    SetQuantity { product_id: ProductId, quantity: u32 },
    /// Log in with the given credentials.
    Login { username: String, password: String },
    /// Register a new account.
    Register {
        username: String,
        password: String,
        confirm_password: String,
    },
    /// Log out and forget the persisted session.
    Logout,
    /// Reply with a copy of the current state.
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
    /// Stop the engine loop.
    Shutdown,

    // =========================================================================
    // Completions posted by spawned I/O tasks
    // =========================================================================
    /// A catalog fetch finished.
    CatalogFetched(Result<Vec<Product>, ApiError>),
    /// A cart fetch finished.
    CartFetched(Result<Vec<CartEntry>, ApiError>),
    /// The debounce timer scheduled under `epoch` elapsed.
    SearchTimerFired { epoch: u64 },
    /// The search request issued as `sequence` finished.
    SearchCompleted {
        sequence: u64,
        result: Result<Vec<Product>, ApiError>,
    },
    /// A cart mutation for `product_id` finished.
    MutationCompleted {
        product_id: ProductId,
        result: Result<Vec<CartEntry>, ApiError>,
    },
    /// A login attempt finished.
    LoginCompleted(Result<Session, AuthError>),
    /// A registration attempt finished.
    RegisterCompleted(Result<(), AuthError>),
}
