//! The storefront engine.
//!
//! One task owns every piece of client state: the catalog snapshot, the
//! cart entries, the session, the search debouncer, and the mutation
//! coordinator. State is only ever touched from inside that task, so there
//! are no locks and no partially-applied updates. Everyone else talks to it
//! through a [`StorefrontHandle`] and listens on the event stream.
//!
//! Network I/O never happens inline. The loop spawns a task per request and
//! the task posts its outcome back into the same mailbox the user commands
//! arrive through; between messages the loop holds no futures and awaits
//! nothing but the next message. Ordering therefore comes for free: however
//! requests interleave on the wire, their effects apply in mailbox order.

mod command;
mod events;
mod handle;

pub use events::{EngineEvent, EngineSnapshot, Notification, Severity};
pub use handle::StorefrontHandle;

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tamarind_core::{CartEntry, Product, ProductId};

use crate::api::{ApiError, StoreClient};
use crate::auth::{AuthError, AuthService};
use crate::cart::{
    Begin, EntryStore, MutationCoordinator, PendingKind, Rollback, pricing, reconcile,
};
use crate::catalog::CatalogStore;
use crate::config::StorefrontConfig;
use crate::search::SearchDebouncer;
use crate::session::{Session, SessionStore};

use command::Command;

// =============================================================================
// Notification copy
// =============================================================================

const FETCH_PRODUCTS_FAILED: &str = "Something went wrong. Failed to fetch products.";
const FETCH_CART_FAILED: &str = "Something went wrong. Failed to fetch cart items.";
const UPDATE_CART_FAILED: &str = "Something went wrong. Failed to update cart.";
const ITEM_ADDED: &str = "product added to cart.";
const DUPLICATE_ADD: &str =
    "Item already in cart. Use the cart sidebar to update quantity or remove item.";
const NOT_IN_CART: &str = "Item not in cart.";
const LOGIN_REQUIRED: &str = "Login to add an item to the Cart";
const LOGGED_IN: &str = "Logged in successfully";
const REGISTERED: &str = "Registered Successfully";
const REGISTER_FAILED: &str = "Something went wrong.";
const LOGIN_FAILED: &str =
    "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";

// =============================================================================
// Engine
// =============================================================================

/// The single owner of all client state.
///
/// Constructed and started through [`StorefrontEngine::spawn`]; the value
/// itself never leaves the spawned task.
pub struct StorefrontEngine {
    search_debounce: Duration,
    shipping_fee: Decimal,
    api: StoreClient,
    auth: AuthService,
    sessions: SessionStore,
    session: Option<Session>,
    catalog: CatalogStore,
    entries: EntryStore,
    mutations: MutationCoordinator,
    debouncer: SearchDebouncer,
    search_timer: Option<JoinHandle<()>>,
    commands: UnboundedSender<Command>,
    events: UnboundedSender<EngineEvent>,
}

impl StorefrontEngine {
    /// Start an engine task.
    ///
    /// Returns the command handle and the event stream. The engine runs
    /// until [`StorefrontHandle::shutdown`] is called; it keeps a sender
    /// of its own for completion messages, so dropping the handles alone
    /// does not stop it.
    #[must_use]
    pub fn spawn(
        config: &StorefrontConfig,
        api: StoreClient,
        sessions: SessionStore,
    ) -> (StorefrontHandle, UnboundedReceiver<EngineEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let engine = Self {
            search_debounce: config.search_debounce,
            shipping_fee: config.shipping_fee,
            auth: AuthService::new(api.clone(), sessions.clone()),
            api,
            sessions,
            session: None,
            catalog: CatalogStore::new(),
            entries: EntryStore::new(),
            mutations: MutationCoordinator::new(),
            debouncer: SearchDebouncer::new(),
            search_timer: None,
            commands: command_tx.clone(),
            events: event_tx,
        };
        tokio::spawn(engine.run(command_rx));

        (StorefrontHandle::new(command_tx), event_rx)
    }

    async fn run(mut self, mut commands: UnboundedReceiver<Command>) {
        self.restore_session().await;

        while let Some(command) = commands.recv().await {
            if matches!(command, Command::Shutdown) {
                break;
            }
            self.handle(command);
        }

        if let Some(timer) = self.search_timer.take() {
            timer.abort();
        }
        debug!("engine stopped");
    }

    /// Pick up the session persisted by a previous run, if any.
    async fn restore_session(&mut self) {
        match self.sessions.load().await {
            Ok(Some(session)) => {
                info!(username = %session.username(), "restored persisted session");
                self.session = Some(session);
                self.emit(EngineEvent::SessionChanged {
                    session: self.session.clone(),
                });
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "could not restore persisted session");
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Refresh => self.refresh(),
            Command::SearchInput { text } => self.search_input(text),
            Command::AddToCart { product_id } => self.add_to_cart(&product_id),
            Command::IncrementQuantity { product_id } => self.increment_quantity(&product_id),
            Command::DecrementQuantity { product_id } => self.decrement_quantity(&product_id),
            Command::SetQuantity {
                product_id,
                quantity,
            } => self.request_quantity(&product_id, quantity),
            Command::Login { username, password } => self.login(username, password),
            Command::Register {
                username,
                password,
                confirm_password,
            } => self.register(username, password, confirm_password),
            Command::Logout => self.logout(),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            // Intercepted in `run`.
            Command::Shutdown => {}

            Command::CatalogFetched(result) => self.catalog_fetched(result),
            Command::CartFetched(result) => self.cart_fetched(result),
            Command::SearchTimerFired { epoch } => self.search_timer_fired(epoch),
            Command::SearchCompleted { sequence, result } => {
                self.search_completed(sequence, result);
            }
            Command::MutationCompleted { product_id, result } => {
                self.mutation_completed(&product_id, result);
            }
            Command::LoginCompleted(result) => self.login_completed(result),
            Command::RegisterCompleted(result) => self.register_completed(result),
        }
    }

    // =========================================================================
    // Catalog and cart refresh
    // =========================================================================

    fn refresh(&self) {
        debug!("refreshing catalog");
        let api = self.api.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = api.fetch_products().await;
            let _ = commands.send(Command::CatalogFetched(result));
        });

        if let Some(session) = &self.session {
            self.spawn_cart_fetch(session.token().clone());
        }
    }

    fn spawn_cart_fetch(&self, token: SecretString) {
        let api = self.api.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = api.fetch_cart(&token).await;
            let _ = commands.send(Command::CartFetched(result));
        });
    }

    fn catalog_fetched(&mut self, result: Result<Vec<Product>, ApiError>) {
        match result {
            Ok(products) => {
                info!(count = products.len(), "catalog updated");
                self.catalog.replace(products);
                self.emit_catalog();
                self.emit_cart();
            }
            Err(err) => {
                // The previous snapshot stays on display.
                error!(error = %err, "catalog fetch failed");
                self.notify(network_failure(&err, FETCH_PRODUCTS_FAILED));
            }
        }
    }

    fn cart_fetched(&mut self, result: Result<Vec<CartEntry>, ApiError>) {
        if self.session.is_none() {
            debug!("dropping cart fetch result, logged out meanwhile");
            return;
        }
        match result {
            Ok(entries) => {
                debug!(count = entries.len(), "cart fetched");
                self.entries.replace(entries);
                self.emit_cart();
            }
            Err(err) => {
                error!(error = %err, "cart fetch failed");
                self.notify(network_failure(&err, FETCH_CART_FAILED));
            }
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    fn search_input(&mut self, text: String) {
        let epoch = self.debouncer.note_input(text);

        // Replaces the previous timer; at most one is ever live. Epoch
        // checking still guards the window where an aborted timer already
        // posted its message.
        if let Some(timer) = self.search_timer.take() {
            timer.abort();
        }
        let window = self.search_debounce;
        let commands = self.commands.clone();
        self.search_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = commands.send(Command::SearchTimerFired { epoch });
        }));
    }

    fn search_timer_fired(&mut self, epoch: u64) {
        let Some((sequence, query)) = self.debouncer.timer_fired(epoch) else {
            return;
        };
        debug!(sequence, query = %query, "dispatching search");
        let api = self.api.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = api.search_products(&query).await;
            let _ = commands.send(Command::SearchCompleted { sequence, result });
        });
    }

    fn search_completed(&mut self, sequence: u64, result: Result<Vec<Product>, ApiError>) {
        if !self.debouncer.is_latest(sequence) {
            warn!(sequence, "discarding stale search response");
            return;
        }
        match result {
            Ok(products) => {
                debug!(count = products.len(), "search results in");
                self.catalog.replace(products);
                self.emit_catalog();
                self.emit_cart();
            }
            Err(err) => {
                error!(error = %err, "search failed");
                self.notify(network_failure(&err, FETCH_PRODUCTS_FAILED));
            }
        }
    }

    // =========================================================================
    // Cart mutations
    // =========================================================================

    fn add_to_cart(&mut self, product_id: &ProductId) {
        if self.session.is_none() {
            self.notify(Notification::warning(LOGIN_REQUIRED));
            return;
        }
        // A pending mutation counts as presence: an add racing a removal is
        // still a duplicate from the user's point of view.
        if self.entries.contains(product_id) || self.mutations.is_pending(product_id) {
            debug!(product_id = %product_id, "duplicate add rejected");
            self.notify(Notification::warning(DUPLICATE_ADD));
            return;
        }
        self.request_quantity(product_id, 1);
    }

    fn increment_quantity(&mut self, product_id: &ProductId) {
        if self.session.is_none() {
            self.notify(Notification::warning(LOGIN_REQUIRED));
            return;
        }
        match self.entries.quantity(product_id) {
            Some(current) => self.request_quantity(product_id, current.saturating_add(1)),
            None => self.notify(Notification::warning(NOT_IN_CART)),
        }
    }

    fn decrement_quantity(&mut self, product_id: &ProductId) {
        if self.session.is_none() {
            self.notify(Notification::warning(LOGIN_REQUIRED));
            return;
        }
        match self.entries.quantity(product_id) {
            Some(current) => self.request_quantity(product_id, current.saturating_sub(1)),
            None => self.notify(Notification::warning(NOT_IN_CART)),
        }
    }

    /// Drive `product_id` toward `target` units, zero meaning removal.
    ///
    /// The local entry is updated immediately; the wire carries the absolute
    /// target. With a mutation already in flight for this product the target
    /// is queued instead, and the newest queued value wins.
    fn request_quantity(&mut self, product_id: &ProductId, target: u32) {
        let Some(token) = self.session_token() else {
            self.notify(Notification::warning(LOGIN_REQUIRED));
            return;
        };

        let current = self.entries.quantity(product_id);
        match self.mutations.begin(product_id, current, target) {
            Begin::Dispatch { quantity } => {
                debug!(product_id = %product_id, quantity, "dispatching cart mutation");
                self.apply_optimistic(product_id, quantity);
                self.dispatch_mutation(token, product_id.clone(), quantity);
                self.emit_cart();
            }
            Begin::Queued => {
                debug!(product_id = %product_id, target, "queued behind in-flight mutation");
                self.apply_optimistic(product_id, target);
                self.emit_cart();
            }
            Begin::NoOp => {}
        }
    }

    fn apply_optimistic(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.entries.remove(product_id);
        } else {
            self.entries.upsert(product_id.clone(), quantity);
        }
    }

    fn dispatch_mutation(&self, token: SecretString, product_id: ProductId, quantity: u32) {
        let api = self.api.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = api.post_cart(&token, &product_id, quantity).await;
            let _ = commands.send(Command::MutationCompleted { product_id, result });
        });
    }

    fn mutation_completed(
        &mut self,
        product_id: &ProductId,
        result: Result<Vec<CartEntry>, ApiError>,
    ) {
        match result {
            Ok(snapshot) => {
                let Some(settled) = self.mutations.complete_success(product_id) else {
                    debug!(product_id = %product_id, "dropping mutation result, no longer tracked");
                    return;
                };
                // The server snapshot is authoritative, including for
                // entries this client never touched.
                self.entries.replace(snapshot);
                if matches!(settled.kind, PendingKind::Add) {
                    self.notify(Notification::success(ITEM_ADDED));
                }
                if let Some(target) = settled.queued {
                    self.dispatch_queued(product_id, target);
                }
                self.emit_cart();
            }
            Err(err) => {
                error!(error = %err, product_id = %product_id, "cart mutation failed");
                let Some(rollback) = self.mutations.complete_failure(product_id) else {
                    debug!(product_id = %product_id, "dropping mutation failure, no longer tracked");
                    return;
                };
                match rollback {
                    Rollback::Remove => {
                        self.entries.remove(product_id);
                    }
                    Rollback::Restore { quantity } => {
                        self.entries.upsert(product_id.clone(), quantity);
                    }
                }
                // Outcome notifications precede the cart update that settles
                // a mutation, so a consumer that stops at the cart update has
                // already seen how the mutation ended.
                self.notify(network_failure(&err, UPDATE_CART_FAILED));
                self.emit_cart();
            }
        }
    }

    /// Dispatch the target that queued up behind a settled mutation.
    fn dispatch_queued(&mut self, product_id: &ProductId, target: u32) {
        let Some(token) = self.session_token() else {
            debug!(product_id = %product_id, "dropping queued mutation, logged out meanwhile");
            return;
        };
        let current = self.entries.quantity(product_id);
        match self.mutations.begin(product_id, current, target) {
            Begin::Dispatch { quantity } => {
                self.apply_optimistic(product_id, quantity);
                self.dispatch_mutation(token, product_id.clone(), quantity);
            }
            // `begin` on a just-freed slot cannot queue; NoOp means the
            // queued value asked to remove an entry that is already gone.
            Begin::Queued | Begin::NoOp => {}
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    fn login(&self, username: String, password: String) {
        let auth = self.auth.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = auth.login(&username, &password).await;
            let _ = commands.send(Command::LoginCompleted(result));
        });
    }

    fn register(&self, username: String, password: String, confirm_password: String) {
        let auth = self.auth.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = auth.register(&username, &password, &confirm_password).await;
            let _ = commands.send(Command::RegisterCompleted(result));
        });
    }

    fn login_completed(&mut self, result: Result<Session, AuthError>) {
        match result {
            Ok(session) => {
                let token = session.token().clone();
                self.session = Some(session);
                self.emit(EngineEvent::SessionChanged {
                    session: self.session.clone(),
                });
                self.notify(Notification::success(LOGGED_IN));
                self.spawn_cart_fetch(token);
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.notify(auth_failure(&err, LOGIN_FAILED));
            }
        }
    }

    fn register_completed(&mut self, result: Result<(), AuthError>) {
        match result {
            Ok(()) => self.notify(Notification::success(REGISTERED)),
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.notify(auth_failure(&err, REGISTER_FAILED));
            }
        }
    }

    fn logout(&mut self) {
        info!("logging out");
        self.session = None;
        self.entries.clear();
        self.mutations = MutationCoordinator::new();
        self.emit(EngineEvent::SessionChanged { session: None });
        self.emit_cart();

        // Clear the file even if no session was loaded; a malformed session
        // file should not survive a logout.
        let auth = self.auth.clone();
        tokio::spawn(async move {
            if let Err(err) = auth.logout().await {
                error!(error = %err, "failed to clear persisted session");
            }
        });
    }

    // =========================================================================
    // State access
    // =========================================================================

    fn snapshot(&self) -> EngineSnapshot {
        let cart_items = reconcile(self.entries.entries(), self.catalog.products());
        let summary = pricing::totals(&cart_items, self.shipping_fee);
        EngineSnapshot {
            products: self.catalog.products().to_vec(),
            cart_items,
            summary,
            session: self.session.clone(),
        }
    }

    fn session_token(&self) -> Option<SecretString> {
        self.session.as_ref().map(|session| session.token().clone())
    }

    fn emit(&self, event: EngineEvent) {
        // A consumer that dropped the receiver just stops hearing updates.
        let _ = self.events.send(event);
    }

    fn emit_catalog(&self) {
        self.emit(EngineEvent::CatalogUpdated {
            products: self.catalog.products().to_vec(),
        });
    }

    fn emit_cart(&self) {
        let items = reconcile(self.entries.entries(), self.catalog.products());
        if items.len() < self.entries.len() {
            debug!(
                entries = self.entries.len(),
                displayed = items.len(),
                "cart entries without catalog products are hidden"
            );
        }
        let summary = pricing::totals(&items, self.shipping_fee);
        self.emit(EngineEvent::CartUpdated { items, summary });
    }

    fn notify(&self, notification: Notification) {
        self.emit(EngineEvent::Notification(notification));
    }
}

/// Error notification preferring the server's own message.
fn network_failure(err: &ApiError, fallback: &str) -> Notification {
    Notification::error(
        err.server_message()
            .map_or_else(|| fallback.to_owned(), str::to_owned),
    )
}

/// Map an authentication failure to its notification.
///
/// Local validation failures are warnings carrying their own copy; server
/// rejections surface the server's message; anything else falls back to the
/// per-operation text.
fn auth_failure(err: &AuthError, fallback: &str) -> Notification {
    if err.is_validation() {
        return Notification::warning(err.to_string());
    }
    if let AuthError::Rejected(message) = err {
        return Notification::error(message.clone());
    }
    Notification::error(fallback)
}

// =============================================================================
// Tests
// =============================================================================
