//! Command implementations for the Tamarind CLI.
//!
//! Account commands (`register`, `login`, `logout`) call the auth service
//! directly: they are one-shot operations whose outcome is fully described
//! by their return value. Catalog and cart commands drive a
//! [`StorefrontEngine`] instead, because their semantics (search debounce,
//! the optimistic cart protocol, session restore) live in the engine, and
//! the commands wait on its event stream like any other display layer.

use std::time::Duration;

use tamarind_core::Product;
use tamarind_storefront::{
    ApiError, AuthError, EngineEvent, SessionStore, Severity, StoreClient, StorefrontConfig,
    StorefrontEngine, StorefrontError, StorefrontHandle,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

pub mod auth;
pub mod cart;
mod output;
pub mod products;

/// Hard ceiling on waiting for any single engine event.
const EVENT_DEADLINE: Duration = Duration::from_secs(30);

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Engine(#[from] StorefrontError),
    /// The engine reported a failure through an error notification.
    #[error("{0}")]
    Failed(String),
    #[error("timed out waiting for the store")]
    Timeout,
}

/// How a cart mutation ended.
pub enum MutationOutcome {
    /// The server accepted the mutation.
    Applied {
        /// Success messages the engine raised along the way.
        messages: Vec<String>,
    },
    /// The engine refused the mutation before any network traffic.
    Rejected {
        /// The warning explaining the refusal.
        message: String,
    },
}

/// A spawned engine plus the event stream it feeds.
pub struct EngineDriver {
    handle: StorefrontHandle,
    events: UnboundedReceiver<EngineEvent>,
}

impl EngineDriver {
    /// Spawn an engine wired to the configured store API.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn start(config: &StorefrontConfig) -> Result<Self, CliError> {
        let api = StoreClient::new(config)?;
        let sessions = SessionStore::new(config.session_file.clone());
        let (handle, events) = StorefrontEngine::spawn(config, api, sessions);
        Ok(Self { handle, events })
    }

    #[must_use]
    pub const fn handle(&self) -> &StorefrontHandle {
        &self.handle
    }

    async fn next_event(&mut self) -> Result<EngineEvent, CliError> {
        match tokio::time::timeout(EVENT_DEADLINE, self.events.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(StorefrontError::EngineStopped.into()),
            Err(_) => Err(CliError::Timeout),
        }
    }

    /// Wait for the next catalog snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the engine reports the fetch failed, stops, or stays silent
    /// past the deadline.
    pub async fn await_catalog(&mut self) -> Result<Vec<Product>, CliError> {
        loop {
            match self.next_event().await? {
                EngineEvent::CatalogUpdated { products } => return Ok(products),
                EngineEvent::Notification(notification)
                    if notification.severity == Severity::Error =>
                {
                    return Err(CliError::Failed(notification.message));
                }
                _ => {}
            }
        }
    }

    /// Wait until a full refresh of a logged-in engine has settled.
    ///
    /// A refresh fans out into a catalog fetch and a cart fetch. The catalog
    /// landing re-emits the cart view, so a successful refresh produces one
    /// catalog event and two cart events; the second cart event means both
    /// fetches are in.
    ///
    /// # Errors
    ///
    /// Fails if either fetch fails, the engine stops, or the deadline passes.
    pub async fn await_refresh(&mut self) -> Result<(), CliError> {
        let mut catalog_updates = 0_u32;
        let mut cart_updates = 0_u32;
        while catalog_updates < 1 || cart_updates < 2 {
            match self.next_event().await? {
                EngineEvent::CatalogUpdated { .. } => catalog_updates += 1,
                EngineEvent::CartUpdated { .. } => cart_updates += 1,
                EngineEvent::Notification(notification)
                    if notification.severity == Severity::Error =>
                {
                    return Err(CliError::Failed(notification.message));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Wait for an already-sent cart mutation to settle.
    ///
    /// The optimistic cart update comes first and the settled server state
    /// second, with any outcome notification in between. Mutations the engine
    /// refuses outright never reach the network and arrive as a lone warning.
    ///
    /// # Errors
    ///
    /// Fails if the server rejected the mutation, the engine stops, or the
    /// deadline passes.
    pub async fn await_mutation(&mut self) -> Result<MutationOutcome, CliError> {
        let mut cart_updates = 0_u32;
        let mut messages = Vec::new();
        loop {
            match self.next_event().await? {
                EngineEvent::CartUpdated { .. } => {
                    cart_updates += 1;
                    if cart_updates >= 2 {
                        return Ok(MutationOutcome::Applied { messages });
                    }
                }
                EngineEvent::Notification(notification) => match notification.severity {
                    Severity::Error => return Err(CliError::Failed(notification.message)),
                    Severity::Warning => {
                        return Ok(MutationOutcome::Rejected {
                            message: notification.message,
                        });
                    }
                    Severity::Success => messages.push(notification.message),
                },
                EngineEvent::CatalogUpdated { .. } | EngineEvent::SessionChanged { .. } => {}
            }
        }
    }
}
