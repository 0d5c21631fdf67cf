//! Cloneable handle to a running engine.

use tokio::sync::{mpsc, oneshot};

use tamarind_core::ProductId;

use crate::error::{Result, StorefrontError};

use super::command::Command;
use super::events::EngineSnapshot;

/// Sends commands to the engine loop.
///
/// Handles are cheap to clone and all clones feed the same mailbox, so the
/// engine applies commands in the order they were sent. Every method fails
/// with [`StorefrontError::EngineStopped`] once the engine has shut down.
#[derive(Debug, Clone)]
pub struct StorefrontHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl StorefrontHandle {
    pub(crate) const fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| StorefrontError::EngineStopped)
    }

    /// Re-fetch the catalog, and the cart when logged in.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn refresh(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    /// Report the current text of the search box.
    ///
    /// Call on every keystroke; the engine debounces internally. Empty text
    /// is a valid query.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn search_input(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SearchInput { text: text.into() })
    }

    /// Put one unit of `product_id` in the cart.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn add_to_cart(&self, product_id: ProductId) -> Result<()> {
        self.send(Command::AddToCart { product_id })
    }

    /// Raise the quantity of `product_id` by one.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn increment_quantity(&self, product_id: ProductId) -> Result<()> {
        self.send(Command::IncrementQuantity { product_id })
    }

    /// Lower the quantity of `product_id` by one; reaching zero removes it.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn decrement_quantity(&self, product_id: ProductId) -> Result<()> {
        self.send(Command::DecrementQuantity { product_id })
    }

    /// Set `product_id` to an absolute quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn set_quantity(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        self.send(Command::SetQuantity {
            product_id,
            quantity,
        })
    }

    /// Log in with the given credentials.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn login(&self, username: impl Into<String>, password: impl Into<String>) -> Result<()> {
        self.send(Command::Login {
            username: username.into(),
            password: password.into(),
        })
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn register(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Result<()> {
        self.send(Command::Register {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        })
    }

    /// Log out and forget the persisted session.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub fn logout(&self) -> Result<()> {
        self.send(Command::Logout)
    }

    /// Stop the engine after it drains the commands already queued.
    ///
    /// # Errors
    ///
    /// Fails if the engine has already stopped.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// A point-in-time copy of the engine state.
    ///
    /// The snapshot reflects every command sent on this handle before the
    /// call, since the mailbox is ordered.
    ///
    /// # Errors
    ///
    /// Fails if the engine has stopped.
    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        response.await.map_err(|_| StorefrontError::EngineStopped)
    }
}
