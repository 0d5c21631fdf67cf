//! Events pushed from the engine to its consumer.

use tamarind_core::{CartItem, OrderSummary, Product};

use crate::session::Session;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something the user asked for worked.
    Success,
    /// The request was refused before any network traffic.
    Warning,
    /// A network operation failed.
    Error,
}

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Presentation level.
    pub severity: Severity,
    /// Ready-to-display text.
    pub message: String,
}

impl Notification {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub(crate) fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// State changes streamed to the consumer.
///
/// Catalog and cart events carry complete snapshots rather than deltas;
/// consumers render what they receive and keep no derivation logic of
/// their own.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The product snapshot was replaced.
    CatalogUpdated {
        /// Products now on display, in server order.
        products: Vec<Product>,
    },
    /// The cart contents or totals changed.
    CartUpdated {
        /// Cart lines joined with their catalog products.
        items: Vec<CartItem>,
        /// Totals for those lines.
        summary: OrderSummary,
    },
    /// A login, logout, or session restore happened.
    SessionChanged {
        /// The now-active session, if anyone is logged in.
        session: Option<Session>,
    },
    /// A message for the user.
    Notification(Notification),
}

/// Point-in-time copy of everything the engine knows.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    /// Current product snapshot.
    pub products: Vec<Product>,
    /// Reconciled cart lines.
    pub cart_items: Vec<CartItem>,
    /// Totals for the cart lines.
    pub summary: OrderSummary,
    /// Active session, if any.
    pub session: Option<Session>,
}
