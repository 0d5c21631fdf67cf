//! Cart state, reconciliation, and pricing.
//!
//! The cart is kept as bare `(product id, quantity)` entries mirroring what
//! the server stores. Display data comes from joining those entries against
//! the product catalog ([`reconcile`]) and totalling the result
//! ([`pricing::totals`]). Remote mutations are serialized per product by the
//! [`MutationCoordinator`].

pub mod coordinator;
pub mod entries;
pub mod pricing;
pub mod reconcile;

pub use coordinator::{Begin, MutationCoordinator, PendingKind, Rollback, Settled};
pub use entries::EntryStore;
pub use reconcile::reconcile;
