//! Per-product serialization of remote cart mutations.
//!
//! Every cart mutation posts an absolute target quantity and the server
//! replies with a full cart snapshot. Letting two requests for the same
//! product race would make the arrival order pick the final quantity, so the
//! coordinator allows at most one in-flight request per product. While one
//! is outstanding, newer targets for that product collapse into a single
//! queued value holding only the latest request; when the in-flight request
//! settles successfully the queued value is dispatched next. The optimistic
//! local edit still happens immediately for every request, so the visible
//! cart always tracks the newest user intent.
//!
//! The coordinator is pure bookkeeping. Callers apply the optimistic edits,
//! send the requests, and feed completions back in.

use std::collections::HashMap;

use tamarind_core::ProductId;

/// What an in-flight mutation is doing, with enough context to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Adding a product that had no entry.
    Add,
    /// Changing an existing entry away from `previous` units.
    Update {
        /// Quantity before the optimistic edit.
        previous: u32,
    },
    /// Removing an entry that held `previous` units.
    Remove {
        /// Quantity before the optimistic edit.
        previous: u32,
    },
}

/// What the caller should do after announcing a new target quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// Nothing is in flight for the product: apply the optimistic edit and
    /// send a request for `quantity`.
    Dispatch {
        /// Absolute quantity to transmit.
        quantity: u32,
    },
    /// A request is already in flight: the target replaced any previously
    /// queued value. Apply the optimistic edit but send nothing.
    Queued,
    /// The request needs no work (removing a product with no entry).
    NoOp,
}

/// How to restore the local entry after a failed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// The failed mutation added the entry; drop it.
    Remove,
    /// Restore the entry to its pre-mutation quantity.
    Restore {
        /// Quantity to put back.
        quantity: u32,
    },
}

/// Outcome of a successfully settled mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    /// What the settled request was doing.
    pub kind: PendingKind,
    /// Latest target queued behind the settled request, if any.
    pub queued: Option<u32>,
}

#[derive(Debug)]
struct InFlight {
    kind: PendingKind,
    queued: Option<u32>,
}

/// Tracks in-flight cart mutations, one slot per product.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    in_flight: HashMap<ProductId, InFlight>,
}

impl MutationCoordinator {
    /// Create a coordinator with no pending mutations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mutation for `product_id` is awaiting its response.
    #[must_use]
    pub fn is_pending(&self, product_id: &ProductId) -> bool {
        self.in_flight.contains_key(product_id)
    }

    /// Announce that the user wants `product_id` at `target` units.
    ///
    /// `current` is the entry's quantity before this request (including any
    /// optimistic edits already applied); `None` means no entry. A `target`
    /// of zero removes the entry.
    pub fn begin(&mut self, product_id: &ProductId, current: Option<u32>, target: u32) -> Begin {
        if let Some(in_flight) = self.in_flight.get_mut(product_id) {
            // Only the newest target survives; intermediate ones were
            // already superseded by the user.
            in_flight.queued = Some(target);
            return Begin::Queued;
        }

        let kind = match (current, target) {
            (None, 0) => return Begin::NoOp,
            (None, _) => PendingKind::Add,
            (Some(previous), 0) => PendingKind::Remove { previous },
            (Some(previous), _) => PendingKind::Update { previous },
        };
        self.in_flight
            .insert(product_id.clone(), InFlight { kind, queued: None });
        Begin::Dispatch { quantity: target }
    }

    /// Settle the in-flight mutation for `product_id` as succeeded.
    ///
    /// Returns what settled plus any queued follow-up target the caller
    /// should dispatch next, or `None` if nothing was in flight.
    pub fn complete_success(&mut self, product_id: &ProductId) -> Option<Settled> {
        let in_flight = self.in_flight.remove(product_id)?;
        Some(Settled {
            kind: in_flight.kind,
            queued: in_flight.queued,
        })
    }

    /// Settle the in-flight mutation for `product_id` as failed.
    ///
    /// Any queued follow-up is discarded: it was relative to an optimistic
    /// state that no longer exists. Returns the rollback undoing the
    /// optimistic edit, or `None` if nothing was in flight.
    pub fn complete_failure(&mut self, product_id: &ProductId) -> Option<Rollback> {
        let in_flight = self.in_flight.remove(product_id)?;
        Some(match in_flight.kind {
            PendingKind::Add => Rollback::Remove,
            PendingKind::Update { previous } | PendingKind::Remove { previous } => {
                Rollback::Restore { quantity: previous }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
