//! Newtype IDs for type-safe entity references.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A server-assigned product identifier.
///
/// Product IDs are opaque strings minted by the remote store service. The
/// client never generates or interprets them; it only carries them between
/// the catalog, the cart, and the wire.
///
/// # Example
///
/// ```rust
/// use tamarind_core::ProductId;
///
/// let id = ProductId::new("v4sLtEcMpzabRyfx");
/// assert_eq!(id.as_str(), "v4sLtEcMpzabRyfx");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create an ID from a server-provided string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
