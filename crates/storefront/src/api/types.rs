//! Wire types for the store API.
//!
//! These mirror the JSON shapes the server actually sends, which use
//! different field names than the domain types (`_id`, `image`, `qty`).
//! Conversions into domain types live in [`super::conversions`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product as it appears in `GET /products` and `GET /products/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductData {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub cost: Decimal,
    /// Star rating; the server should send `0..=5` but is not trusted to.
    pub rating: i64,
    pub image: String,
}

/// A cart line as it appears in `GET /cart` and `POST /cart` responses.
#[derive(Debug, Clone, Deserialize)]
pub struct CartEntryData {
    #[serde(rename = "productId")]
    pub product_id: String,
    /// Line quantity; zero or negative values are treated as absent.
    pub qty: i64,
}

/// Body of `POST /cart`. The quantity is absolute, not a delta; zero removes
/// the line.
#[derive(Debug, Serialize)]
pub struct CartMutationRequest<'a> {
    #[serde(rename = "productId")]
    pub product_id: &'a str,
    pub qty: u32,
}

/// Body of `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct CredentialsRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful `POST /auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub success: bool,
    pub token: String,
    pub username: String,
    pub balance: Decimal,
}

/// Successful `POST /auth/register` response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEnvelope {
    #[allow(dead_code)]
    pub success: bool,
}

/// Error body the server attaches to non-2xx responses.
///
/// Parsed best-effort; servers and proxies are free to answer with plain
/// text, in which case the message is simply absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    pub success: bool,
    pub message: Option<String>,
}
