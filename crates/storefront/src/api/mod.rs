//! Typed client for the remote store API.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the server is the source of truth for cart
//!   and catalog state
//! - Full-catalog responses are cached in-memory via `moka` (configurable
//!   TTL); search and cart responses are never cached
//! - Every request carries an `x-request-id` header for log correlation
//!
//! # Endpoints
//!
//! | Operation | Method & path |
//! |---|---|
//! | Full catalog | `GET /products` |
//! | Search | `GET /products/search?value=<query>` (404 = no matches) |
//! | Read cart | `GET /cart` (bearer) |
//! | Mutate cart | `POST /cart` (bearer, absolute quantity) |
//! | Register | `POST /auth/register` |
//! | Login | `POST /auth/login` |

mod conversions;
mod types;

pub use types::LoginData;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use tamarind_core::{CartEntry, Product, ProductId};

use crate::config::StorefrontConfig;

use conversions::{convert_cart_entries, convert_products};
use types::{CartEntryData, CartMutationRequest, CredentialsRequest, ErrorEnvelope, ProductData, StatusEnvelope};

/// The HTTP header used to correlate client requests with server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const CATALOG_CACHE_KEY: &str = "products";

/// Errors that can occur when calling the store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived (connect, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("(no error details provided)"))]
    Status {
        /// Response status code.
        status: StatusCode,
        /// `message` from the server's error envelope, when one was parseable.
        message: Option<String>,
    },

    /// The response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// The human-readable message the server attached, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// The response status, when the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }
}

/// Client for the remote store API.
///
/// Cheap to clone; all clones share the HTTP connection pool and the
/// catalog cache.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: String,
    catalog_cache: Option<Cache<&'static str, Vec<Product>>>,
}

impl StoreClient {
    /// Create a new store API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let catalog_cache = if config.catalog_cache_ttl.is_zero() {
            None
        } else {
            Some(
                Cache::builder()
                    .max_capacity(8)
                    .time_to_live(config.catalog_cache_ttl)
                    .build(),
            )
        };

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
                catalog_cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Send a request and parse the JSON body.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            // The server attaches {"success": false, "message": ...} to
            // failures; parse best-effort so proxies answering plain text
            // still map to a Status error.
            let message = serde_json::from_str::<ErrorEnvelope>(&response_text)
                .ok()
                .and_then(|envelope| envelope.message);
            debug!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "store API returned non-success status"
            );
            return Err(ApiError::Status { status, message });
        }

        match serde_json::from_str(&response_text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse store API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Fetch the full product catalog.
    ///
    /// Served from the in-memory cache when a fresh response is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(cache) = &self.inner.catalog_cache
            && let Some(products) = cache.get(CATALOG_CACHE_KEY).await
        {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let data: Vec<ProductData> = self
            .execute(self.inner.client.get(self.endpoint("products")))
            .await?;
        let products = convert_products(data);

        if let Some(cache) = &self.inner.catalog_cache {
            cache.insert(CATALOG_CACHE_KEY, products.clone()).await;
        }

        Ok(products)
    }

    /// Search the catalog by name or category.
    ///
    /// A 404 response means "no matches" and maps to an empty listing, not
    /// an error. Search responses are never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails with anything but 404.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint("products/search"))
            .query(&[("value", query)]);

        match self.execute::<Vec<ProductData>>(request).await {
            Ok(data) => Ok(convert_products(data)),
            Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                ..
            }) => {
                debug!("search returned no matches");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Fetch the authenticated user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint("cart"))
            .bearer_auth(token.expose_secret());

        let data: Vec<CartEntryData> = self.execute(request).await?;
        Ok(convert_cart_entries(data))
    }

    /// Set the absolute quantity of a product in the cart (0 removes it).
    ///
    /// Returns the full cart snapshot after the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity))]
    pub async fn post_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("cart"))
            .bearer_auth(token.expose_secret())
            .json(&CartMutationRequest {
                product_id: product_id.as_str(),
                qty: quantity,
            });

        let data: Vec<CartEntryData> = self.execute(request).await?;
        Ok(convert_cart_entries(data))
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; a 400 carries the server's
    /// rejection message (e.g., "Username is already taken").
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("auth/register"))
            .json(&CredentialsRequest { username, password });

        let _: StatusEnvelope = self.execute(request).await?;
        Ok(())
    }

    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; a 400 carries the server's
    /// rejection message.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginData, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("auth/login"))
            .json(&CredentialsRequest { username, password });

        self.execute(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Username is already taken".to_owned()),
        };
        assert_eq!(err.to_string(), "HTTP 400 Bad Request: Username is already taken");

        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(
            err.to_string(),
            "HTTP 500 Internal Server Error: (no error details provided)"
        );
    }

    #[test]
    fn test_server_message_only_for_status_errors() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("nope".to_owned()),
        };
        assert_eq!(err.server_message(), Some("nope"));

        let parse_err = serde_json::from_str::<Vec<ProductData>>("not json").unwrap_err();
        assert!(ApiError::Parse(parse_err).server_message().is_none());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = StorefrontConfig {
            api_base_url: url::Url::parse("http://localhost:8082/api/v1/").unwrap(),
            search_debounce: std::time::Duration::from_millis(500),
            shipping_fee: rust_decimal::Decimal::ZERO,
            catalog_cache_ttl: std::time::Duration::ZERO,
            request_timeout: std::time::Duration::from_secs(10),
            session_file: std::path::PathBuf::from(".tamarind/session.json"),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let client = StoreClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("products/search"),
            "http://localhost:8082/api/v1/products/search"
        );
    }
}
