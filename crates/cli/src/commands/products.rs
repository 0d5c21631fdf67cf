//! Catalog listing and search.
//!
//! # Usage
//!
//! ```bash
//! tam-cli products
//! tam-cli products --search "running shoes"
//! ```

use tamarind_storefront::StorefrontConfig;

use super::{CliError, EngineDriver, output};

/// List the catalog, optionally narrowed by a search.
///
/// # Errors
///
/// Fails when the fetch fails or the engine stops.
pub async fn list(config: &StorefrontConfig, search: Option<String>) -> Result<(), CliError> {
    let mut driver = EngineDriver::start(config)?;
    match search {
        // Search rides the engine's debounce, so the request goes out once
        // the configured idle window has passed.
        Some(text) => driver.handle().search_input(text)?,
        None => driver.handle().refresh()?,
    }
    let products = driver.await_catalog().await?;
    output::products(&products);
    Ok(())
}
