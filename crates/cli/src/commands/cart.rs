//! Cart inspection and mutation commands.
//!
//! # Usage
//!
//! ```bash
//! tam-cli cart show
//! tam-cli cart add KCRwjF7lN97HnEaY
//! tam-cli cart inc KCRwjF7lN97HnEaY
//! tam-cli cart set KCRwjF7lN97HnEaY 3
//! tam-cli cart remove KCRwjF7lN97HnEaY
//! ```
//!
//! Every command loads the server cart before acting, so the engine's
//! duplicate guard and quantity arithmetic work from real state rather than
//! an empty startup cart.

use tamarind_core::ProductId;
use tamarind_storefront::StorefrontConfig;
use tracing::{info, warn};

use super::{CliError, EngineDriver, MutationOutcome, output};

/// Show cart contents and totals.
///
/// # Errors
///
/// Fails when not logged in or when loading the cart fails.
pub async fn show(config: &StorefrontConfig) -> Result<(), CliError> {
    let driver = load(config).await?;
    let snapshot = driver.handle().snapshot().await?;
    output::cart(&snapshot.cart_items, &snapshot.summary);
    if let Some(session) = snapshot.session {
        output::balance(session.balance());
    }
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Fails when not logged in, when loading the cart fails, or when the server
/// rejects the mutation.
pub async fn add(config: &StorefrontConfig, product_id: ProductId) -> Result<(), CliError> {
    let mut driver = load(config).await?;
    driver.handle().add_to_cart(product_id)?;
    finish(&mut driver).await
}

/// Raise a product's quantity by one.
///
/// # Errors
///
/// Fails when not logged in, when loading the cart fails, or when the server
/// rejects the mutation.
pub async fn increment(config: &StorefrontConfig, product_id: ProductId) -> Result<(), CliError> {
    let mut driver = load(config).await?;
    driver.handle().increment_quantity(product_id)?;
    finish(&mut driver).await
}

/// Lower a product's quantity by one; zero removes it.
///
/// # Errors
///
/// Fails when not logged in, when loading the cart fails, or when the server
/// rejects the mutation.
pub async fn decrement(config: &StorefrontConfig, product_id: ProductId) -> Result<(), CliError> {
    let mut driver = load(config).await?;
    driver.handle().decrement_quantity(product_id)?;
    finish(&mut driver).await
}

/// Set a product to an absolute quantity; zero removes it.
///
/// # Errors
///
/// Fails when not logged in, when loading the cart fails, or when the server
/// rejects the mutation.
pub async fn set(
    config: &StorefrontConfig,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), CliError> {
    let mut driver = load(config).await?;
    if quantity == 0 && !in_cart(&driver, &product_id).await? {
        // Removing an absent product is a silent no-op in the engine; the
        // command would otherwise wait on events that never come.
        info!(product_id = %product_id, "not in cart, nothing to do");
        return Ok(());
    }
    driver.handle().set_quantity(product_id, quantity)?;
    finish(&mut driver).await
}

/// Remove a product from the cart.
///
/// # Errors
///
/// Fails when not logged in, when loading the cart fails, or when the server
/// rejects the mutation.
pub async fn remove(config: &StorefrontConfig, product_id: ProductId) -> Result<(), CliError> {
    set(config, product_id, 0).await
}

/// Spawn an engine, require a session, and wait out the first full refresh.
async fn load(config: &StorefrontConfig) -> Result<EngineDriver, CliError> {
    let mut driver = EngineDriver::start(config)?;
    let snapshot = driver.handle().snapshot().await?;
    if snapshot.session.is_none() {
        return Err(CliError::Failed(
            "Not logged in. Run `tam-cli login` first.".to_owned(),
        ));
    }
    driver.handle().refresh()?;
    driver.await_refresh().await?;
    Ok(driver)
}

/// Wait out a sent mutation and report how it ended.
async fn finish(driver: &mut EngineDriver) -> Result<(), CliError> {
    match driver.await_mutation().await? {
        MutationOutcome::Applied { messages } => {
            for message in messages {
                info!("{message}");
            }
            let snapshot = driver.handle().snapshot().await?;
            output::cart(&snapshot.cart_items, &snapshot.summary);
            Ok(())
        }
        MutationOutcome::Rejected { message } => {
            warn!("{message}");
            Ok(())
        }
    }
}

async fn in_cart(driver: &EngineDriver, product_id: &ProductId) -> Result<bool, CliError> {
    let snapshot = driver.handle().snapshot().await?;
    Ok(snapshot
        .cart_items
        .iter()
        .any(|item| item.product.id == *product_id))
}
