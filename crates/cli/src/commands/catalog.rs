//! Catalog commands.

use std::io::Write;

use shopease_storefront::services::catalog::{CatalogBrowser, ProductFeed, fetch_all};
use shopease_storefront::services::resolver::resolve_product;

use super::{CliError, Context, write_entry};

/// Print one page of the catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list(ctx: &Context, page: usize) -> Result<(), CliError> {
    let mut browser =
        CatalogBrowser::load(ctx.storefront(), ctx.config().catalog.products_per_page).await;
    if let Some(message) = browser.error() {
        return Err(CliError::Catalog(message.to_string()));
    }

    let page = browser.set_page(page);
    let mut out = std::io::stdout().lock();

    if browser.entries().is_empty() {
        writeln!(out, "No products found.")?;
        return Ok(());
    }

    for entry in browser.current() {
        write_entry(&mut out, entry)?;
    }
    writeln!(
        out,
        "\nPage {page} of {} ({} products)",
        browser.total_pages(),
        browser.entries().len()
    )?;
    Ok(())
}

/// Load `batches` feed pages and print everything loaded.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub async fn feed(ctx: &Context, batches: usize) -> Result<(), CliError> {
    let mut feed = ProductFeed::new(ctx.storefront().clone());

    for _ in 0..batches.max(1) {
        feed.load_more().await;
        if feed.error().is_some() || !feed.has_more() {
            break;
        }
    }

    let mut out = std::io::stdout().lock();
    for entry in feed.entries() {
        write_entry(&mut out, entry)?;
    }
    if let Some(error) = feed.error() {
        writeln!(out, "\nStopped early: {error}")?;
    } else if feed.has_more() {
        writeln!(out, "\nMore products available.")?;
    }
    Ok(())
}

/// Print one product.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or nothing matches `id`.
pub async fn show(ctx: &Context, id: &str) -> Result<(), CliError> {
    let entries = fetch_all(ctx.storefront()).await?;
    let entry = resolve_product(id, &entries).ok_or_else(|| CliError::NotFound(id.to_string()))?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", entry.title)?;
    writeln!(out, "{}", entry.money().display())?;
    writeln!(out, "id:     {}", entry.id)?;
    writeln!(out, "handle: {}", entry.handle)?;
    writeln!(out, "image:  {}", entry.image.as_deref().unwrap_or("(none)"))?;
    if !entry.available_for_sale {
        writeln!(out, "Sold out")?;
    }
    writeln!(out, "\n{}", entry.description_or_default())?;
    Ok(())
}
