//! Cart commands over a local JSON file.

use std::io::Write;

use shopease_core::{Cart, Money};
use shopease_storefront::services::cart::{CartError, CartSynchronizer, SyncOutcome};
use shopease_storefront::services::catalog::fetch_all;
use shopease_storefront::services::resolver::resolve_product;
use shopease_storefront::shopify::StorefrontClient;
use shopease_storefront::storage::FileStorage;

use super::{CliError, Context};

type FileCart = CartSynchronizer<StorefrontClient, FileStorage>;

async fn open(ctx: &Context) -> Result<FileCart, CliError> {
    let storage = FileStorage::new(ctx.config().cart_file());
    Ok(CartSynchronizer::restore(ctx.storefront().clone(), storage).await?)
}

/// Full id of the cart line `id` refers to.
fn line_id(cart: &Cart, id: &str) -> Result<String, CliError> {
    cart.find(id)
        .map(|line| line.id().to_string())
        .ok_or_else(|| CliError::NotFound(id.to_string()))
}

fn print_cart(cart: &FileCart, outcome: Option<SyncOutcome>) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();

    if cart.cart().is_empty() {
        writeln!(out, "Your cart is empty.")?;
    } else {
        for line in cart.cart().lines() {
            let entry = &line.entry;
            writeln!(
                out,
                "{:>14}  {} x{}  {}",
                entry.short_id(),
                entry.title,
                line.quantity,
                Money::new(line.line_total(), entry.currency.clone()).display()
            )?;
        }
        writeln!(
            out,
            "\n{} items, total {}",
            cart.count(),
            cart.cart().total_money().display()
        )?;
    }

    match outcome {
        Some(SyncOutcome::Diverged) => {
            writeln!(out, "Checkout is out of sync; it will be rebuilt on the next change.")?;
        }
        _ if cart.checkout().is_some_and(|session| session.stale) => {
            writeln!(out, "Checkout is out of sync; run `shopease cart sync`.")?;
        }
        _ => {}
    }
    Ok(())
}

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the cart file cannot be read.
pub async fn show(ctx: &Context) -> Result<(), CliError> {
    let cart = open(ctx).await?;
    print_cart(&cart, None)
}

/// Add a product by id.
///
/// # Errors
///
/// Returns an error if the product cannot be found or the cart cannot be saved.
pub async fn add(ctx: &Context, id: &str, quantity: u32) -> Result<(), CliError> {
    let entries = fetch_all(ctx.storefront()).await?;
    let entry = resolve_product(id, &entries).ok_or_else(|| CliError::NotFound(id.to_string()))?;

    let mut cart = open(ctx).await?;
    let outcome = cart.add_line(entry, quantity).await?;
    print_cart(&cart, Some(outcome))
}

/// Overwrite a line's quantity.
///
/// # Errors
///
/// Returns an error if the line is not in the cart or the cart cannot be saved.
pub async fn set_quantity(ctx: &Context, id: &str, quantity: i64) -> Result<(), CliError> {
    let mut cart = open(ctx).await?;
    let line = line_id(cart.cart(), id)?;
    let outcome = cart.set_quantity(&line, quantity).await?;
    print_cart(&cart, Some(outcome))
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the line is not in the cart or the cart cannot be saved.
pub async fn remove(ctx: &Context, id: &str) -> Result<(), CliError> {
    let mut cart = open(ctx).await?;
    let line = line_id(cart.cart(), id)?;
    let outcome = cart.remove_line(&line).await?;
    print_cart(&cart, Some(outcome))
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    let mut cart = open(ctx).await?;
    let outcome = cart.clear().await?;
    print_cart(&cart, Some(outcome))
}

/// Re-fetch the remote checkout, then rebuild it if it is stale.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn sync(ctx: &Context) -> Result<(), CliError> {
    let mut cart = open(ctx).await?;
    cart.refresh().await?;
    let outcome = cart.reconcile().await?;
    print_cart(&cart, Some(outcome))
}

/// Print where to check out.
///
/// # Errors
///
/// Returns an error if the cart is empty or cannot be saved.
pub async fn checkout(ctx: &Context) -> Result<(), CliError> {
    let mut cart = open(ctx).await?;
    cart.reconcile().await?;

    let mut out = std::io::stdout().lock();
    match cart.checkout_url(&ctx.config().shopify.store) {
        Ok(url) => writeln!(out, "{url}")?,
        Err(CartError::Empty) => writeln!(out, "Your cart is empty.")?,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
