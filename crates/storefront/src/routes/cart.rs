//! Cart route handlers.
//!
//! Each request restores a [`CartSynchronizer`] from the visitor's session,
//! applies one operation and lets the synchronizer persist the result back
//! into the session.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopease_core::{Cart, CartLine, CheckoutSession, Money};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::cart::{CartError, CartSynchronizer, SyncOutcome};
use crate::services::catalog::fetch_all;
use crate::services::resolver::resolve_product;
use crate::shopify::StorefrontClient;
use crate::state::AppState;
use crate::storage::SessionStorage;

/// Synchronizer over the visitor's session.
pub type SessionCart = CartSynchronizer<StorefrontClient, SessionStorage>;

/// Restore the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn open_cart(state: &AppState, session: Session) -> Result<SessionCart> {
    Ok(CartSynchronizer::restore(state.storefront().clone(), SessionStorage::new(session)).await?)
}

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: String,
    pub short_id: String,
    pub title: String,
    pub image: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let entry = &line.entry;
        Self {
            id: entry.id.clone(),
            short_id: entry.short_id().to_string(),
            title: entry.title.clone(),
            image: entry.image_or_placeholder().to_string(),
            price: entry.money().display(),
            quantity: line.quantity,
            line_total: Money::new(line.line_total(), entry.currency.clone()).display(),
        }
    }
}

/// Remote checkout summary.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub id: String,
    pub web_url: String,
    pub total_quantity: u64,
    pub stale: bool,
}

impl From<&CheckoutSession> for CheckoutView {
    fn from(session: &CheckoutSession) -> Self {
        Self {
            id: session.id.clone(),
            web_url: session.web_url.clone(),
            total_quantity: session.total_quantity(),
            stale: session.stale,
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    pub total: String,
    pub total_amount: Decimal,
    pub checkout: Option<CheckoutView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

impl CartView {
    fn new(cart: &Cart, checkout: Option<&CheckoutSession>, sync: Option<SyncOutcome>) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            item_count: cart.count(),
            total: cart.total_money().display(),
            total_amount: cart.total(),
            checkout: checkout.map(CheckoutView::from),
            sync,
        }
    }

    fn from_sync(cart: &SessionCart, sync: Option<SyncOutcome>) -> Self {
        Self::new(cart.cart(), cart.checkout(), sync)
    }
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Full or short product id.
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: String,
    /// Zero or negative removes the line.
    pub quantity: i64,
}

/// Remove from cart request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: String,
}

/// Full id of the cart line a request refers to.
fn line_id(cart: &Cart, product_id: &str) -> Result<String> {
    cart.find(product_id)
        .map(|line| line.id().to_string())
        .ok_or_else(|| AppError::NotFound(format!("cart line {product_id}")))
}

/// Show the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = open_cart(&state, session).await?;
    Ok(Json(CartView::from_sync(&cart, None)))
}

/// Add a product to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }

    let entries = fetch_all(state.storefront()).await?;
    let entry = resolve_product(&request.product_id, &entries)
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let mut cart = open_cart(&state, session).await?;
    let sync = cart.add_line(entry, quantity).await?;
    Ok(Json(CartView::from_sync(&cart, Some(sync))))
}

/// Overwrite a line's quantity.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(&state, session).await?;
    let id = line_id(cart.cart(), &request.product_id)?;
    let sync = cart.set_quantity(&id, request.quantity).await?;
    Ok(Json(CartView::from_sync(&cart, Some(sync))))
}

/// Drop a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(&state, session).await?;
    let id = line_id(cart.cart(), &request.product_id)?;
    let sync = cart.remove_line(&id).await?;
    Ok(Json(CartView::from_sync(&cart, Some(sync))))
}

/// Empty the cart and forget the checkout.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let mut cart = open_cart(&state, session).await?;
    let sync = cart.clear().await?;
    Ok(Json(CartView::from_sync(&cart, Some(sync))))
}

/// Redirect to the hosted checkout.
///
/// A stale or missing remote session is rebuilt first. An empty cart goes
/// back to the cart page.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut cart = open_cart(&state, session).await?;
    cart.reconcile().await?;

    match cart.checkout_url(&state.config().shopify.store) {
        Ok(url) => Ok(Redirect::to(&url).into_response()),
        Err(CartError::Empty) => Ok(Redirect::to("/cart").into_response()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use shopease_core::CatalogEntry;

    use super::*;

    #[test]
    fn test_cart_view() {
        let entry = CatalogEntry {
            id: "gid://shopify/Product/9".to_string(),
            title: "Mug".to_string(),
            description: String::new(),
            handle: "mug".to_string(),
            price: Decimal::new(1250, 2),
            currency: "USD".to_string(),
            image: None,
            image_alt: String::new(),
            variant_id: "gid://shopify/ProductVariant/90".to_string(),
            available_for_sale: true,
        };
        let mut cart = Cart::new();
        cart.add(&entry, 2);

        let view = CartView::new(&cart, None, Some(SyncOutcome::LocalOnly));
        assert_eq!(view.item_count, 2);
        assert_eq!(view.total_amount, Decimal::new(2500, 2));
        assert_eq!(view.total, "$25.00 USD");
        assert_eq!(view.lines[0].short_id, "9");
        assert_eq!(view.lines[0].line_total, "$25.00 USD");

        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["sync"], "local_only");
        assert!(json["checkout"].is_null());
    }

    #[test]
    fn test_line_id_matches_exact_short_id() {
        let entry = |n: u32| CatalogEntry {
            id: format!("gid://shopify/Product/{n}"),
            title: format!("Product {n}"),
            description: String::new(),
            handle: format!("product-{n}"),
            price: Decimal::ONE,
            currency: "USD".to_string(),
            image: None,
            image_alt: String::new(),
            variant_id: format!("gid://shopify/ProductVariant/{n}"),
            available_for_sale: true,
        };
        let mut cart = Cart::new();
        cart.add(&entry(11), 1);
        cart.add(&entry(1), 1);

        assert_eq!(line_id(&cart, "1").expect("line"), "gid://shopify/Product/1");
        assert_eq!(
            line_id(&cart, "gid://shopify/Product/11").expect("line"),
            "gid://shopify/Product/11"
        );
        assert!(matches!(line_id(&cart, "21"), Err(AppError::NotFound(_))));
    }
}
