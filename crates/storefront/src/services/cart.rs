//! Cart/checkout synchronization.
//!
//! The local [`Cart`] is the source of truth. Every mutation is applied and
//! persisted locally first, then mirrored to the remote checkout session.
//! A failed mirror call never rolls the cart back; it marks the session
//! stale and the next mutation (or [`CartSynchronizer::reconcile`]) rebuilds
//! the remote session from the full cart with a fresh `cartCreate`.
//!
//! Cart and session are persisted together in two storage slots. On restore
//! both come back or neither does.

use rust_decimal::Decimal;
use shopease_core::{Cart, CatalogEntry, CheckoutSession, QuantityChange};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::shopify::{CatalogGateway, CheckoutLineInput, CheckoutLineUpdate, ShopifyError};
use crate::storage::{LocalStore, StorageError, keys};

/// Errors from cart operations.
///
/// Remote failures are not errors; they are reported as
/// [`SyncOutcome::Diverged`].
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Cart is empty")]
    Empty,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for CartError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(StorageError::Serialize(e))
    }
}

/// How a mutation reached the remote checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Applied locally and mirrored remotely.
    Mirrored,
    /// Applied locally; nothing needed mirroring.
    LocalOnly,
    /// Applied locally; the remote call failed and the session is stale.
    Diverged,
}

/// Remote mutation to mirror a local change onto a live session.
enum RemoteOp {
    Add(Vec<CheckoutLineInput>),
    Update(Vec<CheckoutLineUpdate>),
    Remove(Vec<String>),
    Nothing,
}

/// Local cart with a mirrored remote checkout session.
pub struct CartSynchronizer<G, S> {
    gateway: G,
    store: S,
    cart: Cart,
    checkout: Option<CheckoutSession>,
}

impl<G: CatalogGateway, S: LocalStore> CartSynchronizer<G, S> {
    /// Restore cart and checkout from storage.
    ///
    /// A missing or unparsable cart slot yields an empty cart and also
    /// discards the stored checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    #[instrument(skip_all)]
    pub async fn restore(gateway: G, store: S) -> Result<Self, CartError> {
        let cart = match store.read(keys::CART).await? {
            Some(raw) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => Some(cart),
                Err(e) => {
                    warn!(error = %e, "Stored cart is unreadable, starting empty");
                    None
                }
            },
            None => None,
        };

        let checkout = match cart {
            Some(_) => match store.read(keys::CHECKOUT).await? {
                Some(raw) => serde_json::from_str::<Option<CheckoutSession>>(&raw)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Stored checkout is unreadable, discarding");
                        None
                    }),
                None => None,
            },
            None => None,
        };

        debug!(
            lines = cart.as_ref().map_or(0, Cart::len),
            has_checkout = checkout.is_some(),
            "Cart restored"
        );

        Ok(Self {
            gateway,
            store,
            cart: cart.unwrap_or_default(),
            checkout,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutSession> {
        self.checkout.as_ref()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.cart.count()
    }

    /// Sum of `price × quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Add `quantity` of `entry`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self, entry), fields(product_id = %entry.id))]
    pub async fn add_line(
        &mut self,
        entry: &CatalogEntry,
        quantity: u32,
    ) -> Result<SyncOutcome, CartError> {
        if self.cart.add(entry, quantity).is_none() {
            return Ok(SyncOutcome::LocalOnly);
        }
        self.persist().await?;

        if entry.variant_id.is_empty() {
            debug!("Product has no variant, not mirrored");
            return Ok(SyncOutcome::LocalOnly);
        }

        self.mirror(RemoteOp::Add(vec![CheckoutLineInput::new(
            &entry.variant_id,
            quantity,
        )]))
        .await
    }

    /// Drop the line for `id` regardless of its quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub async fn remove_line(&mut self, id: &str) -> Result<SyncOutcome, CartError> {
        let Some(removed) = self.cart.remove(id) else {
            return Ok(SyncOutcome::LocalOnly);
        };
        self.persist().await?;

        let op = self
            .remote_line_id(&removed.entry.variant_id)
            .map_or(RemoteOp::Nothing, |line_id| RemoteOp::Remove(vec![line_id]));
        self.mirror(op).await
    }

    /// Overwrite the quantity for `id`; `quantity <= 0` removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &mut self,
        id: &str,
        quantity: i64,
    ) -> Result<SyncOutcome, CartError> {
        let Some(variant_id) = self.cart.get(id).map(|line| line.entry.variant_id.clone()) else {
            return Ok(SyncOutcome::LocalOnly);
        };

        let change = self.cart.set_quantity(id, quantity);
        self.persist().await?;

        let remote_line = self.remote_line_id(&variant_id);
        let op = match (change, remote_line) {
            (QuantityChange::Missing, _) => RemoteOp::Nothing,
            (QuantityChange::Removed, Some(line_id)) => RemoteOp::Remove(vec![line_id]),
            (QuantityChange::Removed, None) => RemoteOp::Nothing,
            (QuantityChange::Updated(quantity), Some(line_id)) => {
                RemoteOp::Update(vec![CheckoutLineUpdate { line_id, quantity }])
            }
            (QuantityChange::Updated(_), None) if variant_id.is_empty() => RemoteOp::Nothing,
            // The remote lost the line; add it back at the new quantity
            (QuantityChange::Updated(quantity), None) => {
                RemoteOp::Add(vec![CheckoutLineInput::new(variant_id, quantity)])
            }
        };
        self.mirror(op).await
    }

    /// Empty the cart and forget the checkout session. No remote call.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<SyncOutcome, CartError> {
        self.cart.clear();
        self.checkout = None;
        self.persist().await?;
        Ok(SyncOutcome::LocalOnly)
    }

    /// URL to send the buyer to.
    ///
    /// The session's hosted checkout when it is in sync, otherwise the
    /// store's cart page.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] when there is nothing to check out.
    pub fn checkout_url(&self, store: &str) -> Result<String, CartError> {
        if self.cart.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(match &self.checkout {
            Some(session) if !session.stale && !session.web_url.is_empty() => {
                session.web_url.clone()
            }
            _ => format!("https://{store}/cart"),
        })
    }

    /// Re-fetch the remote session. An expired remote cart is forgotten.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<SyncOutcome, CartError> {
        let Some(current) = self.checkout.as_ref() else {
            return Ok(SyncOutcome::LocalOnly);
        };

        match self.gateway.get_checkout(&current.id).await {
            Ok(Some(mut remote)) => {
                remote.stale = current.stale;
                self.checkout = Some(remote);
                self.persist().await?;
                Ok(SyncOutcome::Mirrored)
            }
            Ok(None) => {
                debug!("Remote checkout expired");
                self.checkout = None;
                self.persist().await?;
                Ok(SyncOutcome::LocalOnly)
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh checkout");
                Ok(SyncOutcome::Diverged)
            }
        }
    }

    /// Rebuild the remote session from the full cart if it is stale or
    /// missing. A session that is in sync is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    #[instrument(skip(self))]
    pub async fn reconcile(&mut self) -> Result<SyncOutcome, CartError> {
        if !self.needs_rebuild() {
            return Ok(SyncOutcome::LocalOnly);
        }
        if self.cart.is_empty() {
            self.checkout = None;
            self.persist().await?;
            return Ok(SyncOutcome::LocalOnly);
        }

        let result = self.create_from_cart().await;
        self.apply_remote(result).await
    }

    fn needs_rebuild(&self) -> bool {
        self.checkout.as_ref().is_none_or(|session| session.stale)
    }

    fn remote_line_id(&self, variant_id: &str) -> Option<String> {
        if variant_id.is_empty() {
            return None;
        }
        self.checkout
            .as_ref()
            .and_then(|session| session.line_for_variant(variant_id))
            .map(|line| line.id.clone())
    }

    async fn create_from_cart(&self) -> Result<CheckoutSession, ShopifyError> {
        let lines = self
            .cart
            .lines()
            .iter()
            .filter(|line| !line.entry.variant_id.is_empty())
            .map(|line| CheckoutLineInput::new(&line.entry.variant_id, line.quantity))
            .collect();
        self.gateway.create_checkout(lines).await
    }

    async fn mirror(&mut self, op: RemoteOp) -> Result<SyncOutcome, CartError> {
        let result = match self.checkout.as_ref() {
            Some(session) if session.stale => {
                debug!("Rebuilding stale checkout");
                self.create_from_cart().await
            }
            Some(session) => match op {
                RemoteOp::Add(lines) => self.gateway.add_checkout_lines(&session.id, lines).await,
                RemoteOp::Update(lines) => {
                    self.gateway
                        .update_checkout_lines(&session.id, lines)
                        .await
                }
                RemoteOp::Remove(ids) => self.gateway.remove_checkout_lines(&session.id, ids).await,
                RemoteOp::Nothing => return Ok(SyncOutcome::LocalOnly),
            },
            None => match op {
                // Seeded from the full cart so lines added while no session
                // existed are not lost
                RemoteOp::Add(_) => self.create_from_cart().await,
                _ => return Ok(SyncOutcome::LocalOnly),
            },
        };

        self.apply_remote(result).await
    }

    async fn apply_remote(
        &mut self,
        result: Result<CheckoutSession, ShopifyError>,
    ) -> Result<SyncOutcome, CartError> {
        let outcome = match result {
            Ok(session) => {
                self.checkout = Some(session);
                SyncOutcome::Mirrored
            }
            Err(e) => {
                warn!(error = %e, "Checkout mirror failed, keeping local cart");
                if let Some(session) = self.checkout.as_mut() {
                    session.stale = true;
                }
                SyncOutcome::Diverged
            }
        };
        self.persist().await?;
        Ok(outcome)
    }

    async fn persist(&self) -> Result<(), CartError> {
        self.store
            .write(keys::CART, serde_json::to_string(&self.cart)?)
            .await?;
        self.store
            .write(keys::CHECKOUT, serde_json::to_string(&self.checkout)?)
            .await?;
        Ok(())
    }
}
