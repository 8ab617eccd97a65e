//! Remote checkout session mirrored from the commerce backend.
//!
//! A [`CheckoutSession`] is a cached shadow of the local cart. It is never
//! the source of truth for quantities shown to the user.

use serde::{Deserialize, Serialize};

use super::price::Money;

/// A line item as the remote checkout sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItem {
    /// Remote line id (needed for update and remove mutations).
    pub id: String,
    /// Purchased variant global id.
    pub variant_id: String,
    pub title: String,
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<Money>,
}

/// Remote checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Remote session id.
    pub id: String,
    /// Hosted checkout URL.
    pub web_url: String,
    #[serde(default)]
    pub line_items: Vec<CheckoutLineItem>,
    pub total_price: Money,
    /// Set when a mirror call failed; the session no longer matches the cart
    /// and must be rebuilt before further remote mutations.
    #[serde(default)]
    pub stale: bool,
}

impl CheckoutSession {
    /// Find the remote line for a variant.
    #[must_use]
    pub fn line_for_variant(&self, variant_id: &str) -> Option<&CheckoutLineItem> {
        self.line_items
            .iter()
            .find(|item| item.variant_id == variant_id)
    }

    /// Sum of remote quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.line_items
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }
}
