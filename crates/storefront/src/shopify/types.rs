//! Gateway types for the Shopify Storefront API.
//!
//! These types sit between services and the raw query shapes in
//! `storefront::queries`. Domain types (catalog entries, checkout sessions)
//! come from `shopease_core`.

use serde::{Deserialize, Serialize};
use shopease_core::CatalogEntry;

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item in this page.
    pub end_cursor: Option<String>,
}

/// One page of catalog entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPage {
    /// Entries in the order Shopify returned them.
    pub entries: Vec<CatalogEntry>,
    /// Pagination info.
    pub page_info: PageInfo,
}

impl ProductPage {
    /// Whether another page can be requested with [`Self::end_cursor`].
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page_info.has_next_page
    }

    /// Cursor to pass as `after` for the next page.
    #[must_use]
    pub fn end_cursor(&self) -> Option<&str> {
        self.page_info.end_cursor.as_deref()
    }
}

// =============================================================================
// Checkout Input Types
// =============================================================================

/// Input for adding a line to a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLineInput {
    /// Product variant global id.
    pub variant_id: String,
    /// Quantity to add.
    pub quantity: u32,
}

impl CheckoutLineInput {
    #[must_use]
    pub fn new(variant_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            variant_id: variant_id.into(),
            quantity,
        }
    }
}

/// Input for overwriting the quantity of an existing checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLineUpdate {
    /// Remote checkout line id.
    pub line_id: String,
    /// New quantity.
    pub quantity: u32,
}

/// User error from a cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutUserError {
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Error message.
    pub message: String,
}

/// Join user errors into one message, as returned in [`crate::shopify::ShopifyError::UserError`].
#[must_use]
pub fn join_user_errors(errors: &[CheckoutUserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
