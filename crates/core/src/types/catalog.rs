//! Catalog entries as fetched from the commerce backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::short_id;
use super::price::Money;

/// Inline SVG shown when a product has no image or the image fails to load.
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='600' height='600'%3E%3Crect fill='%23e8e8e8' width='600' height='600'/%3E%3Ctext fill='%23666' x='50%25' y='50%25' text-anchor='middle' dy='.3em' font-size='24' font-family='Arial'%3EImage Unavailable%3C/text%3E%3C/svg%3E";

/// Description shown when a product has none.
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// A product in the catalog.
///
/// Immutable once fetched. Identity is `id`, a Shopify global id; the
/// first variant supplies `variant_id` and availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Shopify product global id.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub handle: String,
    /// Minimum variant price.
    pub price: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// First product image URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_alt: String,
    /// First variant global id (empty if the product has no variants).
    #[serde(default)]
    pub variant_id: String,
    #[serde(default)]
    pub available_for_sale: bool,
}

impl CatalogEntry {
    /// Short id used in routes.
    #[must_use]
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Price with currency.
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(self.price, self.currency.clone())
    }

    /// Image URL, or the placeholder when missing.
    #[must_use]
    pub fn image_or_placeholder(&self) -> &str {
        match self.image.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    /// Alt text, falling back to the title.
    #[must_use]
    pub fn alt_text(&self) -> &str {
        if self.image_alt.is_empty() {
            &self.title
        } else {
            &self.image_alt
        }
    }

    /// Description, or the default text when empty.
    #[must_use]
    pub fn description_or_default(&self) -> &str {
        if self.description.trim().is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            &self.description
        }
    }
}
