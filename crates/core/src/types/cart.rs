//! Local cart state.
//!
//! The cart is an ordered list of lines keyed by product id. Insertion order
//! is preserved and there is at most one line per id: adding an existing
//! product increments its quantity instead of duplicating the line.
//!
//! `count()` and `total()` are recomputed from the lines on every call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::CatalogEntry;
use super::price::Money;

/// A product in the cart with its quantity (always >= 1).
///
/// Serialized flat: the catalog fields plus `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub quantity: u32,
}

impl CartLine {
    /// Product id of this line.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.entry.id
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.entry.price * Decimal::from(self.quantity)
    }
}

/// Result of [`Cart::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has the given quantity.
    Updated(u32),
    /// The quantity was <= 0 and the line was dropped.
    Removed,
    /// No line with that id.
    Missing,
}

/// Ordered cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find the line for a product id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id() == id)
    }

    /// Find the line a shopper's reference points at.
    ///
    /// Accepts the full product id or its exact short id. Unlike product
    /// lookup there is no suffix matching, so `1` never selects `.../11`.
    #[must_use]
    pub fn find(&self, reference: &str) -> Option<&CartLine> {
        self.get(reference).or_else(|| {
            self.lines
                .iter()
                .find(|line| line.entry.short_id() == reference)
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Add `quantity` of a product.
    ///
    /// Increments an existing line or appends a new one. Returns the line's
    /// new quantity, or `None` when `quantity` is zero (nothing changes).
    pub fn add(&mut self, entry: &CatalogEntry, quantity: u32) -> Option<u32> {
        if quantity == 0 {
            return None;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.entry.id == entry.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            return Some(line.quantity);
        }
        self.lines.push(CartLine {
            entry: entry.clone(),
            quantity,
        });
        Some(quantity)
    }

    /// Drop a line regardless of its quantity.
    pub fn remove(&mut self, id: &str) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| line.id() == id)?;
        Some(self.lines.remove(index))
    }

    /// Overwrite a line's quantity in place; `quantity <= 0` removes it.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> QuantityChange {
        if quantity <= 0 {
            return match self.remove(id) {
                Some(_) => QuantityChange::Removed,
                None => QuantityChange::Missing,
            };
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.lines.iter_mut().find(|line| line.entry.id == id) {
            Some(line) => {
                line.quantity = quantity;
                QuantityChange::Updated(quantity)
            }
            None => QuantityChange::Missing,
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `price × quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total with the currency of the first line (USD for an empty cart).
    #[must_use]
    pub fn total_money(&self) -> Money {
        let currency = self
            .lines
            .first()
            .map_or("USD", |line| line.entry.currency.as_str());
        Money::new(self.total(), currency)
    }
}
