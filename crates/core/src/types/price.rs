//! Type-safe money representation using decimal arithmetic.
//!
//! Shopify returns amounts as decimal strings (`"19.99"`) with a separate
//! ISO 4217 currency code. Amounts are kept as [`Decimal`] so cart totals
//! never accumulate floating-point error.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount with its currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse a Shopify decimal string.
    ///
    /// Unparsable amounts become zero, matching how the storefront renders
    /// a missing price.
    #[must_use]
    pub fn parse(amount: &str, currency_code: impl Into<String>) -> Self {
        Self::new(
            Decimal::from_str(amount.trim()).unwrap_or(Decimal::ZERO),
            currency_code,
        )
    }

    /// Currency symbol for display, if the code has a common one.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self.currency_code.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "INR" => "₹",
            "JPY" => "¥",
            _ => "",
        }
    }

    /// Format for display (e.g., "$19.99 USD").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2} {}", self.symbol(), self.amount.round_dp(2), self.currency_code)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amount() {
        let money = Money::parse("19.99", "USD");
        assert_eq!(money.amount, Decimal::new(1999, 2));
        assert_eq!(money.currency_code, "USD");
    }

    #[test]
    fn test_parse_invalid_amount_is_zero() {
        assert_eq!(Money::parse("", "USD").amount, Decimal::ZERO);
        assert_eq!(Money::parse("abc", "USD").amount, Decimal::ZERO);
    }

    #[test]
    fn test_display_pads_to_cents() {
        assert_eq!(Money::parse("5", "USD").display(), "$5.00 USD");
        assert_eq!(Money::parse("12.5", "EUR").display(), "€12.50 EUR");
        assert_eq!(Money::parse("3.456", "CHF").display(), "3.46 CHF");
    }

    #[test]
    fn test_serializes_amount_as_string() {
        let json = serde_json::to_value(Money::parse("1.10", "USD")).expect("serialize");
        assert_eq!(json["amount"], "1.10");
        assert_eq!(json["currency_code"], "USD");
    }
}
