//! Cart type conversion functions.

use shopease_core::{CheckoutLineItem, CheckoutSession, Money};

use crate::shopify::types::CheckoutUserError;

use super::super::queries::fragments::{CartFields, CartUserError};

/// Convert a remote cart into the local checkout session shadow.
pub fn convert_cart(cart: CartFields) -> CheckoutSession {
    let total = cart.cost.total_amount;

    CheckoutSession {
        id: cart.id,
        web_url: cart.checkout_url,
        line_items: cart
            .lines
            .edges
            .into_iter()
            .map(|edge| {
                let line = edge.node;
                let title = line
                    .merchandise
                    .product
                    .map_or(line.merchandise.title, |p| p.title);
                CheckoutLineItem {
                    id: line.id,
                    variant_id: line.merchandise.id,
                    title,
                    quantity: line.quantity,
                    price: line.cost.map(|c| {
                        Money::parse(
                            &c.amount_per_quantity.amount,
                            c.amount_per_quantity.currency_code,
                        )
                    }),
                }
            })
            .collect(),
        total_price: Money::parse(&total.amount, total.currency_code),
        stale: false,
    }
}

/// Convert raw user errors.
pub fn convert_user_errors(errors: Vec<CartUserError>) -> Vec<CheckoutUserError> {
    errors
        .into_iter()
        .map(|e| CheckoutUserError {
            field: e.field,
            message: e.message,
        })
        .collect()
}
