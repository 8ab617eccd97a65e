//! Core types for ShopEase.
//!
//! This module provides the data model shared by the storefront and the CLI.

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod id;
pub mod price;

pub use cart::{Cart, CartLine, QuantityChange};
pub use catalog::{CatalogEntry, DEFAULT_DESCRIPTION, PLACEHOLDER_IMAGE};
pub use chat::{ChatMessage, ChatRole, ChatTranscript, GREETING};
pub use checkout::{CheckoutLineItem, CheckoutSession};
pub use id::{PRODUCT_GID_PREFIX, short_id};
pub use price::Money;
