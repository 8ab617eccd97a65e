//! ShopEase Core - Shared types library.
//!
//! This crate provides the domain types used by every ShopEase component:
//! - `storefront` - Shopify and Gemini gateways, cart synchronizer, HTTP surface
//! - `cli` - Terminal shell over the same services
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no
//! storage, no HTTP clients. Cart arithmetic lives here so it can be tested
//! without any gateway in the picture.
//!
//! # Modules
//!
//! - [`types`] - Catalog entries, cart lines, checkout sessions, chat transcripts,
//!   money and Shopify global ids

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
