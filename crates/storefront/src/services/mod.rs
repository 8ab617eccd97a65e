//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`cart`] - Local cart mirrored to a remote checkout session
//! - [`catalog`] - Cursor-paginated catalog loading and local page slicing
//! - [`resolver`] - Route id to catalog entry resolution
//! - [`assistant`] - Prompt rendering and user-facing assistant replies
//! - [`chat`] - Chat transcript driven by the assistant
//!
//! Services are generic over the gateway traits so they can run against
//! in-memory fakes in tests.

pub mod assistant;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod resolver;
