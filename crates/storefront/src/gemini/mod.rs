//! Gemini API integration for the shopping assistant.
//!
//! # Features
//!
//! - Single-turn `generateContent` calls with fixed sampling parameters
//! - Safety filters at `BLOCK_MEDIUM_AND_ABOVE` for chat and recommendations
//! - Streaming via `streamGenerateContent?alt=sse` for a live typing effect
//!
//! Blocked or empty replies are not errors; they surface as
//! [`Reply::Blocked`] so callers can show a polite refusal.

mod client;
mod error;
pub mod types;

use std::future::Future;

use futures::stream::BoxStream;

pub use client::GeminiClient;
pub use error::GeminiError;
pub use types::{GenerationOptions, Reply};

/// Remote text generation.
///
/// [`GeminiClient`] is the production implementation.
pub trait AssistantGateway: Send + Sync {
    /// Generate a complete reply to `prompt`.
    fn generate(
        &self,
        prompt: String,
        options: GenerationOptions,
    ) -> impl Future<Output = Result<Reply, GeminiError>> + Send;

    /// Generate a reply as a stream of text chunks in arrival order.
    fn generate_stream(
        &self,
        prompt: String,
        options: GenerationOptions,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<String, GeminiError>>, GeminiError>>
    + Send;
}
