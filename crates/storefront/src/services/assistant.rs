//! Shopping assistant prompts and reply handling.
//!
//! Wraps an [`AssistantGateway`] with the storefront's prompt templates and
//! turns every failure into text a shopper can read. Nothing here returns an
//! error to the caller.

use askama::Template;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use shopease_core::CatalogEntry;
use tracing::{instrument, warn};

use crate::gemini::{AssistantGateway, GeminiError, GenerationOptions, Reply};

/// Shown when the API key is missing or rejected.
pub const CONFIGURATION_ERROR: &str = "Configuration error. Please check API settings.";

/// Shown when the quota is exhausted or requests are rate limited.
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable. Please try again later.";

/// Shown for any other gateway failure.
pub const GENERIC_FAILURE: &str =
    "Sorry, I am having trouble responding right now. Please try again later.";

/// Shown when the reply was blocked or came back empty.
pub const BLOCKED_REPLY: &str = "I apologize, but I cannot respond to that. Please ask something else!";

/// Appended to a streamed reply that failed part way.
pub const STREAM_FAILURE: &str = "Sorry, I am having trouble responding right now.";

/// Recommendation answer for an empty catalog.
pub const NO_PRODUCTS: &str = "No products available at the moment.";

/// Products included in a recommendation or context prompt.
pub const PROMPT_PRODUCT_LIMIT: usize = 20;

#[derive(Template)]
#[template(path = "prompts/chat.txt")]
struct ChatPrompt<'a> {
    message: &'a str,
    product_context: &'a str,
    brief: bool,
}

#[derive(Template)]
#[template(path = "prompts/recommend.txt")]
struct RecommendPrompt<'a> {
    products: Vec<PromptProduct<'a>>,
    query: &'a str,
}

struct PromptProduct<'a> {
    title: &'a str,
    price: String,
    description: &'a str,
}

impl<'a> From<&'a CatalogEntry> for PromptProduct<'a> {
    fn from(entry: &'a CatalogEntry) -> Self {
        let description = if entry.description.trim().is_empty() {
            "No description"
        } else {
            entry.description.as_str()
        };
        Self {
            title: &entry.title,
            price: entry.money().display(),
            description,
        }
    }
}

#[derive(Template)]
#[template(path = "prompts/sentiment.txt")]
struct SentimentPrompt<'a> {
    message: &'a str,
}

/// Tone of a customer message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    /// Read a model answer. Anything unrecognised is neutral.
    #[must_use]
    pub fn from_reply(text: &str) -> Self {
        match text
            .trim()
            .trim_end_matches('.')
            .trim_matches('"')
            .to_lowercase()
            .as_str()
        {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Map a gateway failure to what the shopper sees.
#[must_use]
pub fn user_message(error: &GeminiError) -> &'static str {
    if error.is_configuration() {
        CONFIGURATION_ERROR
    } else if error.is_quota() {
        SERVICE_UNAVAILABLE
    } else {
        GENERIC_FAILURE
    }
}

/// Compact catalog summary for chat prompts.
///
/// One `title (price)` item per product, capped at [`PROMPT_PRODUCT_LIMIT`],
/// separated by `"; "`.
#[must_use]
pub fn product_context(entries: &[CatalogEntry]) -> String {
    entries
        .iter()
        .take(PROMPT_PRODUCT_LIMIT)
        .map(|entry| format!("{} ({})", entry.title, entry.money().display()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render the chat prompt.
///
/// `brief` asks for a 2-3 sentence answer; streamed replies drop that limit.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn chat_prompt(
    message: &str,
    product_context: &str,
    brief: bool,
) -> Result<String, askama::Error> {
    ChatPrompt {
        message,
        product_context,
        brief,
    }
    .render()
}

/// Shopping assistant over an [`AssistantGateway`].
#[derive(Debug, Clone)]
pub struct ShoppingAssistant<A> {
    gateway: A,
}

impl<A: AssistantGateway> ShoppingAssistant<A> {
    pub const fn new(gateway: A) -> Self {
        Self { gateway }
    }

    pub const fn gateway(&self) -> &A {
        &self.gateway
    }

    /// Answer a shopper's question.
    #[instrument(skip_all)]
    pub async fn chat_reply(&self, message: &str, product_context: &str) -> String {
        let prompt = match chat_prompt(message, product_context, true) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render chat prompt");
                return GENERIC_FAILURE.to_string();
            }
        };

        match self.gateway.generate(prompt, GenerationOptions::CHAT).await {
            Ok(Reply::Text(text)) => text,
            Ok(Reply::Blocked) => BLOCKED_REPLY.to_string(),
            Err(e) => {
                warn!(error = %e, "Chat reply failed");
                user_message(&e).to_string()
            }
        }
    }

    /// Start a streamed answer.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the stream cannot be opened. Prompt
    /// rendering failures surface as [`GeminiError::Parse`].
    #[instrument(skip_all)]
    pub async fn chat_stream(
        &self,
        message: &str,
        product_context: &str,
    ) -> Result<BoxStream<'static, Result<String, GeminiError>>, GeminiError> {
        let prompt = chat_prompt(message, product_context, false)
            .map_err(|e| GeminiError::Parse(format!("Failed to render prompt: {e}")))?;
        self.gateway
            .generate_stream(prompt, GenerationOptions::CHAT)
            .await
    }

    /// Recommend up to three products for `query`.
    ///
    /// An empty catalog answers [`NO_PRODUCTS`]. A blank query or any
    /// failure yields `None`.
    #[instrument(skip(self, products), fields(products = products.len()))]
    pub async fn recommend(&self, products: &[CatalogEntry], query: &str) -> Option<String> {
        if products.is_empty() {
            return Some(NO_PRODUCTS.to_string());
        }
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let prompt = RecommendPrompt {
            products: products
                .iter()
                .take(PROMPT_PRODUCT_LIMIT)
                .map(PromptProduct::from)
                .collect(),
            query,
        }
        .render()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to render recommendation prompt"))
        .ok()?;

        match self
            .gateway
            .generate(prompt, GenerationOptions::RECOMMENDATION)
            .await
        {
            Ok(Reply::Text(text)) => Some(text),
            Ok(Reply::Blocked) => None,
            Err(e) => {
                warn!(error = %e, "Recommendation failed");
                None
            }
        }
    }

    /// Classify the tone of a customer message.
    #[instrument(skip_all)]
    pub async fn sentiment(&self, message: &str) -> Sentiment {
        let Ok(prompt) = (SentimentPrompt { message }).render() else {
            return Sentiment::Neutral;
        };

        match self
            .gateway
            .generate(prompt, GenerationOptions::SENTIMENT)
            .await
        {
            Ok(Reply::Text(text)) => Sentiment::from_reply(&text),
            Ok(Reply::Blocked) => Sentiment::Neutral,
            Err(e) => {
                warn!(error = %e, "Sentiment analysis failed");
                Sentiment::Neutral
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use futures::StreamExt;
    use rust_decimal::Decimal;

    use super::*;

    /// Gateway answering from a queue and recording prompts.
    #[derive(Clone, Default)]
    struct ScriptedGateway {
        replies: Arc<Mutex<VecDeque<Result<Reply, GeminiError>>>>,
        prompts: Arc<Mutex<Vec<(String, GenerationOptions)>>>,
    }

    impl ScriptedGateway {
        fn answering(reply: Result<Reply, GeminiError>) -> Self {
            let gateway = Self::default();
            gateway.replies.lock().unwrap().push_back(reply);
            gateway
        }

        fn prompts(&self) -> Vec<(String, GenerationOptions)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl AssistantGateway for ScriptedGateway {
        async fn generate(
            &self,
            prompt: String,
            options: GenerationOptions,
        ) -> Result<Reply, GeminiError> {
            self.prompts.lock().unwrap().push((prompt, options));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Reply::Blocked))
        }

        async fn generate_stream(
            &self,
            prompt: String,
            options: GenerationOptions,
        ) -> Result<BoxStream<'static, Result<String, GeminiError>>, GeminiError> {
            self.prompts.lock().unwrap().push((prompt, options));
            Ok(futures::stream::iter(vec![Ok("Hi".to_string())]).boxed())
        }
    }

    fn entry(n: usize) -> CatalogEntry {
        CatalogEntry {
            id: format!("gid://shopify/Product/{n}"),
            title: format!("Product {n}"),
            description: if n == 0 {
                String::new()
            } else {
                format!("Description {n}")
            },
            handle: format!("product-{n}"),
            price: Decimal::new(1999, 2),
            currency: "USD".to_string(),
            image: None,
            image_alt: String::new(),
            variant_id: format!("gid://shopify/ProductVariant/{n}"),
            available_for_sale: true,
        }
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            user_message(&GeminiError::Unauthorized("bad".to_string())),
            CONFIGURATION_ERROR
        );
        assert_eq!(user_message(&GeminiError::RateLimited(30)), SERVICE_UNAVAILABLE);
        assert_eq!(
            user_message(&GeminiError::Api {
                status: "RESOURCE_EXHAUSTED".to_string(),
                message: "Quota exceeded".to_string(),
            }),
            SERVICE_UNAVAILABLE
        );
        assert_eq!(
            user_message(&GeminiError::Stream("reset".to_string())),
            GENERIC_FAILURE
        );
    }

    #[test]
    fn test_sentiment_from_reply() {
        assert_eq!(Sentiment::from_reply("positive"), Sentiment::Positive);
        assert_eq!(Sentiment::from_reply(" Negative.\n"), Sentiment::Negative);
        assert_eq!(Sentiment::from_reply("\"neutral\""), Sentiment::Neutral);
        assert_eq!(Sentiment::from_reply("mixed feelings"), Sentiment::Neutral);
    }

    #[test]
    fn test_chat_prompt_variants() {
        let brief =
            chat_prompt("Any mugs?", "Mug ($5.00 USD)", true)
                .unwrap();
        assert!(brief.starts_with("You are a helpful e-commerce shopping assistant for ShopEase."));
        assert!(brief.contains("Here are our available products: Mug ($5.00 USD)"));
        assert!(brief.contains("User question: Any mugs?"));
        assert!(brief.contains("(2-3 sentences)"));

        let streamed =
            chat_prompt("Any mugs?", "", false).unwrap();
        assert!(!streamed.contains("Here are our available products"));
        assert!(streamed.contains("Keep responses concise and helpful."));
    }

    #[test]
    fn test_prompt_is_not_html_escaped() {
        let prompt =
            chat_prompt("Is <b>this</b> & that ok?", "", true)
                .unwrap();
        assert!(prompt.contains("Is <b>this</b> & that ok?"));
    }

    #[test]
    fn test_product_context_is_capped() {
        let entries: Vec<_> = (1..=30).map(entry).collect();
        let context = product_context(&entries);
        assert!(context.starts_with("Product 1 ($19.99 USD); Product 2"));
        assert!(context.contains("Product 20 ("));
        assert!(!context.contains("Product 21 ("));
    }

    #[tokio::test]
    async fn test_chat_reply_text() {
        let gateway = ScriptedGateway::answering(Ok(Reply::Text("Try the mug.".to_string())));
        let assistant = ShoppingAssistant::new(gateway.clone());

        assert_eq!(assistant.chat_reply("mugs?", "").await, "Try the mug.");
        let prompts = gateway.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].1, GenerationOptions::CHAT);
    }

    #[tokio::test]
    async fn test_chat_reply_blocked_and_errors() {
        let assistant = ShoppingAssistant::new(ScriptedGateway::answering(Ok(Reply::Blocked)));
        assert_eq!(assistant.chat_reply("x", "").await, BLOCKED_REPLY);

        let assistant = ShoppingAssistant::new(ScriptedGateway::answering(Err(
            GeminiError::Unauthorized("HTTP 403".to_string()),
        )));
        assert_eq!(assistant.chat_reply("x", "").await, CONFIGURATION_ERROR);
    }

    #[tokio::test]
    async fn test_recommend_empty_catalog() {
        let gateway = ScriptedGateway::default();
        let assistant = ShoppingAssistant::new(gateway.clone());

        assert_eq!(
            assistant.recommend(&[], "gift").await.as_deref(),
            Some(NO_PRODUCTS)
        );
        assert!(gateway.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_blank_query() {
        let gateway = ScriptedGateway::default();
        let assistant = ShoppingAssistant::new(gateway.clone());

        assert!(assistant.recommend(&[entry(1)], "   ").await.is_none());
        assert!(gateway.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_prompt() {
        let gateway = ScriptedGateway::answering(Ok(Reply::Text("1. Product 3".to_string())));
        let assistant = ShoppingAssistant::new(gateway.clone());
        let entries: Vec<_> = (0..25).map(entry).collect();

        let reply = assistant.recommend(&entries, "a gift").await;
        assert_eq!(reply.as_deref(), Some("1. Product 3"));

        let (prompt, options) = gateway.prompts().remove(0);
        assert_eq!(options, GenerationOptions::RECOMMENDATION);
        assert!(prompt.contains("- Product 0 ($19.99 USD): No description"));
        assert!(prompt.contains("- Product 19 ($19.99 USD): Description 19"));
        assert!(!prompt.contains("Product 20"));
        assert!(prompt.contains("Customer is looking for: \"a gift\""));
    }

    #[tokio::test]
    async fn test_recommend_failure_is_none() {
        let assistant =
            ShoppingAssistant::new(ScriptedGateway::answering(Err(GeminiError::RateLimited(5))));
        assert!(assistant.recommend(&[entry(1)], "gift").await.is_none());
    }

    #[tokio::test]
    async fn test_sentiment() {
        let gateway = ScriptedGateway::answering(Ok(Reply::Text("Positive".to_string())));
        let assistant = ShoppingAssistant::new(gateway.clone());

        assert_eq!(assistant.sentiment("Love it!").await, Sentiment::Positive);
        let (prompt, options) = gateway.prompts().remove(0);
        assert_eq!(options, GenerationOptions::SENTIMENT);
        assert!(prompt.contains("Message: \"Love it!\""));

        let assistant =
            ShoppingAssistant::new(ScriptedGateway::answering(Err(GeminiError::RateLimited(5))));
        assert_eq!(assistant.sentiment("meh").await, Sentiment::Neutral);
    }
}
