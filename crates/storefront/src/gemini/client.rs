//! Gemini API client for the shopping assistant.
//!
//! Provides both streaming and non-streaming access to `generateContent`.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::GeminiConfig;

use super::AssistantGateway;
use super::error::{ApiErrorResponse, GeminiError};
use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationOptions, Reply};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// `timeout` bounds non-streaming calls and connection setup. Streams
    /// are only bounded at connect time so long replies are not cut off.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key contains invalid header characters or
    /// the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, GeminiError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret()).map_err(|_| {
            GeminiError::Unauthorized("API key contains invalid header characters".to_string())
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                base_url: config.base_url.clone(),
                model: config.model.clone(),
                timeout,
            }),
        })
    }

    /// Model requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{method}",
            self.inner.base_url, self.inner.model
        )
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return GeminiError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return GeminiError::Unauthorized(format!("HTTP {status}"));
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                // Gemini reports a bad key as 400 INVALID_ARGUMENT
                Ok(api_error) if api_error.error.message.contains("API key") => {
                    GeminiError::Unauthorized(api_error.error.message)
                }
                Ok(api_error) => GeminiError::Api {
                    status: api_error.error.status,
                    message: api_error.error.message,
                },
                Err(_) => GeminiError::Api {
                    status: status.to_string(),
                    message: body.chars().take(200).collect(),
                },
            },
            Err(e) => GeminiError::Http(e),
        }
    }
}

impl AssistantGateway for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.inner.model, max_tokens = options.max_output_tokens))]
    async fn generate(
        &self,
        prompt: String,
        options: GenerationOptions,
    ) -> Result<Reply, GeminiError> {
        let request = GenerateContentRequest::new(prompt, options);

        let response = self
            .inner
            .client
            .post(self.method_url("generateContent"))
            .timeout(self.inner.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))?;

        if parsed.is_blocked() {
            tracing::warn!("Gemini response blocked by safety filters");
        }

        Ok(parsed.into_reply())
    }

    #[instrument(skip(self, prompt), fields(model = %self.inner.model))]
    async fn generate_stream(
        &self,
        prompt: String,
        options: GenerationOptions,
    ) -> Result<BoxStream<'static, Result<String, GeminiError>>, GeminiError> {
        let request = GenerateContentRequest::new(prompt, options);

        let response = self
            .inner
            .client
            .post(format!("{}?alt=sse", self.method_url("streamGenerateContent")))
            .json(&request)
            .send()
            .await?;

        // Check for error responses before streaming
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        Ok(stream! {
            // Bytes, not text: a multi-byte character may straddle two chunks
            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);

                        while let Some(event) = extract_sse_event(&mut buffer) {
                            if let Some(parsed) = parse_sse_event(&event) {
                                yield parsed;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(GeminiError::Stream(e.to_string()));
                        break;
                    }
                }
            }

            // Trailing event without a blank line terminator
            if let Some(parsed) = parse_sse_event(&buffer) {
                yield parsed;
            }
        }
        .boxed())
    }
}

/// Extract a complete SSE event from the buffer.
///
/// Events end with a blank line, written as either `\n\n` or `\r\n\r\n`.
/// Returns `None` and leaves the buffer untouched if no event is complete.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let lf = find(buffer, b"\n\n").map(|idx| (idx, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|idx| (idx, 4));

    let (idx, sep_len) = match (lf, crlf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (a, b) => a.or(b)?,
    };

    let rest = buffer.split_off(idx + sep_len);
    let mut event = std::mem::replace(buffer, rest);
    event.truncate(idx);
    Some(event)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parse an SSE event into the text chunk it carries.
///
/// Returns `None` for events without data or without text (e.g., a final
/// event that only carries usage metadata).
fn parse_sse_event(event: &[u8]) -> Option<Result<String, GeminiError>> {
    let event = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => return Some(Err(GeminiError::Parse(format!("Invalid UTF-8: {e}")))),
    };

    if event.trim().is_empty() {
        return None;
    }

    let data = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");

    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<GenerateContentResponse>(&data) {
        Ok(response) => {
            let text = response.text();
            if text.is_empty() { None } else { Some(Ok(text)) }
        }
        Err(e) => Some(Err(GeminiError::Parse(format!(
            "Failed to parse stream event: {e}"
        )))),
    }
}
