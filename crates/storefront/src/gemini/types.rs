//! Types for the Gemini `generateContent` API.

use serde::{Deserialize, Serialize};

/// Harm categories filtered on every chat and recommendation request.
const FILTERED_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Per-call generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Upper bound on reply length.
    pub max_output_tokens: u32,
    /// Whether to send the safety settings.
    pub safety_filters: bool,
}

impl GenerationOptions {
    /// Shopping-assistant chat replies.
    pub const CHAT: Self = Self {
        max_output_tokens: 1024,
        safety_filters: true,
    };

    /// Product recommendations.
    pub const RECOMMENDATION: Self = Self {
        max_output_tokens: 512,
        safety_filters: true,
    };

    /// One-word sentiment classification.
    pub const SENTIMENT: Self = Self {
        max_output_tokens: 50,
        safety_filters: false,
    };
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::CHAT
    }
}

/// Outcome of a non-streaming generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Generated text.
    Text(String),
    /// Blocked by safety filters, or the model returned nothing.
    Blocked,
}

/// Request body for `generateContent` and `streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    /// Single-turn request for `prompt`.
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        let safety_settings = if options.safety_filters {
            FILTERED_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: BLOCK_THRESHOLD.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: options.max_output_tokens,
                ..GenerationConfig::default()
            },
            safety_settings,
        }
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: GenerationOptions::CHAT.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Response body (also the payload of each streamed event).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Whether the prompt or the first candidate was blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        let prompt_blocked = self
            .prompt_feedback
            .as_ref()
            .is_some_and(|f| f.block_reason.is_some());
        let candidate_blocked = self.candidates.first().is_some_and(|c| {
            matches!(
                c.finish_reason.as_deref(),
                Some("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT")
            )
        });
        prompt_blocked || candidate_blocked
    }

    /// Concatenated text of the first candidate. Empty when there is none.
    #[must_use]
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Collapse into a [`Reply`].
    #[must_use]
    pub fn into_reply(self) -> Reply {
        let text = self.text();
        if self.is_blocked() || text.trim().is_empty() {
            Reply::Blocked
        } else {
            Reply::Text(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let request = GenerateContentRequest::new("hello", GenerationOptions::CHAT);
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["safetySettings"].as_array().map(Vec::len), Some(4));
        assert_eq!(
            json["safetySettings"][0]["threshold"],
            "BLOCK_MEDIUM_AND_ABOVE"
        );
    }

    #[test]
    fn test_sentiment_request_has_no_safety_settings() {
        let request = GenerateContentRequest::new("great!", GenerationOptions::SENTIMENT);
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["generationConfig"]["maxOutputTokens"], 50);
        assert!(json.get("safetySettings").is_none());
    }

    #[test]
    fn test_reply_text() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Try the "},{"text":"mug."}]},"finishReason":"STOP"}]}"#,
        )
        .expect("deserialize");
        assert_eq!(response.into_reply(), Reply::Text("Try the mug.".to_string()));
    }

    #[test]
    fn test_reply_blocked_prompt() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
                .expect("deserialize");
        assert_eq!(response.into_reply(), Reply::Blocked);
    }

    #[test]
    fn test_reply_blocked_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
        )
        .expect("deserialize");
        assert!(response.is_blocked());
        assert_eq!(response.into_reply(), Reply::Blocked);
    }

    #[test]
    fn test_reply_empty_is_blocked() {
        assert_eq!(GenerateContentResponse::default().into_reply(), Reply::Blocked);
    }
}
