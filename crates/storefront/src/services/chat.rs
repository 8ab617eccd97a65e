//! Chat session over the shopping assistant.

use futures::StreamExt;
use shopease_core::ChatTranscript;
use tracing::{debug, instrument, warn};

use crate::gemini::AssistantGateway;

use super::assistant::{BLOCKED_REPLY, STREAM_FAILURE, ShoppingAssistant, user_message};

/// A transcript plus the assistant that answers it.
///
/// Calls take `&mut self`, so turns on one session never interleave. There is
/// no cancellation: a submit runs until the gateway answers or fails.
pub struct ChatSession<A> {
    assistant: ShoppingAssistant<A>,
    transcript: ChatTranscript,
}

impl<A: AssistantGateway> ChatSession<A> {
    /// New session opened by the assistant greeting.
    pub fn new(gateway: A) -> Self {
        Self::with_transcript(gateway, ChatTranscript::with_greeting())
    }

    /// Continue an existing transcript.
    pub const fn with_transcript(gateway: A, transcript: ChatTranscript) -> Self {
        Self {
            assistant: ShoppingAssistant::new(gateway),
            transcript,
        }
    }

    #[must_use]
    pub const fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    #[must_use]
    pub fn into_transcript(self) -> ChatTranscript {
        self.transcript
    }

    /// Send a user turn and wait for the whole reply.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the reply text,
    /// which may be a user-facing failure message, is appended and returned.
    #[instrument(skip_all)]
    pub async fn submit(&mut self, input: &str, product_context: &str) -> Option<String> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }

        self.transcript.push_user(message);
        let reply = self.assistant.chat_reply(message, product_context).await;
        self.transcript.push_assistant(reply.clone());
        Some(reply)
    }

    /// Send a user turn and stream the reply into the transcript.
    ///
    /// Each chunk is appended to the trailing assistant message and passed to
    /// `on_chunk` in arrival order. Returns the full assistant text, or `None`
    /// for blank input.
    #[instrument(skip_all)]
    pub async fn submit_streaming<F>(
        &mut self,
        input: &str,
        product_context: &str,
        mut on_chunk: F,
    ) -> Option<String>
    where
        F: FnMut(&str) + Send,
    {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }

        self.transcript.push_user(message);
        self.transcript.push_assistant(String::new());

        let mut stream = match self.assistant.chat_stream(message, product_context).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Failed to open chat stream");
                let text = user_message(&e);
                self.append(text, &mut on_chunk);
                return self.last_text();
            }
        };

        let mut received = false;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) => {
                    received = true;
                    self.append(&text, &mut on_chunk);
                }
                Err(e) => {
                    warn!(error = %e, "Chat stream failed");
                    received = true;
                    self.append(STREAM_FAILURE, &mut on_chunk);
                    break;
                }
            }
        }

        if !received {
            debug!("Chat stream ended without text");
            self.append(BLOCKED_REPLY, &mut on_chunk);
        }

        self.last_text()
    }

    fn append<F: FnMut(&str)>(&mut self, text: &str, on_chunk: &mut F) {
        self.transcript.append_to_last_assistant(text);
        on_chunk(text);
    }

    fn last_text(&self) -> Option<String> {
        self.transcript.last().map(|message| message.text.clone())
    }
}
