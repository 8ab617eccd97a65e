//! Shopping assistant route handlers.
//!
//! The transcript is kept in the visitor's session. Streaming replies are
//! sent as server-sent events, one `message` event per chunk followed by a
//! final `done` event.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use shopease_core::{ChatMessage, ChatTranscript};
use tower_sessions::Session;
use tracing::{debug, instrument, warn};

use crate::error::{AppError, Result};
use crate::services::assistant::{self, Sentiment, ShoppingAssistant};
use crate::services::catalog::fetch_all;
use crate::services::chat::ChatSession;
use crate::state::AppState;
use crate::storage::{StorageError, keys};

/// Chat message request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Include a catalog summary in the prompt.
    #[serde(default)]
    pub with_catalog: bool,
}

/// Recommendation request.
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
}

/// Sentiment request.
#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub message: String,
}

/// Chat reply with the updated transcript.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub sentiment: Sentiment,
}

async fn load_transcript(session: &Session) -> Result<ChatTranscript> {
    let transcript = session
        .get::<ChatTranscript>(keys::CHAT)
        .await
        .map_err(|e| StorageError::Session(e.to_string()))?;
    Ok(transcript.unwrap_or_else(ChatTranscript::with_greeting))
}

async fn save_transcript(
    session: &Session,
    transcript: &ChatTranscript,
) -> std::result::Result<(), StorageError> {
    session
        .insert(keys::CHAT, transcript)
        .await
        .map_err(|e| StorageError::Session(e.to_string()))
}

/// Catalog summary for the prompt, or nothing when not requested or the
/// catalog cannot be loaded.
async fn product_context(state: &AppState, with_catalog: bool) -> String {
    if !with_catalog {
        return String::new();
    }
    match fetch_all(state.storefront()).await {
        Ok(entries) => assistant::product_context(&entries),
        Err(e) => {
            warn!(error = %e, "Catalog unavailable for chat context");
            String::new()
        }
    }
}

fn require_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }
    Ok(())
}

/// Current transcript.
#[instrument(skip_all)]
pub async fn transcript(session: Session) -> Result<Json<Vec<ChatMessage>>> {
    let transcript = load_transcript(&session).await?;
    Ok(Json(transcript.messages().to_vec()))
}

/// Send a message and wait for the full reply.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    require_message(&request.message)?;

    let context = product_context(&state, request.with_catalog).await;
    let transcript = load_transcript(&session).await?;
    let mut chat = ChatSession::with_transcript(state.gemini().clone(), transcript);

    let reply = chat
        .submit(&request.message, &context)
        .await
        .ok_or_else(|| AppError::BadRequest("message must not be empty".to_string()))?;

    save_transcript(&session, chat.transcript()).await?;

    Ok(Json(ChatResponse {
        reply,
        messages: chat.transcript().messages().to_vec(),
    }))
}

/// Send a message and stream the reply as server-sent events.
///
/// The reply is produced by a background task so the transcript is saved
/// even if the client disconnects mid-stream. The task takes the session
/// lock and reloads the record before saving so it keeps cart changes made
/// while the reply was streaming.
#[instrument(skip_all)]
pub async fn stream(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    require_message(&request.message)?;

    let context = product_context(&state, request.with_catalog).await;
    let transcript = load_transcript(&session).await?;

    // Save up front so a new visitor gets a session id before the response
    // headers go out
    save_transcript(&session, &transcript).await?;
    session
        .save()
        .await
        .map_err(|e| StorageError::Session(e.to_string()))?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let mut chat = ChatSession::with_transcript(state.gemini().clone(), transcript);
        chat.submit_streaming(&request.message, &context, |chunk| {
            if tx.send(chunk.to_string()).is_err() {
                debug!("Chat stream client disconnected");
            }
        })
        .await;

        // Other requests may have saved the session while the reply streamed
        let _guard = match session.id() {
            Some(id) => Some(state.session_locks().acquire(&id.to_string()).await),
            None => None,
        };
        if let Err(e) = session.load().await {
            warn!(error = %e, "Failed to reload session after chat stream");
            return;
        }
        if let Err(e) = save_transcript(&session, chat.transcript()).await {
            warn!(error = %e, "Failed to store chat transcript");
            return;
        }
        if let Err(e) = session.save().await {
            warn!(error = %e, "Failed to save session after chat stream");
        }
    });

    let events = stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok(Event::default().data(chunk));
        }
        yield Ok(Event::default().event("done").data(""));
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Recommend products for a free-text need.
#[instrument(skip_all)]
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>> {
    let entries = fetch_all(state.storefront()).await?;
    let assistant = ShoppingAssistant::new(state.gemini().clone());

    Ok(Json(RecommendResponse {
        recommendation: assistant.recommend(&entries, &request.query).await,
    }))
}

/// Classify the tone of a message.
#[instrument(skip_all)]
pub async fn sentiment(
    State(state): State<AppState>,
    Json(request): Json<SentimentRequest>,
) -> Result<Json<SentimentResponse>> {
    require_message(&request.message)?;
    let assistant = ShoppingAssistant::new(state.gemini().clone());

    Ok(Json(SentimentResponse {
        sentiment: assistant.sentiment(&request.message).await,
    }))
}
