//! Shopping assistant commands.

use std::io::Write;

use shopease_core::GREETING;
use shopease_storefront::gemini::GeminiClient;
use shopease_storefront::services::assistant::{ShoppingAssistant, product_context};
use shopease_storefront::services::catalog::fetch_all;
use shopease_storefront::services::chat::ChatSession;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CliError, Context};

async fn catalog_context(ctx: &Context, with_catalog: bool) -> Result<String, CliError> {
    if !with_catalog {
        return Ok(String::new());
    }
    let entries = fetch_all(ctx.storefront()).await?;
    Ok(product_context(&entries))
}

async fn answer(
    chat: &mut ChatSession<GeminiClient>,
    message: &str,
    context: &str,
    stream: bool,
) -> Result<(), CliError> {
    if stream {
        chat.submit_streaming(message, context, |chunk| {
            let mut out = std::io::stdout().lock();
            // A closed stdout only loses the echo; the transcript still fills
            if out.write_all(chunk.as_bytes()).and_then(|()| out.flush()).is_err() {
                tracing::debug!("stdout closed during stream");
            }
        })
        .await;
        writeln!(std::io::stdout().lock())?;
    } else if let Some(reply) = chat.submit(message, context).await {
        writeln!(std::io::stdout().lock(), "{reply}")?;
    }
    Ok(())
}

/// Ask one question, or run an interactive session when `message` is `None`.
///
/// # Errors
///
/// Returns an error if the catalog context cannot be loaded or output fails.
pub async fn chat(
    ctx: &Context,
    message: Option<String>,
    stream: bool,
    with_catalog: bool,
) -> Result<(), CliError> {
    let context = catalog_context(ctx, with_catalog).await?;
    let mut chat = ChatSession::new(ctx.gemini().clone());

    if let Some(message) = message {
        return answer(&mut chat, &message, &context, stream).await;
    }

    writeln!(std::io::stdout().lock(), "{GREETING}\n(empty line or Ctrl+D to quit)")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        {
            let mut out = std::io::stdout().lock();
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }
        answer(&mut chat, &line, &context, stream).await?;
    }
    Ok(())
}

/// Print recommendations for `query`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or output fails.
pub async fn recommend(ctx: &Context, query: &str) -> Result<(), CliError> {
    let entries = fetch_all(ctx.storefront()).await?;
    let assistant = ShoppingAssistant::new(ctx.gemini().clone());

    let mut out = std::io::stdout().lock();
    match assistant.recommend(&entries, query).await {
        Some(text) => writeln!(out, "{text}")?,
        None => writeln!(out, "No recommendations right now. Try describing what you need.")?,
    }
    Ok(())
}

/// Print the sentiment of `message`.
///
/// # Errors
///
/// Returns an error if output fails.
pub async fn sentiment(ctx: &Context, message: &str) -> Result<(), CliError> {
    let assistant = ShoppingAssistant::new(ctx.gemini().clone());
    let sentiment = assistant.sentiment(message).await;
    writeln!(std::io::stdout().lock(), "{}", sentiment.as_str())?;
    Ok(())
}
