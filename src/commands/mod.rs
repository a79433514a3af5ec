mod ask;
mod calc;
mod config;
mod manage;
mod sources;

use crate::chat::SessionKey;
use crate::state::Context;

/// Discord caps messages at 2000 characters.
const CHUNK_LIMIT: usize = 1990;

/// NeuroDiv - school inclusion assistant
#[poise::command(
    slash_command,
    subcommands(
        "ask::ask",
        "manage::history",
        "manage::clear",
        "calc::calc",
        "sources::sources",
        "sources::reload",
        "config::config"
    )
)]
pub async fn neuro(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Conversations are kept per user per channel.
fn session_key(ctx: &Context<'_>) -> SessionKey {
    SessionKey {
        channel_id: ctx.channel_id().get(),
        user_id: ctx.author().id.get(),
    }
}

/// Send a message in Discord-safe chunks.
/// Uses ctx.say() for all chunks so follow-ups go through the interaction
/// webhook.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in split_chunks(text, CHUNK_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Split on newline, then space, never inside a UTF-8 character.
fn split_chunks(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max {
            chunks.push(remaining);
            break;
        }
        let mut end = max;
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = remaining.chars().next().map_or(remaining.len(), |c| c.len_utf8());
        }
        let window = &remaining[..end];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .map(|i| i + 1)
            .unwrap_or(end);
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}
