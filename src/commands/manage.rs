use super::{send_chunked, session_key};
use crate::state::Context;

/// Turns shown by `/neuro history`.
const HISTORY_TURNS: usize = 20;

/// Show the full conversation
#[poise::command(slash_command)]
pub async fn history(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let session = ctx.data().sessions.session(session_key(&ctx)).await;
    let Ok(session) = session.try_lock() else {
        ctx.say("⏳ Ainda estou processando a sua pergunta anterior.")
            .await?;
        return Ok(());
    };
    let transcript = session.transcript(HISTORY_TURNS);
    drop(session);

    send_chunked(&ctx, &transcript).await
}

/// Clear the conversation
#[poise::command(slash_command)]
pub async fn clear(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let session = ctx.data().sessions.session(session_key(&ctx)).await;
    let Ok(mut session) = session.try_lock() else {
        ctx.say("⏳ Aguarde a resposta atual antes de limpar o chat.")
            .await?;
        return Ok(());
    };
    session.reset();
    let greeting = session
        .turns()
        .first()
        .map(|t| t.content.clone())
        .unwrap_or_default();
    drop(session);

    ctx.say(format!("🧹 Chat limpo.\n\n{}", greeting)).await?;
    Ok(())
}
