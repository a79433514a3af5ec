use tracing::info;

use super::{send_chunked, session_key};
use crate::error::AssistantError;
use crate::state::Context;

/// Ask a question about the school documents
#[poise::command(slash_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Ex: Como adaptar prova para TDAH?"] question: String,
) -> Result<(), anyhow::Error> {
    let completer = match ctx.data().completer() {
        Ok(c) => c,
        Err(e) => {
            ctx.say(format!("⚠️ Erro nas chaves: {}", e)).await?;
            return Ok(());
        }
    };

    let session = ctx.data().sessions.session(session_key(&ctx)).await;
    let Ok(mut session) = session.try_lock() else {
        ctx.say("⏳ Ainda estou processando a sua pergunta anterior.")
            .await?;
        return Ok(());
    };

    if question.trim().is_empty() {
        ctx.say("Digite uma pergunta primeiro.").await?;
        return Ok(());
    }

    // Shows the "thinking" indicator while the model runs
    ctx.defer().await?;

    let kb = ctx.data().knowledge.get().await?;
    let config = *ctx.data().chat_config.read().await;

    info!(
        user = ctx.author().name,
        question_len = question.len(),
        variant = %config.variant,
        "Chat turn started"
    );

    let reply = match session.ask(&question, &kb, completer, &config).await {
        Ok(turn) => format!("**Pergunta:** {}\n\n{}", question.trim(), turn.content),
        Err(AssistantError::Busy) => {
            "⏳ Ainda estou processando a sua pergunta anterior.".to_string()
        }
        Err(e) => format!("⚠️ {}", e),
    };
    drop(session);

    send_chunked(&ctx, &reply).await
}
