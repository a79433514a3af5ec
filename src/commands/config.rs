use crate::chat::prompts::PromptVariant;
use crate::llm::{DecodingConfig, MAX_TOKENS_RANGE, TEMPERATURE_RANGE};
use crate::state::Context;

/// Configure chat parameters (admin only)
#[poise::command(slash_command)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "verbatim | binary | structured"] variant: Option<String>,
    #[description = "Temperature (0.0 - 0.1)"] temperature: Option<f64>,
    #[description = "Max output tokens (400 - 500)"] max_tokens: Option<u32>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    // Show current config
    if variant.is_none() && temperature.is_none() && max_tokens.is_none() {
        let config = *ctx.data().chat_config.read().await;
        ctx.say(format!(
            "**Chat Configuration:**\n\
             `variant`: {}\n\
             `temperature`: {} (allowed {:?})\n\
             `max_tokens`: {} (allowed {:?})",
            config.variant,
            config.decoding.temperature(),
            TEMPERATURE_RANGE,
            config.decoding.max_tokens(),
            MAX_TOKENS_RANGE
        ))
        .await?;
        return Ok(());
    }

    let mut config = ctx.data().chat_config.write().await;

    let new_variant = match variant.as_deref().map(str::parse::<PromptVariant>) {
        None => config.variant,
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            ctx.say(e).await?;
            return Ok(());
        }
    };

    let new_decoding = match DecodingConfig::new(
        temperature.unwrap_or(config.decoding.temperature()),
        max_tokens.unwrap_or(config.decoding.max_tokens()),
    ) {
        Ok(d) => d,
        Err(e) => {
            ctx.say(format!("Rejected: {}", e)).await?;
            return Ok(());
        }
    };

    config.variant = new_variant;
    config.decoding = new_decoding;
    tracing::info!(
        user_id,
        variant = %new_variant,
        temperature = new_decoding.temperature(),
        max_tokens = new_decoding.max_tokens(),
        "Chat config updated"
    );
    ctx.say(format!(
        "Updated: `variant` = {}, `temperature` = {}, `max_tokens` = {}",
        new_variant,
        new_decoding.temperature(),
        new_decoding.max_tokens()
    ))
    .await?;

    Ok(())
}
