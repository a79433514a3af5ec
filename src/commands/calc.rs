use tracing::info;

use super::send_chunked;
use crate::chat::tutor::tutor;
use crate::error::AssistantError;
use crate::state::Context;

/// Quick examples for people who find typing hard.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum CalcExample {
    #[name = "639 ÷ 3"]
    Divide639By3,
    #[name = "480 ÷ 4"]
    Divide480By4,
    #[name = "125 + 48"]
    Add125And48,
}

impl CalcExample {
    fn expression(self) -> &'static str {
        match self {
            CalcExample::Divide639By3 => "639 dividido por 3",
            CalcExample::Divide480By4 => "480 dividido por 4",
            CalcExample::Add125And48 => "125 mais 48",
        }
    }
}

/// Typed text wins over the example button.
fn pick_expression(expression: Option<String>, example: Option<CalcExample>) -> Option<String> {
    expression
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .or_else(|| example.map(|ex| ex.expression().to_string()))
}

/// Solve an arithmetic problem step by step
#[poise::command(slash_command)]
pub async fn calc(
    ctx: Context<'_>,
    #[description = "Que conta vamos fazer? Ex: 248 dividido por 2"] expression: Option<String>,
    #[description = "Ou escolha um exemplo"] example: Option<CalcExample>,
) -> Result<(), anyhow::Error> {
    let completer = match ctx.data().completer() {
        Ok(c) => c,
        Err(e) => {
            ctx.say(format!(
                "⚠️ Preciso das chaves de acesso para calcular. ({})",
                e
            ))
            .await?;
            return Ok(());
        }
    };

    let Some(expression) = pick_expression(expression, example) else {
        ctx.say("Digite uma conta primeiro.").await?;
        return Ok(());
    };

    ctx.defer().await?;

    let decoding = ctx.data().chat_config.read().await.decoding;
    info!(user = ctx.author().name, expression, "Tutor request");

    let reply = match tutor(completer, &expression, decoding).await {
        Ok(explanation) => format!("➗ **{}**\n\n{}", expression, explanation),
        Err(AssistantError::EmptyInput) => "Digite uma conta primeiro.".to_string(),
        Err(e) => format!("⚠️ Erro ao calcular: {}", e),
    };

    send_chunked(&ctx, &reply).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_expression_wins() {
        assert_eq!(
            pick_expression(Some(" 248 dividido por 2 ".to_string()), Some(CalcExample::Add125And48)),
            Some("248 dividido por 2".to_string())
        );
    }

    #[test]
    fn test_example_used_when_blank() {
        assert_eq!(
            pick_expression(Some("  ".to_string()), Some(CalcExample::Divide639By3)),
            Some("639 dividido por 3".to_string())
        );
        assert_eq!(pick_expression(None, None), None);
    }
}
