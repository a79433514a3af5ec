use tracing::info;

use super::prompts::{tutor_user_message, TUTOR_SYSTEM_PROMPT};
use crate::error::AssistantError;
use crate::llm::{Completer, CompletionRequest, DecodingConfig};

/// Explain one arithmetic expression step by step with the decomposition
/// method. Stateless: nothing is remembered between calls.
pub async fn tutor<C: Completer>(
    completer: &C,
    expression: &str,
    decoding: DecodingConfig,
) -> Result<String, AssistantError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(AssistantError::EmptyInput);
    }

    let user = tutor_user_message(expression);
    let request = CompletionRequest {
        system: TUTOR_SYSTEM_PROMPT,
        user: &user,
        decoding,
        json_output: false,
    };
    let explanation = completer.complete(&request).await?;
    info!(
        expression_len = expression.len(),
        explanation_len = explanation.len(),
        "Tutor explanation generated"
    );
    Ok(explanation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::ScriptedCompleter;

    #[tokio::test]
    async fn test_tutor_returns_explanation() {
        let completer = ScriptedCompleter::new(vec![Ok(
            "• Eu tenho **600**, **30** e **9**\n**Resultado:** 213".to_string(),
        )]);
        let out = tutor(&completer, "639 dividido por 3", DecodingConfig::default())
            .await
            .unwrap();
        assert!(out.contains("**Resultado:** 213"));
        assert_eq!(completer.calls(), 1);
        let system = completer.last_system.lock().unwrap().clone().unwrap();
        assert_eq!(system, TUTOR_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_blank_expression_skips_call() {
        let completer = ScriptedCompleter::new(vec![]);
        let err = tutor(&completer, "  ", DecodingConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, AssistantError::EmptyInput);
        assert_eq!(completer.calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_is_returned() {
        let completer = ScriptedCompleter::new(vec![Err(AssistantError::RemoteCall(
            "timeout".to_string(),
        ))]);
        let err = tutor(&completer, "125 mais 48", DecodingConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::RemoteCall(_)));
    }
}
