use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AssistantError;

pub const NOT_FOUND_NOTICE: &str = "🔍 Não encontrei essa informação nos documentos.";
pub const PARSE_ERROR_NOTICE: &str = "⚠️ Não consegui interpretar a resposta do modelo. Texto recebido:";

/// Structured answer returned by the JSON prompt variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "encontrou")]
    pub found: bool,
    #[serde(rename = "lista_acoes", default)]
    pub actions: Vec<String>,
}

/// Parse a raw completion into an [`ExtractionResult`].
///
/// A surrounding Markdown code fence is tolerated. When `found` is false the
/// action list is always returned empty.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, AssistantError> {
    let body = strip_code_fence(raw.trim());
    let mut result: ExtractionResult = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedOutput(e.to_string()))?;

    if !result.found && !result.actions.is_empty() {
        debug!(
            dropped = result.actions.len(),
            "Model reported not found but listed actions"
        );
        result.actions.clear();
    }
    result.actions.retain(|a| !a.trim().is_empty());
    Ok(result)
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop an optional language tag on the opening line
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Free-text variants: the completion verbatim plus a source footer.
pub fn render_plain(raw: &str, model: &str) -> String {
    format!("{}\n\n{}", raw, source_footer(model))
}

pub fn source_footer(model: &str) -> String {
    format!("-# Gerado por {} | Fonte: Docs Internos", model)
}

/// JSON variant: a list of actions, the not-found notice, or the raw text
/// behind an error notice when parsing fails.
pub fn render_structured(raw: &str) -> String {
    match parse_extraction(raw) {
        Ok(result) if result.found && !result.actions.is_empty() => result
            .actions
            .iter()
            .map(|action| format!("✅ {}", action.trim()))
            .collect::<Vec<_>>()
            .join("\n"),
        Ok(_) => NOT_FOUND_NOTICE.to_string(),
        Err(e) => {
            warn!(error = %e, raw_len = raw.len(), "Falling back to raw completion");
            format!("{}\n{}", PARSE_ERROR_NOTICE, raw)
        }
    }
}
