use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::chat::prompts::PromptVariant;
use crate::chat::ChatConfig;
use crate::error::AssistantError;
use crate::llm::{check_max_tokens, check_temperature, DecodingConfig};

pub const DEFAULT_MODEL: &str = "Phi-4";
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";
pub const DEFAULT_DOCS_DIR: &str = "docs";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 120;

/// Everything needed to reach the completion endpoint.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub model: String,
    pub timeout: Duration,
}

/// Process settings resolved from the environment.
///
/// Missing credentials do not fail construction: they are kept as an error in
/// `api` and reported whenever a command needs the endpoint.
#[derive(Debug, Clone)]
pub struct Settings {
    pub docs_dir: PathBuf,
    pub guild_id: Option<u64>,
    pub admin_ids: HashSet<u64>,
    pub api: Result<ApiSettings, AssistantError>,
    pub chat: ChatConfig,
    /// Conversations untouched for this long are dropped.
    pub session_idle: Duration,
    pub log_level: Level,
    /// Invalid optional values that were replaced by their defaults.
    pub warnings: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut warnings = Vec::new();

        let docs_dir = PathBuf::from(get("DOCS_DIR").unwrap_or_else(|| DEFAULT_DOCS_DIR.to_string()));
        let guild_id = get("DISCORD_GUILD_ID").and_then(|s| s.parse::<u64>().ok());
        let admin_ids: HashSet<u64> = get("ADMIN_USER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let timeout_secs = parse_or_default(
            get("LLM_TIMEOUT_SECS"),
            "LLM_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
            &mut warnings,
        );

        let api = match (get("AZURE_ENDPOINT"), get("AZURE_KEY")) {
            (Some(endpoint), Some(api_key)) => Ok(ApiSettings {
                endpoint,
                api_key,
                api_version: get("AZURE_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                model: get("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs.max(1)),
            }),
            (None, _) => Err(AssistantError::Configuration(
                "AZURE_ENDPOINT is not set".to_string(),
            )),
            (_, None) => Err(AssistantError::Configuration("AZURE_KEY is not set".to_string())),
        };

        let variant = parse_or_default(
            get("PROMPT_VARIANT"),
            "PROMPT_VARIANT",
            PromptVariant::default(),
            &mut warnings,
        );

        // Each bound is checked on its own so one bad value keeps the other
        let defaults = DecodingConfig::default();
        let temperature = parse_or_default(
            get("LLM_TEMPERATURE"),
            "LLM_TEMPERATURE",
            defaults.temperature(),
            &mut warnings,
        );
        let temperature = check_temperature(temperature).unwrap_or_else(|e| {
            warnings.push(e.to_string());
            defaults.temperature()
        });
        let max_tokens = parse_or_default(
            get("LLM_MAX_TOKENS"),
            "LLM_MAX_TOKENS",
            defaults.max_tokens(),
            &mut warnings,
        );
        let max_tokens = check_max_tokens(max_tokens).unwrap_or_else(|e| {
            warnings.push(e.to_string());
            defaults.max_tokens()
        });
        let decoding = DecodingConfig::new(temperature, max_tokens).unwrap_or(defaults);

        let idle_minutes = parse_or_default(
            get("SESSION_IDLE_MINUTES"),
            "SESSION_IDLE_MINUTES",
            DEFAULT_SESSION_IDLE_MINUTES,
            &mut warnings,
        );

        let log_level = parse_or_default(get("LOG_LEVEL"), "LOG_LEVEL", Level::INFO, &mut warnings);

        Self {
            docs_dir,
            guild_id,
            admin_ids,
            api,
            chat: ChatConfig { variant, decoding },
            session_idle: Duration::from_secs(idle_minutes.max(1) * 60),
            log_level,
            warnings,
        }
    }
}

fn parse_or_default<T: FromStr>(
    raw: Option<String>,
    key: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warnings.push(format!("{} has invalid value '{}', using default", key, raw));
            default
        }),
    }
}
