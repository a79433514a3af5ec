use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chat::{ChatConfig, SessionRegistry};
use crate::docs::KnowledgeCache;
use crate::error::AssistantError;
use crate::llm::LlmClient;

pub struct AppState {
    pub knowledge: Arc<KnowledgeCache>,
    /// Holds the configuration error instead when credentials are missing.
    pub llm: Result<Arc<LlmClient>, AssistantError>,
    pub sessions: Arc<SessionRegistry>,
    pub admin_ids: HashSet<u64>,
    pub chat_config: Arc<RwLock<ChatConfig>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    pub fn completer(&self) -> Result<&LlmClient, AssistantError> {
        self.llm.as_deref().map_err(|e| e.clone())
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
