pub mod prompts;
pub mod render;
pub mod tutor;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::docs::types::KnowledgeBase;
use crate::error::AssistantError;
use crate::llm::{Completer, CompletionRequest, DecodingConfig};
use prompts::PromptVariant;

pub const GREETING: &str = "Em que posso ajudar?";
pub const EMPTY_KB_REPLY: &str = "🚫 ERRO: Sem documentos para ler.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message of the visible transcript.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingUserInput,
    AwaitingAssistantReply,
}

/// Chat parameters shared by every session (admins can change them at runtime).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChatConfig {
    pub variant: PromptVariant,
    pub decoding: DecodingConfig,
}

/// A single user's conversation: append-only turns plus the turn-cycle state.
#[derive(Debug)]
pub struct ChatSession {
    turns: Vec<Turn>,
    state: TurnState,
    last_active: Instant,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::new(Role::Assistant, GREETING)],
            state: TurnState::AwaitingUserInput,
            last_active: Instant::now(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Time since the last submit, reply or reset.
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Append a user turn. Only accepted while awaiting user input.
    pub fn submit(&mut self, input: &str) -> Result<(), AssistantError> {
        if self.state == TurnState::AwaitingAssistantReply {
            return Err(AssistantError::Busy);
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(AssistantError::EmptyInput);
        }
        self.turns.push(Turn::new(Role::User, input));
        self.state = TurnState::AwaitingAssistantReply;
        self.last_active = Instant::now();
        Ok(())
    }

    /// Produce the assistant turn for the pending question.
    ///
    /// Returns `None` when no question is pending. Every failure becomes a
    /// visible assistant turn; the session always ends up awaiting input again.
    /// With an empty knowledge base no remote call is made.
    pub async fn reply<C: Completer>(
        &mut self,
        kb: &KnowledgeBase,
        completer: &C,
        config: &ChatConfig,
    ) -> Option<&Turn> {
        if self.state != TurnState::AwaitingAssistantReply {
            return None;
        }
        Some(self.answer_pending(kb, completer, config).await)
    }

    /// Submit `input` and run the reply in one step.
    pub async fn ask<C: Completer>(
        &mut self,
        input: &str,
        kb: &KnowledgeBase,
        completer: &C,
        config: &ChatConfig,
    ) -> Result<&Turn, AssistantError> {
        self.submit(input)?;
        Ok(self.answer_pending(kb, completer, config).await)
    }

    /// Append the assistant turn for the last user turn and return it.
    async fn answer_pending<C: Completer>(
        &mut self,
        kb: &KnowledgeBase,
        completer: &C,
        config: &ChatConfig,
    ) -> &Turn {
        let question = self
            .turns
            .last()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.clone())
            .unwrap_or_default();

        let content = if kb.is_empty() {
            warn!("Knowledge base empty; refusing to call the model");
            EMPTY_KB_REPLY.to_string()
        } else {
            match answer(kb, &question, completer, config).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(error = %e, "Chat turn failed");
                    format!("⚠️ Erro na conexão: {}", e)
                }
            }
        };

        self.state = TurnState::AwaitingUserInput;
        self.last_active = Instant::now();
        let index = self.turns.len();
        self.turns.push(Turn::new(Role::Assistant, content));
        &self.turns[index]
    }

    /// Back to a lone greeting.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::new(Role::Assistant, GREETING));
        self.state = TurnState::AwaitingUserInput;
        self.last_active = Instant::now();
    }

    /// The last `max_turns` turns as Discord markdown, with a note when older
    /// turns are left out.
    pub fn transcript(&self, max_turns: usize) -> String {
        let skip = self.turns.len().saturating_sub(max_turns);
        let shown = self.turns[skip..]
            .iter()
            .map(|t| {
                let who = match t.role {
                    Role::User => "🙋 **Você**",
                    Role::Assistant => "🧠 **NeuroDiv**",
                };
                format!("{} · {}\n{}", who, t.at.format("%H:%M"), t.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        if skip == 0 {
            shown
        } else {
            format!("-# … {} mensagens anteriores omitidas\n\n{}", skip, shown)
        }
    }
}

async fn answer<C: Completer>(
    kb: &KnowledgeBase,
    question: &str,
    completer: &C,
    config: &ChatConfig,
) -> Result<String, AssistantError> {
    let system = prompts::compose(config.variant, kb.text(), question);
    let request = CompletionRequest {
        system: &system,
        user: question,
        decoding: config.decoding,
        json_output: config.variant.json_output(),
    };

    let raw = completer.complete(&request).await?;
    info!(
        variant = %config.variant,
        response_len = raw.len(),
        "Chat turn complete"
    );

    Ok(match config.variant {
        PromptVariant::Structured => render::render_structured(&raw),
        PromptVariant::Verbatim | PromptVariant::Binary => {
            render::render_plain(&raw, completer.model())
        }
    })
}

/// Identifies a conversation: one per user per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub channel_id: u64,
    pub user_id: u64,
}

/// In-memory sessions, dropped by `evict_idle` once unused for long enough.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionKey, Arc<Mutex<ChatSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `key`, creating it with a greeting if needed.
    pub async fn session(&self, key: SessionKey) -> Arc<Mutex<ChatSession>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&key) {
                return session.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(ChatSession::new())))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for at least `max_idle`. Sessions with a turn in
    /// flight are kept. Returns how many were removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = match session.try_lock() {
                Ok(s) => s.idle_for() < max_idle,
                Err(_) => true,
            };
            keep
        });
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, remaining = sessions.len(), "Evicted idle sessions");
        }
        removed
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Scripted completer: pops one reply per call and records requests.
    pub struct ScriptedCompleter {
        replies: std::sync::Mutex<VecDeque<Result<String, AssistantError>>>,
        calls: AtomicUsize,
        pub last_system: std::sync::Mutex<Option<String>>,
        pub last_json_output: std::sync::Mutex<Option<bool>>,
    }

    impl ScriptedCompleter {
        pub fn new(replies: Vec<Result<String, AssistantError>>) -> Self {
            Self {
                replies: std::sync::Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                last_system: std::sync::Mutex::new(None),
                last_json_output: std::sync::Mutex::new(None),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Completer for ScriptedCompleter {
        async fn complete(
            &self,
            request: &CompletionRequest<'_>,
        ) -> Result<String, AssistantError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_system.lock().unwrap() = Some(request.system.to_string());
            *self.last_json_output.lock().unwrap() = Some(request.json_output);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AssistantError::RemoteCall("no scripted reply".into())))
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }
}
