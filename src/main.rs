mod chat;
mod commands;
mod config;
mod docs;
mod error;
mod llm;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use chat::SessionRegistry;
use config::Settings;
use docs::KnowledgeCache;
use llm::LlmClient;
use state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();
    let settings = Settings::from_env();

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .init();

    for warning in &settings.warnings {
        warn!("{}", warning);
    }

    let token = dotenv::var("DISCORD_TOKEN").context("DISCORD_TOKEN required")?;
    let guild_id = settings.guild_id.map(serenity::GuildId::new);

    // Knowledge base is shared by every session and loaded once up front
    let knowledge = Arc::new(KnowledgeCache::new(&settings.docs_dir));
    let kb = knowledge.get().await?;
    if kb.is_empty() {
        warn!(dir = %settings.docs_dir.display(), "No documents found; questions will be refused");
    }

    // Missing credentials keep the bot up; ask/calc report the error instead
    let llm = settings
        .api
        .as_ref()
        .map_err(|e| e.clone())
        .and_then(LlmClient::new)
        .map(Arc::new);
    match &llm {
        Ok(_) => info!("LLM client initialized"),
        Err(e) => error!("{}", e),
    }

    if !settings.admin_ids.is_empty() {
        info!(count = settings.admin_ids.len(), "Admin users configured");
    }

    // Sweep idle conversations so the registry does not grow forever
    let sessions = Arc::new(SessionRegistry::new());
    {
        let sessions = sessions.clone();
        let max_idle = settings.session_idle;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                tick.tick().await;
                let removed = sessions.evict_idle(max_idle).await;
                if removed > 0 {
                    info!(removed, "Idle sessions evicted");
                }
            }
        });
    }

    let app_state = AppState {
        knowledge,
        llm,
        sessions,
        admin_ids: settings.admin_ids.clone(),
        chat_config: Arc::new(RwLock::new(settings.chat)),
    };

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::neuro()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, gid)
                        .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, &framework.options().commands)
                        .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting NeuroDiv Discord bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
