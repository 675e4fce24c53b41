use anyhow::Result;
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use kazbot::core::{Config, InboundMessage, SenderContext};
use kazbot::features::ai::{FunctionCallingClient, FunctionRegistry, ListIntegrations, OpenAiBackend};
use kazbot::features::modules::{ModuleCatalog, ModuleExecutor, ModuleRegistry};
use kazbot::storage::open_store;
use kazbot::Bot;

const EVICTION_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from the environment
    std::env::set_var("OPENAI_API_KEY", &config.openai_api_key);
    std::env::set_var("OPENAI_KEY", &config.openai_api_key);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting KazBot console transport...");

    let store = open_store(&config).await?;
    info!("💾 Storage backend: {:?}", config.storage_backend);

    let modules = Arc::new(ModuleRegistry::new(
        ModuleCatalog::new(&config.services_dir, config.module_docs_url.clone()),
        ModuleExecutor::new(config.module_allowed_commands.clone()),
    ));
    match modules.known_names() {
        Ok(names) => info!("🧩 {} integration modules in {}", names.len(), config.services_dir),
        Err(e) => warn!("⚠️ Could not list integration modules: {e:#}"),
    }

    let mut functions = FunctionRegistry::new();
    functions.register(Arc::new(ListIntegrations::new(Arc::clone(&modules))));
    let ai = FunctionCallingClient::new(
        OpenAiBackend::new(config.openai_model.clone()),
        functions,
        config.ai_max_function_rounds,
    );

    let config = Arc::new(config);
    let bot = Arc::new(Bot::new(Arc::clone(&config), store, modules, Arc::new(ai)));

    // Periodic session-state eviction
    let eviction_bot = Arc::clone(&bot);
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(EVICTION_INTERVAL_SECS));
        loop {
            interval.tick().await;
            eviction_bot.evict_idle_sessions();
        }
    });

    let session_id = Uuid::new_v4().to_string();
    let sender = SenderContext {
        user_id: Some("console".to_string()),
        service_url: None,
        channel_id: Some("emulator".to_string()),
    };

    let mut stdout = tokio::io::stdout();
    for text in bot.welcome(&session_id).await? {
        stdout.write_all(format!("{text}\n\n").as_bytes()).await?;
    }
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        // Console stand-in for the HTTP download route
        if let Some(name) = text.strip_prefix("/download ") {
            let output = match bot.context().exporter.download(name.trim()).await? {
                Some(bytes) => String::from_utf8_lossy(&bytes).to_string(),
                None => format!("❌ No exported file named '{}'", name.trim()),
            };
            stdout.write_all(format!("{output}\n\n").as_bytes()).await?;
            stdout.flush().await?;
            continue;
        }

        let reply = bot
            .handle_message(InboundMessage::new(text, session_id.as_str(), sender.clone()))
            .await;
        stdout.write_all(format!("{reply}\n\n").as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("Console session {session_id} ended");
    Ok(())
}
