use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use kazbot::core::help::APOLOGY_MESSAGE;
use kazbot::features::ai::{AiClient, ChatMessage};
use kazbot::features::modules::{Capabilities, IntegrationModule, ModuleCatalog, ModuleExecutor, ModuleRegistry};
use kazbot::storage::MemoryBlobStore;
use kazbot::{Bot, Config, InboundMessage, Sender, SenderContext};

#[derive(Default)]
struct EchoAi {
    failing: AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl AiClient for EchoAi {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("upstream timeout");
        }
        let context = if messages.len() > 1 { "with data" } else { "plain" };
        Ok(format!("answer ({context})"))
    }
}

struct Weather;

#[async_trait]
impl IntegrationModule for Weather {
    fn name(&self) -> &str {
        "Weather"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            init: true,
            close: true,
            run: true,
            ..Capabilities::none()
        }
    }

    fn topics(&self) -> Vec<String> {
        vec!["forecast".to_string()]
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn run(&self, _query: &str) -> Result<Value> {
        Ok(json!({ "city": "Oslo", "temp": 4 }))
    }
}

fn bot() -> (Bot, Arc<EchoAi>) {
    bot_with_services(Path::new("./no-such-services-dir"))
}

fn bot_with_services(services: &Path) -> (Bot, Arc<EchoAi>) {
    let ai = Arc::new(EchoAi::default());
    let modules = Arc::new(ModuleRegistry::new(
        ModuleCatalog::new(services, "https://docs.example.com"),
        ModuleExecutor::new(vec!["sh".to_string()]),
    ));
    modules.register(Arc::new(Weather));
    let bot = Bot::new(
        Arc::new(Config::default()),
        Arc::new(MemoryBlobStore::new()),
        modules,
        Arc::clone(&ai) as Arc<dyn AiClient>,
    );
    (bot, ai)
}

async fn say(bot: &Bot, session: &str, text: &str) -> String {
    let sender = SenderContext {
        user_id: Some("tester".to_string()),
        service_url: None,
        channel_id: Some("emulator".to_string()),
    };
    bot.handle_message(InboundMessage::new(text, session, sender)).await
}

#[tokio::test]
async fn counters_increment_once_per_message() {
    let (bot, _ai) = bot();
    for text in [
        "list memory",
        "show last 2 prompts",
        "show last nope",
        "kazbot help!",
        "!kazbot unknownthing",
        "what's the capital of Norway?",
    ] {
        say(&bot, "s1", text).await;
    }

    let analytics = bot.context().usage.load("s1").await.unwrap();
    assert_eq!(analytics.prompts, 6);
    assert_eq!(analytics.answers, 6);

    let reply = say(&bot, "s1", "show analytics").await;
    assert!(reply.contains("- User prompts: 7"));
    assert!(reply.contains("- Bot answers: 6"));
}

#[tokio::test]
async fn module_session_flow() {
    let (bot, ai) = bot();

    assert_eq!(say(&bot, "s1", "before any module").await, "answer (plain)");
    assert!(say(&bot, "s1", "!kazbot init weather").await.contains("Weather"));
    assert_eq!(say(&bot, "s1", "forecast for today?").await, "answer (with data)");
    assert_eq!(say(&bot, "s1", "tell me a joke").await, "answer (plain)");
    say(&bot, "s1", "!kazbot close weather").await;
    assert_eq!(ai.calls.load(Ordering::SeqCst), 3);

    let windows = bot.context().lifecycle.sessions().windows("s1");
    assert_eq!(windows.len(), 1);
    assert!(windows[0].closed_at.is_some());

    let reply = say(&bot, "s1", "!kazbot show session analytics").await;
    assert!(reply.contains("1. Weather"));
    assert!(reply.contains("   - User prompts: 3"));

    let link = say(&bot, "s1", "!kazbot export session prompts").await;
    assert!(link.starts_with("📎 Download link: http://localhost:3978/download/tester_s1_"));
    let name = link.rsplit('/').next().unwrap();
    let body = bot.context().exporter.download(name).await.unwrap().unwrap();
    let body = String::from_utf8(body).unwrap();
    assert!(body.contains("- forecast for today?\n- tell me a joke"));
    assert!(!body.contains("before any module"));
}

#[tokio::test]
async fn collaborator_failure_becomes_apology() {
    let (bot, ai) = bot();
    ai.failing.store(true, Ordering::SeqCst);

    assert_eq!(say(&bot, "s1", "hello?").await, APOLOGY_MESSAGE);

    let log = bot.context().log.list("s1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].from, Sender::Bot);
    assert_eq!(log[1].text, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn clear_prompts_keeps_bot_messages() {
    let (bot, _ai) = bot();
    say(&bot, "s1", "first").await;
    say(&bot, "s1", "second").await;
    say(&bot, "s1", "clear prompts").await;
    say(&bot, "s1", "clear prompts").await;

    let log = bot.context().log.list("s1").await.unwrap();
    assert!(log.iter().all(|m| m.from == Sender::Bot));
    assert_eq!(log[0].text, "answer (plain)");
}

#[tokio::test]
async fn sessions_are_independent() {
    let (bot, _ai) = bot();
    say(&bot, "a", "!kazbot init weather").await;
    say(&bot, "b", "!kazbot init weather").await;
    say(&bot, "a", "!kazbot close weather").await;

    let sessions = bot.context().lifecycle.sessions();
    assert_eq!(sessions.active_module("a"), None);
    assert_eq!(sessions.active_module("b").as_deref(), Some("Weather"));
}

const FORECAST_MANIFEST: &str = r#"
name: Forecast Service
topics: [forecast]
commands:
  run:
    command: sh
    args: ["-c", "echo '{\"city\": \"Oslo\", \"temp\": 4}'"]
  close:
    command: sh
    args: ["-c", "touch closed.flag"]
"#;

#[tokio::test]
async fn folder_module_lifecycle_and_fallback() {
    let services = tempfile::tempdir().unwrap();
    let folder = services.path().join("Forecast");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("module.yaml"), FORECAST_MANIFEST).unwrap();
    fs::write(folder.join("info.md"), "Forecasts from a script").unwrap();

    let (bot, ai) = bot_with_services(services.path());

    let reply = say(&bot, "s1", "!kazbot init forecast").await;
    assert_eq!(reply, "✅ Module 'Forecast Service' initialized.");
    let active = bot.context().lifecycle.active_module("s1").unwrap().unwrap();
    assert_eq!(active.name(), "Forecast Service");

    assert_eq!(say(&bot, "s1", "forecast for tomorrow?").await, "answer (with data)");
    assert_eq!(ai.calls.load(Ordering::SeqCst), 1);

    // Switching runs the folder module's close command
    say(&bot, "s1", "!kazbot init weather").await;
    assert!(folder.join("closed.flag").exists());

    let windows = bot.context().lifecycle.sessions().windows("s1");
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].module_name, "Forecast Service");
    assert!(windows[0].closed_at.is_some());
    assert_eq!(windows[1].module_name, "Weather");
}
