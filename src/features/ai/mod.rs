//! # Feature: AI Completion
//!
//! Text completion behind the [`AiClient`] trait. [`FunctionCallingClient`]
//! adds the function-call round trip as a bounded loop: send, maybe run one
//! registered function, append its result, send again.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Function calling with a round limit
//! - 1.0.0: Initial release with plain completions

pub mod functions;
pub mod openai_client;

pub use functions::ListIntegrations;
pub use openai_client::OpenAiBackend;

use anyhow::{bail, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments as produced by the model
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: Option<String>,
    /// Function name, for `Function` results
    pub name: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(ChatRole::Assistant, content)
    }

    /// The assistant turn that requested a function call
    pub fn assistant_call(call: FunctionCall) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    pub fn function_result(name: impl Into<String>, result: &Value) -> Self {
        Self {
            role: ChatRole::Function,
            content: Some(result.to_string()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// A function the model may call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// One model turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    FunctionCall(FunctionCall),
}

/// Text in, text out
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// A single request to the completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionDefinition],
    ) -> Result<Completion>;
}

#[async_trait]
pub trait FunctionHandler: Send + Sync {
    fn definition(&self) -> FunctionDefinition;

    async fn call(&self, arguments: Value) -> Result<Value>;
}

#[derive(Default, Clone)]
pub struct FunctionRegistry {
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn FunctionHandler>) {
        self.handlers.insert(handler.definition().name, handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionHandler>> {
        self.handlers.get(name)
    }

    /// Definitions sorted by name
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        let mut definitions: Vec<_> = self.handlers.values().map(|h| h.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// [`AiClient`] that executes function calls requested by the model
pub struct FunctionCallingClient<B> {
    backend: B,
    functions: FunctionRegistry,
    max_rounds: usize,
}

impl<B: CompletionBackend> FunctionCallingClient<B> {
    pub fn new(backend: B, functions: FunctionRegistry, max_rounds: usize) -> Self {
        Self {
            backend,
            functions,
            max_rounds,
        }
    }

    /// Run a requested function. Failures go back to the model as `{"error": ...}`.
    async fn invoke(&self, call: &FunctionCall) -> Value {
        let Some(handler) = self.functions.get(&call.name) else {
            warn!("Model requested unknown function '{}'", call.name);
            return json!({ "error": format!("Unknown function: {}", call.name) });
        };

        let arguments = if call.arguments.trim().is_empty() {
            json!({})
        } else {
            match serde_json::from_str(&call.arguments) {
                Ok(arguments) => arguments,
                Err(e) => return json!({ "error": format!("Invalid arguments: {e}") }),
            }
        };

        match handler.call(arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Function '{}' failed: {e:#}", call.name);
                json!({ "error": e.to_string() })
            }
        }
    }
}

#[async_trait]
impl<B: CompletionBackend> AiClient for FunctionCallingClient<B> {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let definitions = self.functions.definitions();
        let mut conversation = messages.to_vec();
        let mut rounds = 0;

        loop {
            match self.backend.complete(&conversation, &definitions).await? {
                Completion::Text(text) => return Ok(text),
                Completion::FunctionCall(call) => {
                    if rounds >= self.max_rounds {
                        bail!(
                            "Model kept calling functions after {} rounds (last: '{}')",
                            self.max_rounds,
                            call.name
                        );
                    }
                    rounds += 1;
                    debug!("Function call round {rounds}: {}", call.name);

                    let result = self.invoke(&call).await;
                    let name = call.name.clone();
                    conversation.push(ChatMessage::assistant_call(call));
                    conversation.push(ChatMessage::function_result(name, &result));
                }
            }
        }
    }
}

/// System prompt for answering from a module's live data
pub fn module_context_prompt(module_name: &str, payload: &Value) -> String {
    format!(
        "You are an assistant answering questions with live data from the '{module_name}' \
         integration module. Use only the JSON data below. If the answer is not in the data, \
         say that you don't have that information.\n\n{}",
        serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
    )
}
