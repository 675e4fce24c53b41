//! OpenAI chat completion backend

use super::{ChatMessage, ChatRole, Completion, CompletionBackend, FunctionCall, FunctionDefinition};
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use openai::chat::{
    ChatCompletion, ChatCompletionFunctionCall, ChatCompletionFunctionDefinition,
    ChatCompletionMessage, ChatCompletionMessageRole,
};
use std::time::Duration;
use tokio::time::timeout;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Credentials come from `OPENAI_KEY`, set by the binary at startup
pub struct OpenAiBackend {
    model: String,
}

impl OpenAiBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }
}

fn to_openai(message: &ChatMessage) -> ChatCompletionMessage {
    let role = match message.role {
        ChatRole::System => ChatCompletionMessageRole::System,
        ChatRole::User => ChatCompletionMessageRole::User,
        ChatRole::Assistant => ChatCompletionMessageRole::Assistant,
        ChatRole::Function => ChatCompletionMessageRole::Function,
    };
    ChatCompletionMessage {
        role,
        content: message.content.clone(),
        name: message.name.clone(),
        function_call: message.function_call.as_ref().map(|call| ChatCompletionFunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        }),
        tool_call_id: None,
        tool_calls: None,
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionDefinition],
    ) -> Result<Completion> {
        let messages: Vec<ChatCompletionMessage> = messages.iter().map(to_openai).collect();
        debug!("Sending {} messages to OpenAI ({} functions)", messages.len(), functions.len());

        let mut request = ChatCompletion::builder(&self.model, messages)
            .max_tokens(500_u64)
            .temperature(0.7_f32);
        if !functions.is_empty() {
            request = request.functions(
                functions
                    .iter()
                    .map(|f| ChatCompletionFunctionDefinition {
                        name: f.name.clone(),
                        description: Some(f.description.clone()),
                        parameters: Some(f.parameters.clone()),
                    })
                    .collect::<Vec<_>>(),
            );
        }

        let completion = timeout(REQUEST_TIMEOUT, request.create())
            .await
            .map_err(|_| anyhow::anyhow!("OpenAI request timed out after 45 seconds"))??;

        let Some(choice) = completion.choices.first() else {
            return Ok(Completion::Text(String::new()));
        };

        if let Some(call) = &choice.message.function_call {
            return Ok(Completion::FunctionCall(FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            }));
        }

        let text = choice
            .message
            .content
            .clone()
            .unwrap_or_default()
            .trim()
            .to_string();
        debug!("Got response: {} chars", text.len());
        Ok(Completion::Text(text))
    }
}
