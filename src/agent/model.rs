//! Chat model abstraction used by the agent.

use crate::config::LlmSettings;
use crate::error::{ConciergeError, Result};
use crate::openai::create_client;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// A message in the prompt sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptMessage {
    System(String),
    User(String),
    Assistant(String),
}

/// A tool the model may call, described by a JSON schema.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

/// A tool call as requested by the model, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedToolCall {
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

impl From<&ChatCompletionMessageToolCall> for RequestedToolCall {
    fn from(call: &ChatCompletionMessageToolCall) -> Self {
        Self {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        }
    }
}

/// The model's reply: text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<RequestedToolCall>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            content: None,
            tool_calls: vec![RequestedToolCall {
                name: name.into(),
                arguments: arguments.into(),
            }],
        }
    }
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and return the model's reply. When `tools` is
    /// empty the model is expected to answer in text.
    async fn chat(&self, messages: &[PromptMessage], tools: &[ToolSpec]) -> Result<ModelReply>;
}

/// Chat model backed by an OpenAI-compatible API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAIChatModel {
    /// Create a model client from the LLM settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: settings.timeout(),
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn to_request_message(message: &PromptMessage) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message {
            PromptMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| ConciergeError::Agent(e.to_string()))?
                .into(),
            PromptMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| ConciergeError::Agent(e.to_string()))?
                .into(),
            PromptMessage::Assistant(content) => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(|e| ConciergeError::Agent(e.to_string()))?
                .into(),
        };
        Ok(built)
    }

    fn to_tool(spec: &ToolSpec) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: spec.name.to_string(),
                description: Some(spec.description.to_string()),
                parameters: Some(spec.parameters.clone()),
                strict: None,
            },
        }
    }

    fn map_error(&self, error: OpenAIError) -> ConciergeError {
        match error {
            OpenAIError::Reqwest(e) if e.is_timeout() => ConciergeError::Timeout(self.timeout),
            other => ConciergeError::Llm(other.to_string()),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip_all, fields(model = %self.model, tools = tools.len()))]
    async fn chat(&self, messages: &[PromptMessage], tools: &[ToolSpec]) -> Result<ModelReply> {
        let messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            request.tools(tools.iter().map(Self::to_tool).collect::<Vec<_>>());
        }
        let request = request
            .build()
            .map_err(|e| ConciergeError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| self.map_error(e))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ConciergeError::Llm("No response from model".to_string()))?;

        let tool_calls: Vec<RequestedToolCall> = choice
            .message
            .tool_calls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(RequestedToolCall::from)
            .collect();

        debug!("Model replied with {} tool call(s)", tool_calls.len());

        Ok(ModelReply {
            content: choice.message.content,
            tool_calls,
        })
    }
}
