//! The LLM completion capability (§6): a narrow interface, not a concrete client.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from an `LlmClient` call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API error: {0}")]
    Api(String),

    #[error("LLM response was not valid: {0}")]
    InvalidResponse(String),
}

/// A single completion request. Each call is independent — no conversation
/// state is carried between calls.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub model: Option<String>,
    pub tools: Vec<ToolDefinition>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: String::new(),
            prompt: prompt.into(),
            model: None,
            tools: Vec::new(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// A tool the model may call instead of (or alongside) returning text.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A tool call the model requested.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    pub input: serde_json::Value,
}

/// The result of a completion request (§6).
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub success: bool,
    pub result: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub error: Option<String>,
}

impl CompletionResponse {
    pub fn text(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            tool_calls: Vec::new(),
            error: None,
        }
    }

    pub fn tool_call(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            success: true,
            result: None,
            tool_calls: vec![ToolCall {
                name: name.into(),
                input,
            }],
            error: None,
        }
    }
}

/// `LLM.complete(prompt) -> text` (§1, §6).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Deterministic mock for tests: replays scripted responses in order.
pub struct MockLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<CompletionResponse>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("no more mock responses".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_replays_responses_in_order() {
        let client = MockLlmClient::new(vec![CompletionResponse::text("first"), CompletionResponse::text("second")]);

        let r1 = client.complete(CompletionRequest::new("a")).await.unwrap();
        assert_eq!(r1.result, Some("first".to_string()));

        let r2 = client.complete(CompletionRequest::new("b")).await.unwrap();
        assert_eq!(r2.result, Some("second".to_string()));
    }

    #[tokio::test]
    async fn mock_client_errors_when_exhausted() {
        let client = MockLlmClient::new(vec![]);
        let result = client.complete(CompletionRequest::new("a")).await;
        assert!(result.is_err());
    }
}
