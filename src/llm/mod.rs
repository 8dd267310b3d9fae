pub mod chat;

use serde::{ Deserialize, Serialize };
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// One call to the inference engine's chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: Option<ChatOptions>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

/// An installed model as reported by the engine. Only `name` is interpreted;
/// everything else is passed through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to inference engine failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("inference engine returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed reply from inference engine: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("inference engine error: {0}")]
    Upstream(String),
    #[error("stream ended before the engine reported completion")]
    Truncated,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}
