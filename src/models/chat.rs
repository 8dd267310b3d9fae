use serde::{ Serialize, Deserialize };

use crate::llm::{ ChatMessage, ModelTag };

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub available_models: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelTag>,
}
