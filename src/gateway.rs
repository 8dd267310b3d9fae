//! Chat gateway: forwards single-turn and streamed chats to the inference
//! engine and reshapes the replies.

use log::{ info, error };
use std::sync::Arc;

use crate::error::ServiceError;
use crate::llm::chat::{ ChatClient, ChatStream };
use crate::llm::{ ChatMessage, CompletionRequest };
use crate::models::chat::{ ChatRequest, ChatResponse, HealthResponse, ModelsResponse };

pub const DEFAULT_CHAT_MODEL: &str = "llama3.2:1b";

pub struct ChatGateway {
    client: Arc<dyn ChatClient>,
    default_model: String,
}

impl ChatGateway {
    pub fn new(client: Arc<dyn ChatClient>, default_model: impl Into<String>) -> Self {
        Self { client, default_model: default_model.into() }
    }

    /// History first, then the new user turn.
    pub fn build_completion(&self, request: ChatRequest) -> CompletionRequest {
        let model = request.model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_model.clone());

        let mut messages = request.conversation_history;
        messages.push(ChatMessage::user(request.message));

        CompletionRequest { model, messages, options: None }
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ServiceError> {
        let completion = self.build_completion(request);
        info!(
            "Dispatching chat: model={}, messages={}",
            completion.model,
            completion.messages.len()
        );

        let reply = self.client
            .chat(completion).await
            .map_err(ServiceError::upstream("Error processing chat"))
            .inspect_err(|e| error!("{}", e))?;

        Ok(ChatResponse { response: reply.content, model: reply.model })
    }

    pub async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, ServiceError> {
        let completion = self.build_completion(request);
        info!(
            "Dispatching streamed chat: model={}, messages={}",
            completion.model,
            completion.messages.len()
        );

        self.client
            .chat_stream(completion).await
            .map_err(ServiceError::upstream("Error in streaming"))
            .inspect_err(|e| error!("{}", e))
    }

    pub async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let models = self.client
            .list_models().await
            .map_err(ServiceError::upstream("Ollama not available"))
            .inspect_err(|e| error!("{}", e))?;

        Ok(HealthResponse {
            status: "online".to_string(),
            available_models: models.into_iter().map(|m| m.name).collect(),
        })
    }

    pub async fn list_models(&self) -> Result<ModelsResponse, ServiceError> {
        let models = self.client
            .list_models().await
            .map_err(ServiceError::upstream("Error listing models"))
            .inspect_err(|e| error!("{}", e))?;

        Ok(ModelsResponse { models })
    }
}
