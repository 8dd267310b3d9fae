use axum::{
    routing::{ get, post },
    Router,
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::cors_layer;
use super::streaming::sse_response;
use crate::error::ServiceError;
use crate::gateway::ChatGateway;
use crate::models::chat::{ ChatRequest, ChatResponse, HealthResponse, ModelsResponse };

pub fn build_router(gateway: Arc<ChatGateway>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/models", get(models_handler))
        .layer(cors_layer())
        .with_state(gateway)
}

async fn health_handler(
    State(gateway): State<Arc<ChatGateway>>
) -> Result<Json<HealthResponse>, ServiceError> {
    gateway.health().await.map(Json)
}

async fn chat_handler(
    State(gateway): State<Arc<ChatGateway>>,
    Json(request): Json<ChatRequest>
) -> Result<Json<ChatResponse>, ServiceError> {
    gateway.chat(request).await.map(Json)
}

async fn chat_stream_handler(
    State(gateway): State<Arc<ChatGateway>>,
    Json(request): Json<ChatRequest>
) -> Result<impl IntoResponse, ServiceError> {
    let fragments = gateway.chat_stream(request).await?;
    Ok(sse_response(fragments))
}

async fn models_handler(
    State(gateway): State<Arc<ChatGateway>>
) -> Result<Json<ModelsResponse>, ServiceError> {
    gateway.list_models().await.map(Json)
}
