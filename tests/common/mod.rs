#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{ to_bytes, Body };
use axum::http::{ Request, StatusCode };
use axum::Router;
use serde_json::Value;
use std::sync::Mutex;
use tower::ServiceExt;

use primex_backend::llm::chat::{ ChatClient, ChatStream };
use primex_backend::llm::{ CompletionRequest, CompletionResponse, LlmError, ModelTag };

/// Scripted stand-in for the inference engine that records every call.
#[derive(Default)]
pub struct FakeClient {
    pub calls: Mutex<Vec<CompletionRequest>>,
    pub down: bool,
    pub failing_models: Vec<String>,
    pub fragments: Vec<String>,
    pub stream_error: Option<String>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            fragments: vec!["Hel".to_string(), "lo".to_string()],
            ..Default::default()
        }
    }

    pub fn down() -> Self {
        Self { down: true, ..Self::new() }
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, request: &CompletionRequest) -> Result<(), LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.down {
            return Err(LlmError::Upstream("connection refused".to_string()));
        }
        if self.failing_models.contains(&request.model) {
            return Err(LlmError::Status {
                status: 404,
                message: format!("model '{}' not found", request.model),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.record(&request)?;
        let last = request.messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(CompletionResponse {
            content: format!("echo: {}", last),
            model: request.model,
        })
    }

    async fn chat_stream(&self, request: CompletionRequest) -> Result<ChatStream, LlmError> {
        self.record(&request)?;
        let mut items: Vec<Result<String, LlmError>> = self.fragments
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        if let Some(message) = &self.stream_error {
            items.push(Err(LlmError::Upstream(message.clone())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn list_models(&self) -> Result<Vec<ModelTag>, LlmError> {
        if self.down {
            return Err(LlmError::Upstream("connection refused".to_string()));
        }
        let tag = |name: &str, size: u64| {
            let mut extra = serde_json::Map::new();
            extra.insert("size".to_string(), Value::from(size));
            ModelTag { name: name.to_string(), extra }
        };
        Ok(vec![tag("llama3.2:1b", 1_300_000_000), tag("qwen2.5:7b", 4_700_000_000)])
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Vec<u8>) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_for_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let (status, body) = post_json(app, uri, payload).await;
    (status, serde_json::from_slice(&body).unwrap())
}
