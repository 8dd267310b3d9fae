//! Clone orchestrator: resolves named personas from the loaded
//! configuration and dispatches queries to them.

use futures::future::join_all;
use log::{ info, warn, error };
use std::sync::Arc;

use crate::config::{ CloneConfig, OrchestratorConfig };
use crate::error::ServiceError;
use crate::llm::chat::{ ChatClient, ChatStream };
use crate::llm::{ ChatMessage, ChatOptions, CompletionRequest };
use crate::models::clone::{
    AccessLevel,
    CloneResponse,
    CloneStreamHeader,
    ErrorRecord,
    InvocationQuery,
    InvocationResult,
    OwnerVerification,
};

pub struct CloneOrchestrator {
    client: Arc<dyn ChatClient>,
    config: Arc<OrchestratorConfig>,
}

/// A resolved query: which clone answers it and with what settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub clone: CloneConfig,
    pub temperature: f64,
    pub request: CompletionRequest,
}

pub fn compose_message(message: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => {
            format!("Context: {}\n\nQuery: {}", context, message)
        }
        _ => message.to_string(),
    }
}

impl CloneOrchestrator {
    pub fn new(client: Arc<dyn ChatClient>, config: Arc<OrchestratorConfig>) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn get_clone(&self, name: &str) -> Result<&CloneConfig, ServiceError> {
        self.config.get(name).ok_or_else(|| ServiceError::CloneNotFound(name.to_string()))
    }

    pub fn resolve(&self, query: &InvocationQuery) -> Result<Dispatch, ServiceError> {
        let clone = self.get_clone(&query.clone)?.clone();
        let temperature = query.temperature.unwrap_or(clone.temperature);
        let content = compose_message(&query.message, query.context.as_deref());

        let request = CompletionRequest {
            model: clone.model.clone(),
            messages: vec![ChatMessage::user(content)],
            options: Some(ChatOptions { temperature: Some(temperature) }),
        };

        Ok(Dispatch { clone, temperature, request })
    }

    pub async fn invoke(&self, query: &InvocationQuery) -> Result<CloneResponse, ServiceError> {
        let dispatch = self.resolve(query).inspect_err(|e| warn!("{}", e))?;
        info!(
            "Invoking clone '{}' with model={}, temperature={}",
            dispatch.clone.name,
            dispatch.request.model,
            dispatch.temperature
        );

        let reply = self.client
            .chat(dispatch.request).await
            .map_err(ServiceError::upstream("Error invoking clone"))
            .inspect_err(|e| error!("{}", e))?;

        Ok(CloneResponse {
            clone: dispatch.clone.name,
            role: dispatch.clone.role,
            response: reply.content,
            model: reply.model,
            temperature: dispatch.temperature,
        })
    }

    pub async fn invoke_stream(
        &self,
        query: &InvocationQuery
    ) -> Result<(CloneStreamHeader, ChatStream), ServiceError> {
        let dispatch = self.resolve(query).inspect_err(|e| warn!("{}", e))?;
        info!(
            "Streaming clone '{}' with model={}, temperature={}",
            dispatch.clone.name,
            dispatch.request.model,
            dispatch.temperature
        );

        let header = CloneStreamHeader {
            clone: dispatch.clone.name,
            role: dispatch.clone.role,
            model: dispatch.request.model.clone(),
            temperature: dispatch.temperature,
        };
        let fragments = self.client
            .chat_stream(dispatch.request).await
            .map_err(ServiceError::upstream("Error invoking clone"))
            .inspect_err(|e| error!("{}", e))?;

        Ok((header, fragments))
    }

    async fn invoke_one(&self, query: &InvocationQuery) -> InvocationResult {
        match self.invoke(query).await {
            Ok(response) => InvocationResult::Success(response),
            Err(e) =>
                InvocationResult::Failure(ErrorRecord {
                    clone: query.clone.clone(),
                    code: e.status_code().as_u16(),
                    error: e.to_string(),
                }),
        }
    }

    /// Runs every query and reports per-item outcomes in input order. One
    /// failing query never stops the rest.
    pub async fn invoke_multi(
        &self,
        queries: &[InvocationQuery],
        concurrent: bool
    ) -> Vec<InvocationResult> {
        info!("Multi-invoke of {} queries (concurrent={})", queries.len(), concurrent);

        let results = if concurrent {
            join_all(queries.iter().map(|q| self.invoke_one(q))).await
        } else {
            let mut results = Vec::with_capacity(queries.len());
            for query in queries {
                results.push(self.invoke_one(query).await);
            }
            results
        };

        let failed = results.iter().filter(|r| r.is_error()).count();
        if failed > 0 {
            warn!("Multi-invoke finished with {} of {} queries failed", failed, results.len());
        }
        results
    }

    /// Plaintext comparison against the loyalty core. A placeholder, not an
    /// authentication mechanism.
    pub fn verify_owner(&self, owner_name: &str, security_key: &str) -> OwnerVerification {
        let loyalty = self.config.loyalty();
        let verified =
            loyalty.owner.as_deref() == Some(owner_name) &&
            loyalty.security_key.as_deref() == Some(security_key);

        if verified {
            info!("Owner verified: {}", owner_name);
            OwnerVerification {
                verified: true,
                owner: Some(owner_name.to_string()),
                access_level: AccessLevel::Sovereign,
            }
        } else {
            warn!("Owner verification failed for '{}'", owner_name);
            OwnerVerification {
                verified: false,
                owner: None,
                access_level: AccessLevel::None,
            }
        }
    }
}
