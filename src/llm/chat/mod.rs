pub mod ollama;

use async_trait::async_trait;
use futures::{ Future, Stream };
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ CompletionRequest, CompletionResponse, LlmConfig, LlmError, ModelTag };
use self::ollama::OllamaClient;

/// Lazy, finite, single-consumption sequence of content fragments. Dropping
/// it stops the upstream read.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Starts a streamed chat. Failures that happen before the first chunk
    /// (connection, unknown model) are returned here; later failures arrive
    /// as an `Err` item, which is always the last item of the stream.
    async fn chat_stream(&self, request: CompletionRequest) -> Result<ChatStream, LlmError>;

    async fn list_models(&self) -> Result<Vec<ModelTag>, LlmError>;
}

pub fn create_streaming_response<F, Fut>(response_fn: F) -> ChatStream
    where
        F: FnOnce(mpsc::Sender<Result<String, LlmError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OllamaClient::from_config(config)?;
    Ok(Arc::new(client))
}
