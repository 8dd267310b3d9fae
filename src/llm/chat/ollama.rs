use reqwest::{ Client as HttpClient, Response };
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use log::debug;

use super::{ create_streaming_response, ChatClient, ChatStream };
use crate::llm::{
    ChatMessage,
    ChatOptions,
    CompletionRequest,
    CompletionResponse,
    LlmConfig,
    LlmError,
    ModelTag,
    DEFAULT_OLLAMA_URL,
};

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a ChatOptions>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<ReplyMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

enum LineOutcome {
    Continue,
    Finished,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, LlmError> {
        let url = base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.into());
        let mut builder = HttpClient::builder();
        // idle limit, not a cap on total generation time
        if let Some(timeout) = timeout {
            builder = builder.connect_timeout(timeout).read_timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn check_status(response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json
            ::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(LlmError::Status { status: status.as_u16(), message })
    }

    async fn send_chat(
        &self,
        request: &CompletionRequest,
        stream: bool
    ) -> Result<Response, LlmError> {
        let payload = ChatPayload {
            model: &request.model,
            messages: &request.messages,
            stream,
            options: request.options.as_ref(),
        };
        let response = self.http.post(self.endpoint("/api/chat")).json(&payload).send().await?;
        Self::check_status(response).await
    }
}

async fn forward_line(
    line: &[u8],
    tx: &mpsc::Sender<Result<String, LlmError>>
) -> LineOutcome {
    let line = line.trim_ascii();
    if line.is_empty() {
        return LineOutcome::Continue;
    }

    let chunk = match serde_json::from_slice::<StreamChunk>(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!("Unparseable stream line: {}", String::from_utf8_lossy(line));
            let _ = tx.send(Err(LlmError::Decode(e))).await;
            return LineOutcome::Finished;
        }
    };

    if let Some(error) = chunk.error {
        let _ = tx.send(Err(LlmError::Upstream(error))).await;
        return LineOutcome::Finished;
    }

    if let Some(message) = chunk.message {
        if !message.content.is_empty() && tx.send(Ok(message.content)).await.is_err() {
            // consumer dropped the stream
            return LineOutcome::Finished;
        }
    }

    if chunk.done {
        LineOutcome::Finished
    } else {
        LineOutcome::Continue
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self.send_chat(&request, false).await?;
        let body = response.bytes().await?;
        let reply: ChatReply = serde_json::from_slice(&body)?;

        Ok(CompletionResponse {
            content: reply.message.content,
            model: request.model,
        })
    }

    async fn chat_stream(&self, request: CompletionRequest) -> Result<ChatStream, LlmError> {
        let response = self.send_chat(&request, true).await?;
        let body = response.bytes_stream();

        Ok(
            create_streaming_response(move |tx| async move {
                let mut body = body;
                let mut buffer: Vec<u8> = Vec::new();

                while let Some(chunk) = body.next().await {
                    let bytes = match chunk {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            let _ = tx.send(Err(LlmError::Http(e))).await;
                            return;
                        }
                    };
                    buffer.extend_from_slice(&bytes);

                    // NDJSON lines may straddle network chunks
                    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        if let LineOutcome::Finished = forward_line(&line, &tx).await {
                            return;
                        }
                    }
                }

                if let LineOutcome::Finished = forward_line(&buffer, &tx).await {
                    return;
                }
                let _ = tx.send(Err(LlmError::Truncated)).await;
            })
        )
    }

    async fn list_models(&self) -> Result<Vec<ModelTag>, LlmError> {
        let response = self.http.get(self.endpoint("/api/tags")).send().await?;
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;
        let tags: TagsResponse = serde_json::from_slice(&body)?;
        Ok(tags.models)
    }
}
