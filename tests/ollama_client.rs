//! Exercises the Ollama HTTP client against a fake engine bound on an
//! ephemeral port.

use axum::body::{ Body, Bytes };
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::routing::{ get, post };
use axum::{ Json, Router };
use futures::StreamExt;
use serde_json::{ json, Value };
use std::convert::Infallible;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use primex_backend::llm::chat::ollama::OllamaClient;
use primex_backend::llm::chat::ChatClient;
use primex_backend::llm::{ ChatMessage, ChatOptions, CompletionRequest, LlmError };

type Seen = Arc<Mutex<Vec<Value>>>;

fn chunked(parts: Vec<&'static str>) -> Response {
    let stream = futures::stream::iter(
        parts.into_iter().map(|p| Ok::<_, Infallible>(Bytes::from_static(p.as_bytes())))
    );
    Response::builder()
        .header("content-type", "application/x-ndjson")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn fake_chat(seen: Seen, payload: Value) -> Response {
    seen.lock().unwrap().push(payload.clone());
    let model = payload["model"].as_str().unwrap_or_default().to_string();

    if model == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "model 'missing' not found, try pulling it first"})),
        ).into_response();
    }

    if payload["stream"] != json!(true) {
        let last = payload["messages"]
            .as_array()
            .and_then(|m| m.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string();
        return Json(
            json!({
                "model": model,
                "message": {"role": "assistant", "content": format!("reply to {last}")},
                "done": true
            })
        ).into_response();
    }

    match model.as_str() {
        // lines deliberately split across network chunks
        "split" =>
            chunked(
                vec![
                    "{\"message\":{\"content\":\"Hel\"},\"do",
                    "ne\":false}\n{\"message\":{\"content\":\"lo\"},\"done\":false}\n",
                    "{\"message\":{\"content\":\"\"},\"done\":true}\n"
                ]
            ),
        "crash" =>
            chunked(
                vec![
                    "{\"message\":{\"content\":\"par\"},\"done\":false}\n",
                    "{\"error\":\"llama runner process has terminated\"}\n"
                ]
            ),
        "cut" => chunked(vec!["{\"message\":{\"content\":\"half\"},\"done\":false}\n"]),
        _ => chunked(vec!["{\"message\":{\"content\":\"ok\"},\"done\":true}"]),
    }
}

async fn spawn_fake_ollama() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let chat_seen = seen.clone();

    let app = Router::new()
        .route(
            "/api/chat",
            post(move |Json(payload): Json<Value>| fake_chat(chat_seen.clone(), payload))
        )
        .route(
            "/api/tags",
            get(|| async {
                Json(
                    json!({"models": [
                    {"name": "llama3.2:1b", "size": 1321098329u64, "digest": "baf6a787fdff"}
                ]})
                )
            })
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), seen)
}

fn request(model: &str, temperature: Option<f64>) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user("ping")],
        options: temperature.map(|t| ChatOptions { temperature: Some(t) }),
    }
}

async fn collect(client: &OllamaClient, model: &str) -> Vec<Result<String, LlmError>> {
    client.chat_stream(request(model, None)).await.unwrap().collect().await
}

#[tokio::test]
async fn chat_posts_messages_and_options() {
    let (url, seen) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let reply = client.chat(request("llama3.2:1b", Some(0.25))).await.unwrap();
    assert_eq!(reply.content, "reply to ping");
    assert_eq!(reply.model, "llama3.2:1b");

    let payload = &seen.lock().unwrap()[0];
    assert_eq!(payload["stream"], false);
    assert_eq!(payload["messages"], json!([{"role": "user", "content": "ping"}]));
    assert_eq!(payload["options"], json!({"temperature": 0.25}));
}

#[tokio::test]
async fn chat_without_options_omits_them() {
    let (url, seen) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    client.chat(request("llama3.2:1b", None)).await.unwrap();
    assert!(seen.lock().unwrap()[0].get("options").is_none());
}

#[tokio::test]
async fn unknown_model_surfaces_engine_error_text() {
    let (url, _) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    match client.chat(request("missing", None)).await {
        Err(LlmError::Status { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("model 'missing' not found"));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(matches!(
        client.chat_stream(request("missing", None)).await,
        Err(LlmError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn unreachable_engine_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = OllamaClient::new(Some(url), None).unwrap();
    assert!(matches!(client.list_models().await, Err(LlmError::Http(_))));
}

#[tokio::test]
async fn list_models_keeps_extra_fields() {
    let (url, _) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let models = client.list_models().await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "llama3.2:1b");
    assert_eq!(models[0].extra["digest"], "baf6a787fdff");
}

#[tokio::test]
async fn stream_reassembles_lines_split_across_chunks() {
    let (url, seen) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let items = collect(&client, "split").await;
    let fragments: Vec<String> = items.into_iter().map(Result::unwrap).collect();
    assert_eq!(fragments, vec!["Hel", "lo"]);
    assert_eq!(seen.lock().unwrap()[0]["stream"], true);
}

#[tokio::test]
async fn stream_final_line_without_newline_completes() {
    let (url, _) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let items = collect(&client, "llama3.2:1b").await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap(), "ok");
}

#[tokio::test]
async fn stream_error_line_ends_with_err() {
    let (url, _) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let items = collect(&client, "crash").await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "par");
    match &items[1] {
        Err(LlmError::Upstream(message)) => assert!(message.contains("terminated")),
        other => panic!("unexpected item: {other:?}"),
    }
}

#[tokio::test]
async fn stream_without_done_is_truncated() {
    let (url, _) = spawn_fake_ollama().await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let items = collect(&client, "cut").await;
    assert_eq!(items.len(), 2);
    assert!(matches!(items[1], Err(LlmError::Truncated)));
}

const TICK: &[u8] = b"{\"message\":{\"content\":\"tick\"},\"done\":false}\n";
const FINISH: &[u8] = b"{\"message\":{\"content\":\"\"},\"done\":true}\n";

/// Flags when the engine side lets go of a response body.
struct BodyGuard(Arc<AtomicBool>);

impl Drop for BodyGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Serves `/api/chat` as `ticks` lines spaced `every` apart (forever when
/// `None`), then a `done` line. The flag flips once the body is dropped.
async fn spawn_ticking_ollama(every: Duration, ticks: Option<usize>) -> (String, Arc<AtomicBool>) {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();

    let app = Router::new().route(
        "/api/chat",
        post(move || {
            let guard = BodyGuard(flag.clone());
            async move {
                let body = futures::stream::unfold((guard, 0usize), move |(guard, sent)| async move {
                    let line = match ticks {
                        Some(limit) if sent > limit => return None,
                        Some(limit) if sent == limit => FINISH,
                        _ => TICK,
                    };
                    tokio::time::sleep(every).await;
                    Some((Ok::<_, Infallible>(Bytes::from_static(line)), (guard, sent + 1)))
                });
                Response::builder()
                    .header("content-type", "application/x-ndjson")
                    .body(Body::from_stream(body))
                    .unwrap()
            }
        })
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), dropped)
}

#[tokio::test]
async fn dropping_stream_releases_upstream_body() {
    let (url, dropped) = spawn_ticking_ollama(Duration::from_millis(50), None).await;
    let client = OllamaClient::new(Some(url), None).unwrap();

    let mut stream = client.chat_stream(request("llama3.2:1b", None)).await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), "tick");
    drop(stream);

    for _ in 0..40 {
        if dropped.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("engine response body still held after the stream was dropped");
}

#[tokio::test]
async fn timeout_does_not_cut_off_a_steady_stream() {
    let (url, _) = spawn_ticking_ollama(Duration::from_millis(50), Some(8)).await;
    let client = OllamaClient::new(Some(url), Some(Duration::from_millis(250))).unwrap();

    let items = collect(&client, "llama3.2:1b").await;
    assert_eq!(items.len(), 8);
    assert!(items.iter().all(|item| item.as_ref().is_ok_and(|t| t == "tick")));
}

#[tokio::test]
async fn timeout_fails_a_stalled_stream() {
    let (url, _) = spawn_ticking_ollama(Duration::from_millis(50), Some(1)).await;
    let client = OllamaClient::new(Some(url), Some(Duration::from_millis(20))).unwrap();

    let started = client.chat_stream(request("llama3.2:1b", None)).await;
    match started {
        Err(LlmError::Http(_)) => {}
        Ok(stream) => {
            let items: Vec<_> = stream.collect().await;
            assert!(matches!(items.last(), Some(Err(LlmError::Http(_)))), "{items:?}");
        }
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}
