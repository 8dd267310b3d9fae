//! Server-sent events for relayed chat streams.
//!
//! Each fragment is an unnamed `data` event. The stream always ends with
//! exactly one named event: `done` after a clean finish, or `error` carrying
//! the upstream failure text. A stream may open with one named JSON event
//! describing who is answering (`clone` for orchestrator invokes).

use axum::response::sse::{ Event, KeepAlive, Sse };
use futures::stream::{ self, Stream, StreamExt };
use serde::Serialize;
use std::convert::Infallible;
use log::warn;

use crate::llm::chat::ChatStream;

pub const CLONE_EVENT: &str = "clone";
pub const DONE_EVENT: &str = "done";
pub const ERROR_EVENT: &str = "error";
pub const DONE_SENTINEL: &str = "[DONE]";

pub fn fragments_to_events(
    fragments: ChatStream
) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    stream::unfold(Some(fragments), |state| async move {
        let mut fragments = match state {
            Some(fragments) => fragments,
            None => return None,
        };
        let event = match fragments.next().await {
            Some(Ok(text)) => {
                return Some((Ok(Event::default().data(text)), Some(fragments)));
            }
            Some(Err(e)) => {
                warn!("Stream aborted by upstream error: {}", e);
                Event::default().event(ERROR_EVENT).data(e.to_string())
            }
            None => Event::default().event(DONE_EVENT).data(DONE_SENTINEL),
        };
        Some((Ok(event), None))
    })
}

pub fn sse_response(
    fragments: ChatStream
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    Sse::new(fragments_to_events(fragments)).keep_alive(KeepAlive::default())
}

pub fn sse_response_with_header<T: Serialize>(
    name: &str,
    header: &T,
    fragments: ChatStream
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let leading = Event::default()
        .event(name)
        .json_data(header)
        .inspect_err(|e| warn!("Dropping unserializable '{}' event: {}", name, e))
        .ok();

    let events = stream::iter(leading.map(Ok)).chain(fragments_to_events(fragments));
    Sse::new(events).keep_alive(KeepAlive::default())
}
