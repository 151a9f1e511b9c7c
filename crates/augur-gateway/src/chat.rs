use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use augur_core::types::{SessionId, StreamEvent};

use crate::error::ApiError;
use crate::middleware::Authenticated;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    fn session(&self) -> SessionId {
        self.session_id
            .as_deref()
            .map(SessionId::from_string)
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::BadRequest("message must not be empty".into()));
        }
        Ok(())
    }
}

// POST /api/v1/chat/
pub async fn chat(
    Authenticated(_auth): Authenticated,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    body.validate()?;
    let session_id = body.session();
    info!(session_id = %session_id, "Chat request");

    let response = state.pipeline.respond(&body.message).await?;
    Ok(Json(serde_json::json!({
        "response": response,
        "session_id": session_id.to_string(),
    })))
}

// POST /api/v1/chat/stream
pub async fn chat_stream(
    Authenticated(_auth): Authenticated,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    body.validate()?;
    info!(session_id = %body.session(), "Streaming chat request");

    let events = state
        .pipeline
        .stream(&body.message)
        .map(|event| Ok::<_, Infallible>(sse_event(&event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    error: &'a str,
}

/// SSE event name and JSON data for one pipeline event.
pub(crate) fn encode(event: &StreamEvent) -> (&'static str, String) {
    fn message(kind: &str, content: &str) -> String {
        serde_json::to_string(&MessagePayload { kind, content }).unwrap_or_default()
    }
    match event {
        StreamEvent::Status { content } => ("message", message("status", content)),
        StreamEvent::Token { content } => ("message", message("token", content)),
        StreamEvent::Done => ("message", message("done", "")),
        StreamEvent::Error { error } => (
            "error",
            serde_json::to_string(&ErrorPayload { error }).unwrap_or_default(),
        ),
    }
}

fn sse_event(event: &StreamEvent) -> Event {
    let (name, data) = encode(event);
    Event::default().event(name).data(data)
}
