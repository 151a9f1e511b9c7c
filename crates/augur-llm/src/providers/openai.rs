use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use augur_core::config::ModelConfig;
use augur_core::error::{AugurError, Result};
use augur_core::traits::LlmClient;
use augur_core::types::*;

use crate::streaming::{SseEvent, SseStream};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible client. Works with DashScope, OpenAI, DeepSeek, Ollama, vLLM, etc.
pub struct OpenAiClient {
    http: Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

// Request types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OaiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Serialize, Debug, PartialEq)]
pub(crate) struct OaiMessage {
    role: &'static str,
    content: String,
}

// Response types
#[derive(Deserialize, Debug)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<StreamUsage>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDeltaContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamDeltaContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

pub(crate) fn convert_messages(messages: Vec<ChatMessage>) -> Vec<OaiMessage> {
    messages
        .into_iter()
        .map(|msg| OaiMessage {
            role: match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: msg.content,
        })
        .collect()
}

pub(crate) fn parse_chunk(event: SseEvent) -> Vec<Result<StreamDelta>> {
    if event.data.trim() == "[DONE]" {
        return vec![];
    }

    let parsed: std::result::Result<StreamChunk, _> = serde_json::from_str(&event.data);
    match parsed {
        Ok(chunk) => {
            // Providers report mid-stream failures as `{"error": ...}` chunks
            if let Some(err) = chunk.error {
                return vec![Err(AugurError::LlmStream(err.to_string()))];
            }

            let mut deltas = Vec::new();

            if let Some(choice) = chunk.choices.into_iter().next() {
                if let Some(text) = choice.delta.and_then(|d| d.content) {
                    if !text.is_empty() {
                        deltas.push(Ok(StreamDelta::TextDelta(text)));
                    }
                }

                // Some providers send the last text fragment and the
                // finish reason in the same chunk.
                if let Some(reason) = choice.finish_reason {
                    let stop = match reason.as_str() {
                        "length" => StopReason::MaxTokens,
                        "stop_sequence" => StopReason::StopSequence,
                        _ => StopReason::EndTurn,
                    };
                    deltas.push(Ok(StreamDelta::Stop(stop)));
                }
            }

            if let Some(usage) = chunk.usage {
                deltas.push(Ok(StreamDelta::Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                }));
            }

            deltas
        }
        Err(e) => {
            warn!(data = %event.data, error = %e, "Failed to parse SSE chunk");
            vec![]
        }
    }
}

/// Flatten SSE events into deltas. A transport error is passed through, and
/// a body that ends before `[DONE]` or a finish reason becomes an error.
pub(crate) fn into_deltas<S>(events: S) -> impl Stream<Item = Result<StreamDelta>>
where
    S: Stream<Item = Result<SseEvent>> + Unpin,
{
    futures::stream::unfold(Some((events, false)), |state| async move {
        let (mut events, mut finished) = state?;
        match events.next().await {
            Some(Ok(event)) => {
                if event.data.trim() == "[DONE]" {
                    finished = true;
                }
                let batch = parse_chunk(event);
                if batch.iter().any(|d| matches!(d, Ok(StreamDelta::Stop(_)))) {
                    finished = true;
                }
                Some((futures::stream::iter(batch), Some((events, finished))))
            }
            Some(Err(e)) => {
                warn!(error = %e, "Response stream failed");
                Some((futures::stream::iter(vec![Err(e)]), None))
            }
            None if !finished => {
                let err = AugurError::LlmStream("response ended before completion".into());
                Some((futures::stream::iter(vec![Err(err)]), None))
            }
            None => None,
        }
    })
    .flatten()
}

impl LlmClient for OpenAiClient {
    fn chat_stream(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>> {
        let config = config.clone();

        Box::pin(async move {
            let base_url = config.base_url.as_deref().unwrap_or(OPENAI_API_URL);

            let body = ChatRequest {
                model: config.model_id.clone(),
                messages: convert_messages(messages),
                max_tokens: config.max_tokens,
                temperature: Some(config.temperature),
                stream: true,
                stream_options: Some(StreamOptions {
                    include_usage: true,
                }),
            };

            debug!(model = %config.model_id, url = %base_url, "Sending chat request");
            let mut req = self.http.post(base_url).json(&body);

            if let Some(api_key) = &config.api_key {
                req = req.bearer_auth(api_key);
            }

            // Apply extra headers from config (set by presets or user)
            for (k, v) in &config.extra_headers {
                req = req.header(k.as_str(), v.as_str());
            }

            let response = req
                .send()
                .await
                .map_err(|e| AugurError::LlmRequest(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                return Err(AugurError::LlmRequest(format!("HTTP {}: {}", status, body)));
            }

            let byte_stream = response.bytes_stream();
            let sse_stream = SseStream::new(byte_stream);

            Ok(Box::pin(into_deltas(sse_stream)) as BoxStream<'_, Result<StreamDelta>>)
        })
    }
}
