//! Mocks and fixtures shared by the Augur test suites.

use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

use augur_core::config::{AppConfig, ModelConfig};
use augur_core::error::{AugurError, Result};
use augur_core::traits::{LlmClient, Retriever};
use augur_core::types::{ChatMessage, StopReason, StreamDelta};

/// A scripted LLM: streams fixed tokens, optionally failing at the request
/// or after the tokens. Every request's messages are recorded.
#[derive(Default)]
pub struct MockLlm {
    tokens: Vec<String>,
    request_error: Option<String>,
    stream_error: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Fail before streaming anything.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            request_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Stream the tokens, then fail.
    pub fn with_stream_error(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }

    /// Sleep before answering the request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages of every request so far.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlm {
    fn chat_stream(
        &self,
        _config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages);
        }
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(msg) = &self.request_error {
                return Err(AugurError::LlmRequest(msg.clone()));
            }

            let mut deltas: Vec<Result<StreamDelta>> = self
                .tokens
                .iter()
                .map(|t| Ok(StreamDelta::TextDelta(t.clone())))
                .collect();
            match &self.stream_error {
                Some(msg) => deltas.push(Err(AugurError::LlmStream(msg.clone()))),
                None => deltas.push(Ok(StreamDelta::Stop(StopReason::EndTurn))),
            }
            Ok(Box::pin(futures::stream::iter(deltas)) as BoxStream<'_, Result<StreamDelta>>)
        })
    }
}

/// Always returns the same documents.
pub struct StaticRetriever(pub Vec<String>);

impl StaticRetriever {
    pub fn new<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(docs.into_iter().map(Into::into).collect())
    }
}

impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    fn retrieve(&self, _query: &str) -> BoxFuture<'_, Result<Vec<String>>> {
        let docs = self.0.clone();
        Box::pin(async move { Ok(docs) })
    }
}

/// Always errors.
pub struct FailingRetriever;

impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        "failing"
    }

    fn retrieve(&self, _query: &str) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async { Err(AugurError::Retrieval("index unavailable".into())) })
    }
}

/// A minimal valid config for pipeline tests.
pub fn sample_config() -> AppConfig {
    let toml = r#"
[model]
provider = "ollama"
model_id = "test-model"
base_url = "http://127.0.0.1:9/v1/chat/completions"
"#;
    match AppConfig::parse(toml) {
        Ok(config) => config,
        Err(e) => panic!("sample config must parse: {e}"),
    }
}
