use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::types::*;

/// Streaming chat-completion client.
pub trait LlmClient: Send + Sync + 'static {
    /// Send a chat request and receive a stream of deltas.
    fn chat_stream(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>>;
}

/// Fetches context passages for a query.
pub trait Retriever: Send + Sync + 'static {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Return context strings ordered by relevance. An empty vector means
    /// "no relevant context" and is not an error.
    fn retrieve(&self, query: &str) -> BoxFuture<'_, Result<Vec<String>>>;
}
