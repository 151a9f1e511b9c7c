use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info};

use augur_core::config::{RetrievalBackend, RetrievalConfig};
use augur_core::error::{AugurError, Result};
use augur_core::traits::Retriever;

use crate::embeddings::{EmbeddingProvider, HttpEmbeddingProvider};
use crate::index::VectorIndex;

/// Retriever used when RAG is disabled. Always finds nothing.
pub struct NoopRetriever;

impl Retriever for NoopRetriever {
    fn name(&self) -> &str {
        "disabled"
    }

    fn retrieve(&self, _query: &str) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async { Ok(vec![]) })
    }
}

/// Embeds the query and searches a pre-built vector index.
pub struct EmbeddingRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
    top_k: usize,
    min_score: f32,
}

impl EmbeddingRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: VectorIndex,
        top_k: usize,
        min_score: f32,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
            min_score,
        }
    }
}

impl Retriever for EmbeddingRetriever {
    fn name(&self) -> &str {
        "embedding"
    }

    fn retrieve(&self, query: &str) -> BoxFuture<'_, Result<Vec<String>>> {
        let query = query.to_string();
        Box::pin(async move {
            if self.index.is_empty() {
                return Ok(vec![]);
            }

            let vectors = self.embedder.embed(&[query]).await?;
            let vector = vectors
                .into_iter()
                .next()
                .ok_or_else(|| AugurError::Embedding("empty embedding response".into()))?;

            let hits = self.index.search(&vector, self.top_k, self.min_score);
            debug!(
                hits = hits.len(),
                best = hits.first().map(|h| h.score).unwrap_or(0.0),
                "Vector search complete"
            );
            Ok(hits.into_iter().map(|h| h.text).collect())
        })
    }
}

/// Build the retriever selected by `[retrieval]`.
pub fn build_retriever(config: &RetrievalConfig) -> Result<Arc<dyn Retriever>> {
    match config.backend {
        RetrievalBackend::Disabled => Ok(Arc::new(NoopRetriever)),
        RetrievalBackend::Embedding => {
            let path = config.index_path.as_deref().ok_or_else(|| {
                AugurError::Config("retrieval.index_path is required for the embedding backend".into())
            })?;
            let embedding = config.embedding.as_ref().ok_or_else(|| {
                AugurError::Config("[retrieval.embedding] is required for the embedding backend".into())
            })?;

            let index = VectorIndex::load(Path::new(path))?;
            if let Some(dims) = index.dimensions() {
                if dims != embedding.dimensions {
                    return Err(AugurError::Config(format!(
                        "index vectors have {} dimensions but retrieval.embedding.dimensions is {}",
                        dims, embedding.dimensions
                    )));
                }
            }

            info!(model = %embedding.model, top_k = config.top_k, "Embedding retrieval enabled");
            let embedder = Arc::new(HttpEmbeddingProvider::from_config(embedding));
            Ok(Arc::new(EmbeddingRetriever::new(
                embedder,
                index,
                config.top_k,
                config.min_score,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexChunk;
    use augur_core::config::EmbeddingConfig;
    use std::io::Write;

    /// Maps known words to fixed vectors.
    struct KeywordEmbedder;

    impl EmbeddingProvider for KeywordEmbedder {
        fn embed(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>>> {
            let out = texts
                .iter()
                .map(|t| {
                    if t.contains("天") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect();
            Box::pin(async move { Ok(out) })
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn chunk(text: &str, embedding: Vec<f32>) -> IndexChunk {
        IndexChunk {
            text: text.to_string(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_noop_returns_empty() {
        assert!(NoopRetriever.retrieve("乾卦").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_retriever_ranks() {
        let index = VectorIndex::new(vec![
            chunk("地势坤", vec![0.0, 1.0]),
            chunk("天行健", vec![1.0, 0.0]),
        ]);
        let retriever = EmbeddingRetriever::new(Arc::new(KeywordEmbedder), index, 1, 0.5);
        assert_eq!(retriever.retrieve("天是什么").await.unwrap(), vec!["天行健"]);
        assert_eq!(retriever.retrieve("地").await.unwrap(), vec!["地势坤"]);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedding() {
        let retriever =
            EmbeddingRetriever::new(Arc::new(KeywordEmbedder), VectorIndex::default(), 4, 0.0);
        assert!(retriever.retrieve("天").await.unwrap().is_empty());
    }

    #[test]
    fn test_build_disabled() {
        let retriever = build_retriever(&RetrievalConfig::default()).unwrap();
        assert_eq!(retriever.name(), "disabled");
    }

    #[test]
    fn test_build_embedding_checks_dimensions() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"text": "天行健", "embedding": [1.0, 0.0]}}"#).unwrap();

        let mut config = RetrievalConfig {
            backend: RetrievalBackend::Embedding,
            index_path: Some(f.path().display().to_string()),
            embedding: Some(EmbeddingConfig {
                model: "text-embedding-v3".into(),
                base_url: "http://localhost:1/v1".into(),
                api_key: None,
                dimensions: 1024,
            }),
            ..RetrievalConfig::default()
        };
        assert!(matches!(build_retriever(&config), Err(AugurError::Config(_))));

        if let Some(e) = config.embedding.as_mut() {
            e.dimensions = 2;
        }
        assert_eq!(build_retriever(&config).unwrap().name(), "embedding");
    }
}
