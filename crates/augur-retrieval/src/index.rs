use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use augur_core::error::{AugurError, Result};

use crate::embeddings::cosine_similarity;

/// One line of the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
}

/// In-memory vector index loaded from a JSONL file.
#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<IndexChunk>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<IndexChunk>) -> Self {
        Self { chunks }
    }

    /// Load an index where every non-blank line is `{"text": ..., "embedding": [...]}`.
    ///
    /// Lines whose vector length differs from the first chunk are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AugurError::Retrieval(format!("cannot read index {}: {}", path.display(), e))
        })?;
        let index = Self::parse(&content)?;
        info!(path = %path.display(), chunks = index.len(), "Loaded vector index");
        Ok(index)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut chunks: Vec<IndexChunk> = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let chunk: IndexChunk = serde_json::from_str(line).map_err(|e| {
                AugurError::Retrieval(format!("index line {}: {}", lineno + 1, e))
            })?;
            if let Some(first) = chunks.first() {
                if first.embedding.len() != chunk.embedding.len() {
                    warn!(
                        line = lineno + 1,
                        expected = first.embedding.len(),
                        got = chunk.embedding.len(),
                        "Skipping index chunk with mismatched dimensions"
                    );
                    continue;
                }
            }
            chunks.push(chunk);
        }
        Ok(Self { chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Vector length of the stored chunks, if any.
    pub fn dimensions(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.embedding.len())
    }

    /// The `top_k` chunks most similar to `query`, best first, none below `min_score`.
    pub fn search(&self, query: &[f32], top_k: usize, min_score: f32) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|c| ScoredChunk {
                text: c.text.clone(),
                score: cosine_similarity(query, &c.embedding),
            })
            .filter(|s| s.score >= min_score)
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        scored
    }
}
