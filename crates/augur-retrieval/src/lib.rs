pub mod embeddings;
pub mod index;
pub mod retriever;

pub use embeddings::{cosine_similarity, EmbeddingProvider, HttpEmbeddingProvider};
pub use index::{IndexChunk, ScoredChunk, VectorIndex};
pub use retriever::{build_retriever, EmbeddingRetriever, NoopRetriever};
