use thiserror::Error;

#[derive(Debug, Error)]
pub enum AugurError {
    // LLM errors
    #[error("LLM request failed: {0}")]
    LlmRequest(String),

    #[error("LLM streaming error: {0}")]
    LlmStream(String),

    #[error("LLM provider not supported: {0}")]
    UnsupportedProvider(String),

    // Retrieval errors
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    // Tool errors
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool input validation failed: {0}")]
    ToolValidation(String),

    // Pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AugurError>;
