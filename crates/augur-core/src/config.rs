use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AugurError, Result};

/// Top-level Augur configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub fallback_models: Vec<ModelConfig>,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,
}

/// Document grading policy used by the `grade_documents` stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GraderKind {
    /// Every retrieval is good enough; always generate.
    #[default]
    PassThrough,
    /// Ask for a refined query when no document overlaps the question.
    Lexical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Route through the keyword router before retrieval.
    #[serde(default = "default_routing")]
    pub routing: bool,
    /// Maximum transform_query passes before generation is forced.
    #[serde(default = "default_max_refinements")]
    pub max_refinements: usize,
    /// Hard cap on how many times a single stage may run in one request.
    #[serde(default = "default_max_stage_visits")]
    pub max_stage_visits: usize,
    /// Wall-clock budget for one request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Context used when retrieval finds nothing or fails.
    #[serde(default = "default_fallback_context")]
    pub fallback_context: String,
    #[serde(default)]
    pub grader: GraderKind,
    /// Capacity of the per-request streaming channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            routing: default_routing(),
            max_refinements: default_max_refinements(),
            max_stage_visits: default_max_stage_visits(),
            request_timeout_secs: default_request_timeout(),
            system_prompt: default_system_prompt(),
            fallback_context: default_fallback_context(),
            grader: GraderKind::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_routing() -> bool { true }
fn default_max_refinements() -> usize { 2 }
fn default_max_stage_visits() -> usize { 8 }
fn default_request_timeout() -> u64 { 120 }
fn default_event_buffer() -> usize { 64 }
fn default_system_prompt() -> String {
    "You are a helpful assistant for Chinese Classics. \
     Use the following context to answer the question if relevant."
        .to_string()
}
fn default_fallback_context() -> String {
    "暂无相关文档，请直接回答用户问题。".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Extra HTTP headers sent with every request.
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
}

fn default_provider() -> String { "dashscope".to_string() }
fn default_max_tokens() -> u32 { 2048 }
fn default_temperature() -> f32 { 0.0 }

/// Retry configuration for LLM requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff() -> u64 { 1000 }
fn default_max_backoff() -> u64 { 30000 }

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalBackend {
    /// Knowledge base off: every query yields no documents.
    #[default]
    Disabled,
    /// Cosine search over a pre-built embedding index.
    Embedding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub backend: RetrievalBackend,
    /// JSONL index file, one `{"text", "embedding"}` object per line.
    #[serde(default)]
    pub index_path: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: RetrievalBackend::Disabled,
            index_path: None,
            top_k: default_top_k(),
            min_score: default_min_score(),
            embedding: None,
        }
    }
}

fn default_top_k() -> usize { 4 }
fn default_min_score() -> f32 { 0.3 }

/// Embedding model configuration for the retrieval index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "text-embedding-v3", "nomic-embed-text").
    pub model: String,
    /// Base URL of an OpenAI-compatible API (e.g., "http://localhost:11434/v1").
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Embedding dimensions (default: 1024).
    #[serde(default = "default_embedding_dims")]
    pub dimensions: usize,
}

fn default_embedding_dims() -> usize { 1024 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            token: None,
            api_keys: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub name: String,
    pub key: String,
}

fn default_bind() -> String { "127.0.0.1:8000".to_string() }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| AugurError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parse TOML text, expanding `${ENV_VAR}` references first.
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| AugurError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a minimal config from environment variables.
    pub fn from_env() -> Self {
        let dashscope_key = std::env::var("DASHSCOPE_API_KEY").ok();
        let openai_key = std::env::var("OPENAI_API_KEY").ok();

        let (provider, model_id, api_key) = if let Some(key) = dashscope_key {
            ("dashscope", "qwen-max", Some(key))
        } else if let Some(key) = openai_key {
            ("openai", "gpt-4o-mini", Some(key))
        } else {
            // Default to Ollama (local)
            ("ollama", "qwen2.5", None)
        };

        Self {
            pipeline: PipelineConfig::default(),
            model: ModelConfig {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
                api_key,
                base_url: None,
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                retry: None,
                extra_headers: HashMap::new(),
            },
            fallback_models: vec![],
            retrieval: RetrievalConfig::default(),
            gateway: None,
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.model.model_id.trim().is_empty() {
            return Err(AugurError::Config("model.model_id must not be empty".into()));
        }
        if self.pipeline.max_stage_visits == 0 {
            return Err(AugurError::Config(
                "pipeline.max_stage_visits must be at least 1".into(),
            ));
        }
        if self.pipeline.max_refinements >= self.pipeline.max_stage_visits {
            return Err(AugurError::Config(format!(
                "pipeline.max_refinements ({}) must be below pipeline.max_stage_visits ({})",
                self.pipeline.max_refinements, self.pipeline.max_stage_visits
            )));
        }
        if self.pipeline.event_buffer == 0 {
            return Err(AugurError::Config("pipeline.event_buffer must be at least 1".into()));
        }
        if self.retrieval.backend == RetrievalBackend::Embedding {
            if self.retrieval.index_path.is_none() {
                return Err(AugurError::Config(
                    "retrieval.index_path is required for the embedding backend".into(),
                ));
            }
            if self.retrieval.embedding.is_none() {
                return Err(AugurError::Config(
                    "[retrieval.embedding] is required for the embedding backend".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_AUGUR_VAR", "hello");
        let result = expand_env_vars("key = \"${TEST_AUGUR_VAR}\"");
        assert_eq!(result, "key = \"hello\"");
        std::env::remove_var("TEST_AUGUR_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("key = \"${NONEXISTENT_AUGUR_VAR}\"");
        assert_eq!(result, "key = \"${NONEXISTENT_AUGUR_VAR}\"");
    }

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = AppConfig::parse(
            r#"
[model]
model_id = "qwen-max"
"#,
        )
        .unwrap();
        assert_eq!(config.model.provider, "dashscope");
        assert!(config.pipeline.routing);
        assert_eq!(config.pipeline.max_refinements, 2);
        assert_eq!(config.pipeline.grader, GraderKind::PassThrough);
        assert_eq!(config.retrieval.backend, RetrievalBackend::Disabled);
        assert_eq!(config.pipeline.fallback_context, "暂无相关文档，请直接回答用户问题。");
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_embedding_backend_requires_index() {
        let err = AppConfig::parse(
            r#"
[model]
model_id = "qwen-max"

[retrieval]
backend = "embedding"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AugurError::Config(msg) if msg.contains("index_path")));
    }

    #[test]
    fn test_refinements_must_fit_visit_cap() {
        let err = AppConfig::parse(
            r#"
[pipeline]
max_refinements = 8
max_stage_visits = 8

[model]
model_id = "qwen-max"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AugurError::Config(_)));
    }

    #[test]
    fn test_grader_and_gateway_sections() {
        let config = AppConfig::parse(
            r#"
[pipeline]
grader = "lexical"
routing = false

[model]
model_id = "qwen-max"

[gateway]
bind = "0.0.0.0:8000"

[[gateway.api_keys]]
name = "web"
key = "ak_123"
"#,
        )
        .unwrap();
        assert_eq!(config.pipeline.grader, GraderKind::Lexical);
        assert!(!config.pipeline.routing);
        let gw = config.gateway.unwrap();
        assert_eq!(gw.bind, "0.0.0.0:8000");
        assert_eq!(gw.api_keys[0].name, "web");
        assert!(gw.token.is_none());
    }
}
