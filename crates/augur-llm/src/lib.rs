pub mod providers;
pub mod retry;
pub mod streaming;

use std::sync::Arc;

use augur_core::config::{AppConfig, ModelConfig};
use augur_core::error::{AugurError, Result};
use augur_core::traits::LlmClient;

pub use providers::openai::OpenAiClient;
pub use providers::presets::apply_preset_defaults;
pub use retry::RetryingClient;

/// Create an LLM client for a model config.
///
/// Every supported provider speaks the OpenAI chat-completions dialect, so a
/// provider is usable when it has a preset or an explicit `base_url`.
pub fn create_client(config: &ModelConfig) -> Result<Box<dyn LlmClient>> {
    if config.base_url.is_none() && providers::presets::get_preset(&config.provider).is_none() {
        return Err(AugurError::UnsupportedProvider(config.provider.clone()));
    }
    Ok(Box::new(OpenAiClient::new()))
}

/// Fill preset defaults (base URL, headers) into every model in the config.
pub fn prepare_config(config: &mut AppConfig) {
    apply_preset_defaults(&mut config.model);
    for mc in &mut config.fallback_models {
        apply_preset_defaults(mc);
    }
}

/// Build the client the pipeline talks to: the primary model, wrapped in a
/// retry/fallback chain when either is configured.
pub fn build_client(config: &AppConfig) -> Result<Arc<dyn LlmClient>> {
    let primary = create_client(&config.model)?;
    if config.fallback_models.is_empty() && config.model.retry.is_none() {
        return Ok(Arc::from(primary));
    }

    let retry_config = config.model.retry.clone().unwrap_or_default();
    let fallbacks = config
        .fallback_models
        .iter()
        .map(|mc| Ok((mc.clone(), create_client(mc)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Arc::new(RetryingClient::new(primary, fallbacks, retry_config)))
}
