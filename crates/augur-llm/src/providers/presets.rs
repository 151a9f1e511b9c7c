use augur_core::config::ModelConfig;
use tracing::warn;

/// A named provider preset for OpenAI-compatible APIs.
pub struct ProviderPreset {
    pub default_base_url: &'static str,
    pub needs_api_key: bool,
    pub extra_headers: &'static [(&'static str, &'static str)],
}

/// Look up a provider preset by name.
pub fn get_preset(provider: &str) -> Option<ProviderPreset> {
    match provider {
        "dashscope" | "qwen" => Some(ProviderPreset {
            default_base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
            needs_api_key: true,
            extra_headers: &[],
        }),
        "openai" => Some(ProviderPreset {
            default_base_url: "https://api.openai.com/v1/chat/completions",
            needs_api_key: true,
            extra_headers: &[],
        }),
        "deepseek" => Some(ProviderPreset {
            default_base_url: "https://api.deepseek.com/v1/chat/completions",
            needs_api_key: true,
            extra_headers: &[],
        }),
        "moonshot" => Some(ProviderPreset {
            default_base_url: "https://api.moonshot.cn/v1/chat/completions",
            needs_api_key: true,
            extra_headers: &[],
        }),
        "zhipu" => Some(ProviderPreset {
            default_base_url: "https://open.bigmodel.cn/api/paas/v4/chat/completions",
            needs_api_key: true,
            extra_headers: &[],
        }),
        "ollama" => Some(ProviderPreset {
            default_base_url: "http://localhost:11434/v1/chat/completions",
            needs_api_key: false,
            extra_headers: &[],
        }),
        "groq" => Some(ProviderPreset {
            default_base_url: "https://api.groq.com/openai/v1/chat/completions",
            needs_api_key: true,
            extra_headers: &[],
        }),
        "openrouter" => Some(ProviderPreset {
            default_base_url: "https://openrouter.ai/api/v1/chat/completions",
            needs_api_key: true,
            extra_headers: &[("X-Title", "Augur")],
        }),
        _ => None,
    }
}

/// Fill in the preset base URL and headers for a model config.
/// Values set by the user are never overwritten.
pub fn apply_preset_defaults(config: &mut ModelConfig) {
    let Some(preset) = get_preset(&config.provider) else {
        return;
    };

    if config.base_url.is_none() {
        config.base_url = Some(preset.default_base_url.to_string());
    }
    for (k, v) in preset.extra_headers {
        config
            .extra_headers
            .entry(k.to_string())
            .or_insert_with(|| v.to_string());
    }
    if preset.needs_api_key && config.api_key.is_none() {
        warn!(provider = %config.provider, "Provider needs an API key but none is configured");
    }
}

/// List all known preset provider names.
pub fn all_preset_names() -> &'static [&'static str] {
    &[
        "dashscope",
        "openai",
        "deepseek",
        "moonshot",
        "zhipu",
        "ollama",
        "groq",
        "openrouter",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(provider: &str) -> ModelConfig {
        let mut config = augur_core::AppConfig::from_env().model;
        config.provider = provider.to_string();
        config.base_url = None;
        config.extra_headers.clear();
        config
    }

    #[test]
    fn test_every_listed_name_has_a_preset() {
        for name in all_preset_names() {
            assert!(get_preset(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_preset_fills_base_url() {
        let mut config = model("dashscope");
        apply_preset_defaults(&mut config);
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions")
        );
    }

    #[test]
    fn test_user_values_win() {
        let mut config = model("openrouter");
        config.base_url = Some("http://proxy/v1/chat/completions".into());
        config
            .extra_headers
            .insert("X-Title".into(), "Custom".into());
        apply_preset_defaults(&mut config);
        assert_eq!(config.base_url.as_deref(), Some("http://proxy/v1/chat/completions"));
        assert_eq!(config.extra_headers["X-Title"], "Custom");
    }

    #[test]
    fn test_unknown_provider_untouched() {
        let mut config = model("mystery");
        apply_preset_defaults(&mut config);
        assert!(config.base_url.is_none());
    }
}
