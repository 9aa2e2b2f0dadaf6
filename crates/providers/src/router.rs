//! Provider router — selects the correct LLM provider based on config.
//!
//! Every backend speaks the OpenAI chat-completions dialect, so routing is
//! a matter of picking the base URL and key for a provider name.

use crate::openai_compat::OpenAiCompatProvider;
use aula_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// The default provider is always registered, even when it has no
/// `[providers.<name>]` table.
pub fn build_from_config(config: &aula_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = Duration::from_secs(config.request_timeout_secs);

    for (name, provider_config) in &config.providers {
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::with_timeout(
                name,
                base_url,
                config.api_key_for(name),
                timeout,
            )),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let name = &config.default_provider;
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::with_timeout(
                name,
                default_base_url(name),
                config.api_key_for(name),
                timeout,
            )),
        );
    }

    router
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "ollama" => "http://localhost:11434/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        "lmstudio" => "http://localhost:1234/v1".into(),
        // Unknown names are assumed to be a local OpenAI-compatible server.
        _ => "http://localhost:11434/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_config::{AppConfig, ProviderConfig};

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("ollama");
        router.register("ollama", Arc::new(OpenAiCompatProvider::ollama(None)));

        assert!(router.get("ollama").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("ollama").contains("localhost:11434"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("something-else").starts_with("http://localhost"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        let provider = router.default().unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn configured_url_overrides_default() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://gpu-box:11434/v1".into()),
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.default().unwrap().base_url(), "http://gpu-box:11434/v1");
    }

    #[test]
    fn extra_providers_are_registered() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-test".into()),
                api_url: None,
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["ollama", "openai"]);
    }
}
