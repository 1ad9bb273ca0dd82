// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_retries() -> u8 {
    1
}

/// `[llm]` section: which hosted model answers the chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// "gemini" | "openai" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Falls back to the provider's default model when absent.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GEMINI_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Override of the provider endpoint (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a retryable failure.
    #[serde(default = "default_retries")]
    pub retries: u8,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

impl LlmConfig {
    /// Normalize provider name, clamp numbers and resolve an "ENV" key.
    ///
    /// A missing env key is not an error here: the provider reports
    /// `MissingApiKey` on first use so the UI can still serve fallbacks.
    pub fn sanitize(&mut self) -> anyhow::Result<()> {
        self.provider = self.provider.trim().to_lowercase();
        if self.provider.is_empty() {
            self.provider = default_provider();
        }

        let key_var = match self.provider.as_str() {
            "gemini" => "GEMINI_API_KEY",
            "openai" => "OPENAI_API_KEY",
            other => anyhow::bail!("Unsupported provider in config: {other}"),
        };
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(key_var).unwrap_or_default();
        }

        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.retries = self.retries.min(3);
        Ok(())
    }
}
