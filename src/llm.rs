//! LLM adapter: provider abstraction + retry wrapper.
//!
//! The rest of the crate only sees [`LlmClient`]: one prompt in, one trimmed
//! reply out. Request/response shapes of the hosted models stay in here so
//! the provider can be swapped from config.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Why no reply could be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("language model is disabled")]
    Disabled,
    #[error("no API key configured for {provider}")]
    MissingApiKey { provider: &'static str },
    #[error("language model request timed out")]
    Timeout,
    #[error("language model request failed: {0}")]
    Transport(String),
    #[error("language model returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("could not decode language model response: {0}")]
    Decode(String),
    #[error("language model returned an empty reply")]
    EmptyReply,
}

impl GenerationError {
    /// Timeouts, connection errors, throttling and server errors may succeed on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Timeout | GenerationError::Transport(_) => true,
            GenerationError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else if e.is_decode() {
            GenerationError::Decode(e.to_string())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Trait object used by the chat service and handlers.
pub trait LlmClient: Send + Sync {
    /// Send one prompt; returns the trimmed reply text.
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynLlmClient = Arc<dyn LlmClient>;

/// Factory: build a client according to config and environment variables.
///
/// * `AI_TEST_MODE=mock` returns a deterministic mock client.
/// * `AI_TEST_MODE=error` returns a client that always fails.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the configured provider wrapped with retries; an unknown
///   provider name is an error.
pub fn build_client_from_config(config: &LlmConfig) -> anyhow::Result<DynLlmClient> {
    match std::env::var("AI_TEST_MODE").ok().as_deref() {
        Some("mock") => {
            let mock = MockProvider::new("Mock reply based on the latest government updates.");
            return Ok(Arc::new(RetryingClient::new(mock, 0)));
        }
        Some("error") => {
            let failing = FailingProvider {
                error: GenerationError::Transport("AI_TEST_MODE=error".to_string()),
            };
            return Ok(Arc::new(RetryingClient::new(failing, 0)));
        }
        _ => {}
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledClient));
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider.as_str() {
        "openai" => {
            let provider = OpenAiProvider::new(
                config.api_key.clone(),
                config.model.as_deref(),
                config.base_url.as_deref(),
                timeout,
            )?;
            Ok(Arc::new(RetryingClient::new(provider, config.retries)))
        }
        "gemini" => {
            let provider = GeminiProvider::new(
                config.api_key.clone(),
                config.model.as_deref(),
                config.base_url.as_deref(),
                timeout,
            )?;
            Ok(Arc::new(RetryingClient::new(provider, config.retries)))
        }
        other => anyhow::bail!("unsupported LLM provider: {other}"),
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does a *real* remote call. Separated so the same
/// retry wrapper serves production and tests.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
    fn name(&self) -> &'static str;
}

fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("pakinfo-bot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .context("building LLM http client")
}

async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GenerationError::Http {
        status: status.as_u16(),
        body: body.chars().take(300).collect(),
    })
}

/// Google Gemini `generateContent`. Requires `GEMINI_API_KEY` (or a literal key).
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model: Option<&str>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model: model.unwrap_or(GEMINI_DEFAULT_MODEL).to_string(),
            base_url: base_url
                .unwrap_or(GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}
#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}
#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}
#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

impl Provider for GeminiProvider {
    fn fetch<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(GenerationError::MissingApiKey { provider: "gemini" });
            }

            let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
            let req = GeminiRequest {
                contents: vec![GeminiContent {
                    role: "user",
                    parts: vec![GeminiPart { text: prompt }],
                }],
            };

            let resp = self
                .http
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&req)
                .send()
                .await
                .map_err(GenerationError::from_reqwest)?;
            let resp = error_for_status(resp).await?;

            let body: GeminiResponse = resp
                .json()
                .await
                .map_err(|e| GenerationError::Decode(e.to_string()))?;
            let text = body
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .map(|c| {
                    c.parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();
            Ok(text)
        })
    }
    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// OpenAI-compatible Chat Completions. Requires `OPENAI_API_KEY` (or a literal key).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        model: Option<&str>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model: model.unwrap_or(OPENAI_DEFAULT_MODEL).to_string(),
            base_url: base_url
                .unwrap_or(OPENAI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl Provider for OpenAiProvider {
    fn fetch<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(GenerationError::MissingApiKey { provider: "openai" });
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: Option<String>,
            }

            let req = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: prompt,
                }],
            };

            let resp = self
                .http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .map_err(GenerationError::from_reqwest)?;
            let resp = error_for_status(resp).await?;

            let body: Resp = resp
                .json()
                .await
                .map_err(|e| GenerationError::Decode(e.to_string()))?;
            Ok(body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        })
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Always fails with `Disabled`; used when generation is switched off.
pub struct DisabledClient;

impl LlmClient for DisabledClient {
    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async { Err(GenerationError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed reply for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

impl Provider for MockProvider {
    fn fetch<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Always returns the configured error.
#[derive(Clone)]
pub struct FailingProvider {
    pub error: GenerationError,
}

impl Provider for FailingProvider {
    fn fetch<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        let err = self.error.clone();
        Box::pin(async move { Err(err) })
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

// ------------------------------------------------------------
// Retry wrapper
// ------------------------------------------------------------

/// Trims replies, rejects empty ones and retries retryable failures.
pub struct RetryingClient<P: Provider> {
    inner: P,
    retries: u8,
    delay: Duration,
}

impl<P: Provider> RetryingClient<P> {
    pub fn new(inner: P, retries: u8) -> Self {
        Self {
            inner,
            retries,
            delay: Duration::from_millis(500),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn generate_impl(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            counter!("llm_requests_total").increment(1);
            match self.inner.fetch(prompt).await {
                Ok(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        counter!("llm_errors_total").increment(1);
                        return Err(GenerationError::EmptyReply);
                    }
                    return Ok(trimmed.to_string());
                }
                Err(e) => {
                    counter!("llm_errors_total").increment(1);
                    if e.is_retryable() && attempt <= self.retries {
                        tracing::debug!(error = %e, attempt, provider = self.inner.name(), "retrying generation");
                        tokio::time::sleep(self.delay).await;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl<P: Provider> LlmClient for RetryingClient<P> {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}
