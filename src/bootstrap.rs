// src/bootstrap.rs
use std::sync::Arc;

use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::{self, AppState};
use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::ingest::fetcher::HttpFetcher;
use crate::llm::build_client_from_config;
use crate::session::SessionStore;
use crate::sources::{load_sources_default, Source};

/// Compact fmt logs filtered by `RUST_LOG` (default `pakinfo_bot=info,warn`).
/// A subscriber installed earlier (e.g. by the deployment runtime) wins.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pakinfo_bot=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Fully wired service: config, registry, fetcher, model client, sessions.
pub struct AppRuntime {
    pub cfg: AppConfig,
    pub sources: Vec<Source>,
    pub state: AppState,
}

impl AppRuntime {
    /// Load config + registry from the usual locations and build the service.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = AppConfig::load_default()?;
        let sources = load_sources_default()?;
        Self::from_parts(cfg, sources)
    }

    pub fn from_parts(cfg: AppConfig, sources: Vec<Source>) -> anyhow::Result<Self> {
        // Safe diagnostics: only provider + enabled + key length
        info!(
            "config loaded: sources={}, concurrency={}, llm_provider={}, llm_enabled={}, key_len={}",
            sources.len(),
            cfg.fetch.concurrency,
            cfg.llm.provider,
            cfg.llm.enabled,
            cfg.llm.api_key.len()
        );

        let fetcher = Arc::new(HttpFetcher::new(&cfg.fetch)?);
        let llm = build_client_from_config(&cfg.llm)?;
        let sessions = Arc::new(SessionStore::new());
        let chat = ChatService::new(&cfg, fetcher, llm, sources.clone(), sessions);

        Ok(Self {
            cfg,
            sources,
            state: AppState::new(chat),
        })
    }

    pub fn router(&self) -> Router {
        api::create_router(self.state.clone())
    }
}
