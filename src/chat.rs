//! # Chat orchestration
//! One user query → fresh ingest round → prompt → model reply → history.
//!
//! Per query: fetching → assembling → generating → done. Every query yields
//! some reply: the fixed fallback when no updates survive, an apology when
//! the model call fails. Model output is never invented locally.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;

use crate::config::AppConfig;
use crate::ingest::{self, extract::FilterRules, types::PageFetcher, IngestReport};
use crate::llm::DynLlmClient;
use crate::prompt::build_prompt;
use crate::session::{ChatMessage, Language, SessionStore};
use crate::sources::Source;

pub const NO_UPDATES_REPLY: &str = "No recent updates available at the moment.";
pub const GENERATION_FAILED_REPLY: &str =
    "Sorry, I could not reach the language model right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Answer,
    NoUpdates,
    GenerationFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    pub kind: ReplyKind,
    pub updates_used: usize,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Everything a query needs, shared across handlers.
pub struct ChatService {
    fetcher: Arc<dyn PageFetcher>,
    llm: DynLlmClient,
    sources: Arc<Vec<Source>>,
    rules: FilterRules,
    concurrency: usize,
    max_updates: usize,
    sessions: Arc<SessionStore>,
}

impl ChatService {
    pub fn new(
        cfg: &AppConfig,
        fetcher: Arc<dyn PageFetcher>,
        llm: DynLlmClient,
        sources: Vec<Source>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            fetcher,
            llm,
            sources: Arc::new(sources),
            rules: FilterRules::from(&cfg.extract),
            concurrency: cfg.fetch.concurrency,
            max_updates: cfg.collection.max_updates,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Current update collection, without touching any session.
    pub async fn fetch_updates(&self) -> IngestReport {
        ingest::run_once(
            self.fetcher.as_ref(),
            &self.sources,
            &self.rules,
            self.concurrency,
            self.max_updates,
        )
        .await
    }

    /// Answer one query for `session_id`, recording both turns in its history.
    pub async fn handle_query(&self, session_id: &str, query: &str) -> Result<ChatOutcome, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        counter!("chat_queries_total").increment(1);

        self.sessions.append(session_id, ChatMessage::user(query));
        let language = self.sessions.language(session_id);

        let report = self.fetch_updates().await;
        let updates_used = report.updates.len();

        let (reply, kind) = if report.updates.is_empty() {
            counter!("chat_fallback_total").increment(1);
            (NO_UPDATES_REPLY.to_string(), ReplyKind::NoUpdates)
        } else {
            let prompt = build_prompt(&report.updates, query, language.name());
            match self.llm.generate(&prompt).await {
                Ok(text) => (text, ReplyKind::Answer),
                Err(e) => {
                    tracing::warn!(error = %e, provider = self.llm.provider_name(), "generation failed");
                    (
                        GENERATION_FAILED_REPLY.to_string(),
                        ReplyKind::GenerationFailed,
                    )
                }
            }
        };

        self.sessions
            .append(session_id, ChatMessage::assistant(reply.clone()));

        Ok(ChatOutcome {
            reply,
            kind,
            updates_used,
            language,
        })
    }
}
