// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod chat;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod metrics;
pub mod prompt;
pub mod session;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::chat::{ChatOutcome, ChatService, ReplyKind, NO_UPDATES_REPLY};
pub use crate::ingest::types::{FetchError, PageFetcher, Update};
pub use crate::llm::{GenerationError, LlmClient};
pub use crate::sources::Source;
