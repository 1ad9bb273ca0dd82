// src/ingest/types.rs
use crate::sources::Source;

/// One extracted, filtered, timestamped fragment attributed to a source.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Update {
    pub source: String, // e.g., "FBR", "PM Office"
    pub url: String,    // base URL of the source page
    pub text: String,   // whitespace-collapsed visible text
    pub time: String,   // local wall clock, "%Y-%m-%d %H:%M"
}

/// Why a single source contributed nothing.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned non-HTML content ({content_type})")]
    NotHtml { url: String, content_type: String },
    #[error("reading body of {url} failed: {message}")]
    Body { url: String, message: String },
}

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Raw markup of the source's page.
    async fn fetch_page(&self, source: &Source) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}
