// src/ingest/fetcher.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::histogram;

use crate::config::FetchConfig;
use crate::ingest::types::{FetchError, PageFetcher};
use crate::sources::Source;

/// Plain GET with a browser-like user agent and a hard timeout.
/// No retries: a failing source simply contributes nothing this round.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, source: &Source) -> Result<String, FetchError> {
        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| classify(&source.url, e))?;

        // Status is deliberately not checked; error pages are filtered like any other page.
        if let Some(ct) = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_textual(ct) {
                return Err(FetchError::NotHtml {
                    url: source.url.clone(),
                    content_type: ct.to_string(),
                });
            }
        }

        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: source.url.clone(),
                }
            } else {
                FetchError::Body {
                    url: source.url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// HTML, XHTML and any `text/*` body are worth parsing.
fn is_textual(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("html") || ct.trim_start().starts_with("text/")
}
