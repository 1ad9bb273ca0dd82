// src/config/mod.rs
//! Application configuration: TOML file with per-field defaults.
//!
//! Lookup order:
//! 1) $APP_CONFIG_PATH (must exist)
//! 2) config/app.toml
//! 3) built-in defaults

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ai::LlmConfig;

pub const ENV_APP_CONFIG_PATH: &str = "APP_CONFIG_PATH";
pub const DEFAULT_APP_CONFIG_PATH: &str = "config/app.toml";

/// Relevance keywords; any single case-insensitive substring hit keeps a fragment.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "prime minister",
    "president",
    "minister",
    "announcement",
    "govt",
    "government",
    "update",
    "notice",
    "press release",
    "notification",
    "cabinet",
    "policy",
    "development",
];

const MAX_CONCURRENCY: usize = 16;

fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}
fn default_concurrency() -> usize {
    1
}
fn default_max_elements() -> usize {
    100
}
fn default_min_chars() -> usize {
    40
}
fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}
fn default_max_updates() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Number of sources fetched at once; 1 keeps the strictly sequential walk.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
            min_chars: default_min_chars(),
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_max_updates")]
    pub max_updates: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_updates: default_max_updates(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Parse a TOML document and sanitize it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing app config toml")?;
        cfg.sanitize()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading app config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_APP_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("APP_CONFIG_PATH points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_APP_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        let mut cfg = AppConfig::default();
        cfg.sanitize()?;
        Ok(cfg)
    }

    /// Replace nonsensical values with defaults.
    pub fn sanitize(&mut self) -> Result<()> {
        if self.fetch.timeout_secs == 0 {
            self.fetch.timeout_secs = default_timeout_secs();
        }
        if self.fetch.user_agent.trim().is_empty() {
            self.fetch.user_agent = default_user_agent();
        }
        self.fetch.concurrency = self.fetch.concurrency.clamp(1, MAX_CONCURRENCY);

        if self.extract.max_elements == 0 {
            self.extract.max_elements = default_max_elements();
        }
        self.extract.keywords = clean_keywords(std::mem::take(&mut self.extract.keywords));
        if self.extract.keywords.is_empty() {
            self.extract.keywords = default_keywords();
        }

        if self.collection.max_updates == 0 {
            self.collection.max_updates = default_max_updates();
        }

        self.llm.sanitize()
    }
}

/// Trim, lowercase and drop empty/duplicate keywords, keeping first-seen order.
fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let k = it.trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}
