//! Extraction + relevance filter for one fetched page.
//!
//! Only tag kind and keyword presence are used; headings, metadata dates and
//! article boundaries are ignored.

use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{Html, Selector};

use crate::config::ExtractConfig;
use crate::ingest::types::Update;
use crate::sources::Source;

/// Element kinds scanned for fragments: list item, paragraph, block, span, link.
pub const CANDIDATE_TAGS: &str = "li, p, div, span, a";

/// Text under these elements is never visible.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Thresholds and keywords applied to each fragment.
#[derive(Debug, Clone)]
pub struct FilterRules {
    pub max_elements: usize,
    pub min_chars: usize,
    /// Lowercase keywords.
    pub keywords: Vec<String>,
}

impl From<&ExtractConfig> for FilterRules {
    fn from(cfg: &ExtractConfig) -> Self {
        Self {
            max_elements: cfg.max_elements,
            min_chars: cfg.min_chars,
            keywords: cfg.keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl Default for FilterRules {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

/// Local wall clock at minute precision, the stamp carried by every update.
pub fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Collapse whitespace runs to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// `true` iff the fragment is long enough and mentions at least one keyword.
pub fn is_relevant(text: &str, rules: &FilterRules) -> bool {
    if text.is_empty() || text.chars().count() < rules.min_chars {
        return false;
    }
    let lower = text.to_lowercase();
    rules.keywords.iter().any(|kw| lower.contains(kw.as_str()))
}

/// Visible text of the first `max_elements` candidate elements, in document order.
/// Empty fragments are kept so callers see exactly what was scanned.
pub fn candidate_fragments(html: &str, max_elements: usize) -> Vec<String> {
    let doc = Html::parse_document(html);
    let sel = match Selector::parse(CANDIDATE_TAGS) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    doc.select(&sel)
        .take(max_elements)
        .map(|el| {
            let pieces: Vec<&str> = el
                .descendants()
                .filter_map(|node| {
                    let text = node.value().as_text()?;
                    let hidden = node
                        .ancestors()
                        .take_while(|a| *a != *el)
                        .any(|a| {
                            a.value()
                                .as_element()
                                .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
                        });
                    if hidden {
                        return None;
                    }
                    let t = text.trim();
                    (!t.is_empty()).then_some(t)
                })
                .collect();
            collapse_whitespace(&pieces.join(" "))
        })
        .collect()
}

/// Turn one page into updates for `source`, all stamped with `stamp`.
pub fn extract_updates(html: &str, source: &Source, rules: &FilterRules, stamp: &str) -> Vec<Update> {
    candidate_fragments(html, rules.max_elements)
        .into_iter()
        .filter(|text| is_relevant(text, rules))
        .map(|text| Update {
            source: source.name.clone(),
            url: source.url.clone(),
            text,
            time: stamp.to_string(),
        })
        .collect()
}
