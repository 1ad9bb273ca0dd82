// src/ingest/mod.rs
pub mod extract;
pub mod fetcher;
pub mod types;

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::ingest::extract::{extract_updates, now_stamp, FilterRules};
use crate::ingest::types::{FetchError, PageFetcher, Update};
use crate::sources::Source;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_fetch_total", "Source pages requested.");
        describe_counter!(
            "ingest_fetch_errors_total",
            "Source pages skipped after a fetch error."
        );
        describe_counter!(
            "ingest_extracted_total",
            "Fragments that passed the length + keyword filter."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Updates removed as exact-text duplicates."
        );
        describe_counter!(
            "ingest_kept_total",
            "Updates handed to the prompt after dedup + cap."
        );
        describe_histogram!("ingest_fetch_ms", "Page fetch time in milliseconds.");
    });
}

/// Outcome of one source: its updates, or the reason it contributed none.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: Source,
    pub result: Result<Vec<Update>, FetchError>,
}

/// Summary of one ingest round.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub updates: Vec<Update>,
    pub sources: usize,
    pub failed: usize,
    pub extracted: usize,
    pub duplicates: usize,
}

/// Fetch + extract every source. At most `concurrency` pages are in flight;
/// outcomes come back in registry order regardless.
pub async fn collect_updates(
    fetcher: &dyn PageFetcher,
    sources: &[Source],
    rules: &FilterRules,
    concurrency: usize,
) -> Vec<SourceOutcome> {
    ensure_metrics_described();

    stream::iter(sources.iter().cloned())
        .map(|source| async move {
            counter!("ingest_fetch_total").increment(1);
            let result = fetcher
                .fetch_page(&source)
                .await
                .map(|html| extract_updates(&html, &source, rules, &now_stamp()));
            SourceOutcome { source, result }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Drop exact-text duplicates (first occurrence wins), then keep the first `cap`.
/// Returns (kept, duplicates_removed).
pub fn dedup_and_cap(updates: Vec<Update>, cap: usize) -> (Vec<Update>, usize) {
    let mut seen_texts: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(updates.len().min(cap));
    let mut dedup_out = 0usize;

    for u in updates {
        if !seen_texts.insert(u.text.clone()) {
            dedup_out += 1;
            continue;
        }
        keep.push(u);
    }
    keep.truncate(cap);
    (keep, dedup_out)
}

/// Run one full round: fetch, filter, log failures, dedup, cap.
pub async fn run_once(
    fetcher: &dyn PageFetcher,
    sources: &[Source],
    rules: &FilterRules,
    concurrency: usize,
    cap: usize,
) -> IngestReport {
    let outcomes = collect_updates(fetcher, sources, rules, concurrency).await;

    let mut raw = Vec::new();
    let mut failed = 0usize;
    for o in outcomes {
        match o.result {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                failed += 1;
                tracing::warn!(error = %e, source = %o.source.name, fetcher = fetcher.name(), "source skipped");
                counter!("ingest_fetch_errors_total").increment(1);
            }
        }
    }

    let extracted = raw.len();
    let (updates, duplicates) = dedup_and_cap(raw, cap);

    counter!("ingest_extracted_total").increment(extracted as u64);
    counter!("ingest_dedup_total").increment(duplicates as u64);
    counter!("ingest_kept_total").increment(updates.len() as u64);

    tracing::info!(
        target: "ingest",
        sources = sources.len(),
        failed,
        extracted,
        duplicates,
        kept = updates.len(),
        "ingest round finished"
    );

    IngestReport {
        updates,
        sources: sources.len(),
        failed,
        extracted,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upd(source: &str, text: &str) -> Update {
        Update {
            source: source.into(),
            url: format!("https://{}.gov.pk/", source.to_lowercase()),
            text: text.into(),
            time: "2024-01-01 10:00".into(),
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let evs = vec![upd("PID", "abc"), upd("FBR", "abc"), upd("FBR", "xyz")];
        let (kept, dedup) = dedup_and_cap(evs, 50);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].source, "PID");
        assert_eq!(kept[1].text, "xyz");
        assert_eq!(dedup, 1);
    }

    #[test]
    fn cap_applies_after_dedup() {
        let mut evs = vec![upd("PID", "dup"); 10];
        evs.extend((0..60).map(|i| upd("HEC", &format!("item {i}"))));
        let (kept, dedup) = dedup_and_cap(evs, 50);
        assert_eq!(kept.len(), 50);
        assert_eq!(dedup, 9);
        assert_eq!(kept[0].text, "dup");
        assert_eq!(kept[49].text, "item 48");
    }
}
