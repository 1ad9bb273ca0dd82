//! PakInfo Bot - Binary Entrypoint
//! Boots the Axum HTTP server (chat API + static UI) on the Shuttle runtime.

use pakinfo_bot::bootstrap::{init_tracing, AppRuntime};
use pakinfo_bot::metrics::Metrics;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Picks up GEMINI_API_KEY / OPENAI_API_KEY / APP_CONFIG_PATH / SOURCES_PATH.
    let _ = dotenvy::dotenv();

    init_tracing();

    let runtime = AppRuntime::from_env()?;

    let mut router = runtime.router();
    match Metrics::init(runtime.sources.len()) {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics recorder not installed"),
    }

    Ok(router.into())
}
