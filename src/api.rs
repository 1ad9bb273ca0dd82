use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::chat::{ChatError, ChatOutcome, ChatService, ReplyKind};
use crate::ingest::types::Update;
use crate::session::{ChatMessage, Language};
use crate::sources::Source;

pub const STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/chat", post(chat))
        .route("/api/sessions/{id}/history", get(session_history))
        .route("/api/sessions/{id}/language", put(set_session_language))
        .route("/api/languages", get(languages))
        .route("/api/sources", get(sources))
        .route("/api/updates", get(updates))
        .fallback_service(ServeDir::new(STATIC_DIR))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}

#[derive(serde::Deserialize)]
struct ChatReq {
    #[serde(default)]
    session_id: Option<String>,
    message: String,
    #[serde(default)]
    language: Option<String>, // absent: keep the session language
}

#[derive(serde::Serialize)]
struct ChatResp {
    session_id: String,
    reply: String,
    kind: ReplyKind,
    updates_used: usize,
    language: Language,
}

async fn chat(State(state): State<AppState>, Json(body): Json<ChatReq>) -> Result<Json<ChatResp>, ApiError> {
    let language = body
        .language
        .as_deref()
        .map(str::parse::<Language>)
        .transpose()
        .map_err(|e| bad_request(e.to_string()))?;

    let sessions = state.chat.sessions();
    let session_id = match body.session_id.filter(|s| !s.trim().is_empty()) {
        Some(id) => {
            sessions.ensure(&id);
            id
        }
        None => sessions.create(),
    };
    if let Some(lang) = language {
        // session was created or ensured just above
        let _ = sessions.set_language(&session_id, lang);
    }

    let ChatOutcome {
        reply,
        kind,
        updates_used,
        language,
    } = state
        .chat
        .handle_query(&session_id, &body.message)
        .await
        .map_err(|e| match e {
            ChatError::EmptyQuery => bad_request(e.to_string()),
        })?;

    Ok(Json(ChatResp {
        session_id,
        reply,
        kind,
        updates_used,
        language,
    }))
}

async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    state
        .chat
        .sessions()
        .history(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown session '{id}'")))
}

#[derive(serde::Deserialize, serde::Serialize)]
struct LanguageBody {
    language: Language,
}

async fn set_session_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LanguageBody>,
) -> Result<Json<LanguageBody>, ApiError> {
    if state.chat.sessions().set_language(&id, body.language) {
        Ok(Json(body))
    } else {
        Err((StatusCode::NOT_FOUND, format!("unknown session '{id}'")))
    }
}

#[derive(serde::Serialize)]
struct LanguageOut {
    name: &'static str,
    label: &'static str,
}

async fn languages() -> Json<Vec<LanguageOut>> {
    Json(
        Language::ALL
            .into_iter()
            .map(|l| LanguageOut {
                name: l.name(),
                label: l.label(),
            })
            .collect(),
    )
}

async fn sources(State(state): State<AppState>) -> Json<Vec<Source>> {
    Json(state.chat.sources().to_vec())
}

#[derive(serde::Serialize)]
struct UpdatesOut {
    sources: usize,
    failed: usize,
    duplicates: usize,
    updates: Vec<Update>,
}

async fn updates(State(state): State<AppState>) -> Json<UpdatesOut> {
    let report = state.chat.fetch_updates().await;
    Json(UpdatesOut {
        sources: report.sources,
        failed: report.failed,
        duplicates: report.duplicates,
        updates: report.updates,
    })
}
