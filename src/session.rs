//! session.rs - in-memory chat sessions: append-only history + current language.
//!
//! Nothing here survives a restart.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Reply language; a closed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    Urdu,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Urdu];

    /// Name written into the prompt.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Urdu => "Urdu",
        }
    }

    /// Label shown in the UI selector.
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Urdu => "اردو",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Accepts the prompt name or the UI label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| t.eq_ignore_ascii_case(l.name()) || t == l.label())
            .ok_or_else(|| UnknownLanguage(t.to_string()))
    }
}

impl Serialize for Language {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub history: Vec<ChatMessage>,
    pub language: Language,
}

/// All live sessions keyed by id. Appends are serialized by the mutex, so
/// concurrent queries keep arrival order.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, ChatSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// New empty session; returns its id.
    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut m = self.inner.lock().expect("session mutex poisoned");
        m.insert(id.clone(), ChatSession::default());
        id
    }

    /// Make sure `id` exists (clients may bring their own ids).
    pub fn ensure(&self, id: &str) {
        let mut m = self.inner.lock().expect("session mutex poisoned");
        m.entry(id.to_string()).or_default();
    }

    /// Append a message. Earlier messages are never touched.
    pub fn append(&self, id: &str, msg: ChatMessage) {
        let mut m = self.inner.lock().expect("session mutex poisoned");
        m.entry(id.to_string()).or_default().history.push(msg);
    }

    pub fn history(&self, id: &str) -> Option<Vec<ChatMessage>> {
        let m = self.inner.lock().expect("session mutex poisoned");
        m.get(id).map(|s| s.history.clone())
    }

    pub fn language(&self, id: &str) -> Language {
        let m = self.inner.lock().expect("session mutex poisoned");
        m.get(id).map(|s| s.language).unwrap_or_default()
    }

    /// Switch the reply language; `false` when `id` is not a live session.
    pub fn set_language(&self, id: &str, language: Language) -> bool {
        let mut m = self.inner.lock().expect("session mutex poisoned");
        match m.get_mut(id) {
            Some(s) => {
                s.language = language;
                true
            }
            None => false,
        }
    }
}
