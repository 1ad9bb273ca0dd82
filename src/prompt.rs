//! Prompt assembly: updates + query + language → one deterministic string.

use crate::ingest::types::Update;

/// `"{time} - {source}: {text}"`, one line per update in collection order.
pub fn render_updates(updates: &[Update]) -> String {
    updates
        .iter()
        .map(|u| format!("{} - {}: {}", u.time, u.source, u.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the model prompt. Callers never pass an empty collection; an empty
/// update set is answered with the fixed fallback reply instead.
pub fn build_prompt(updates: &[Update], query: &str, language: &str) -> String {
    let update_text = render_updates(updates);
    format!(
        r#"
You are a real-time government update assistant for Pakistani citizens.

Use the updates below to answer user queries:

{update_text}

User Query: {query}
Language: {language}

Instructions:
- Respond ONLY with real-time information from updates.
- Include date, time, and source.
- If no match is found, say "No relevant update found."
- Respond in {language}.
"#
    )
}
