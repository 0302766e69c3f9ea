use crate::chat::client::{ChatMessage, MessageRole};

use super::repo_types::JournalEntry;

/// Entries older than this never reach the analyze prompt.
pub const ANALYZE_ENTRY_LIMIT: i64 = 20;

const ANALYST_PROMPT: &str = "You are a reflective journaling companion. You will receive a \
user's recent journal entries with dates and self-reported moods. Summarize the recurring \
themes and how their mood has moved over the period, in second person, gently and without \
judgment. Do not diagnose or give medical advice. Keep it under 200 words.";

/// Turn recent entries (newest first, as the repo returns them) into the
/// completion request for `/journal/analyze`.
pub fn build_analysis_messages(entries: &[JournalEntry]) -> Vec<ChatMessage> {
    let mut body = String::from("Here are my recent journal entries, oldest first:\n");
    for entry in entries.iter().rev() {
        body.push_str(&format!(
            "\n[{} | mood: {}]{}\n{}\n",
            entry.created_at.date(),
            entry.mood,
            entry
                .title
                .as_deref()
                .map(|t| format!(" {t}"))
                .unwrap_or_default(),
            entry.content,
        ));
    }
    vec![
        ChatMessage::new(MessageRole::System, ANALYST_PROMPT),
        ChatMessage::new(MessageRole::User, body),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn entry(content: &str, mood: &str, days_ago: i64) -> JournalEntry {
        let at = OffsetDateTime::now_utc() - time::Duration::days(days_ago);
        JournalEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: None,
            content: content.into(),
            mood: mood.into(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn prompt_starts_with_system_and_ends_with_user() {
        let messages = build_analysis_messages(&[entry("slept badly", "low", 1)]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }

    #[test]
    fn entries_are_presented_oldest_first() {
        let messages = build_analysis_messages(&[
            entry("newest entry", "good", 0),
            entry("oldest entry", "low", 5),
        ]);
        let body = &messages[1].content;
        let oldest = body.find("oldest entry").unwrap();
        let newest = body.find("newest entry").unwrap();
        assert!(oldest < newest);
    }

    #[test]
    fn moods_appear_next_to_their_entries() {
        let messages = build_analysis_messages(&[entry("a hard week", "struggling", 2)]);
        assert!(messages[1].content.contains("mood: struggling"));
    }
}
