use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::JournalEntry;
use super::Mood;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    pub title: Option<String>,
    pub content: String,
    pub mood: Mood,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub mood: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<JournalEntry> for EntryView {
    fn from(e: JournalEntry) -> Self {
        Self {
            id: e.id,
            title: e.title,
            content: e.content,
            mood: e.mood,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoodWindow {
    #[serde(default = "default_days")]
    pub days: i64,
}
fn default_days() -> i64 {
    30
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: String,
    pub entries_considered: usize,
}
