use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub mood: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One bucket of the mood-tracking chart.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}
