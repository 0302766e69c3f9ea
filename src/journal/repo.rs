use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{JournalEntry, MoodCount};
use super::Mood;

const ENTRY_COLUMNS: &str = "id, user_id, title, content, mood, created_at, updated_at";

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<JournalEntry>> {
    let rows = sqlx::query_as::<_, JournalEntry>(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM journal_entries
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<JournalEntry>> {
    let row = sqlx::query_as::<_, JournalEntry>(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM journal_entries
         WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    title: Option<&str>,
    content: &str,
    mood: Mood,
) -> anyhow::Result<JournalEntry> {
    let row = sqlx::query_as::<_, JournalEntry>(&format!(
        "INSERT INTO journal_entries (user_id, title, content, mood)
         VALUES ($1, $2, $3, $4)
         RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(mood.as_str())
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(r#"DELETE FROM journal_entries WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Mood histogram over the trailing window.
pub async fn mood_counts(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<MoodCount>> {
    let rows = sqlx::query_as::<_, MoodCount>(
        r#"
        SELECT mood, COUNT(*) AS count
        FROM journal_entries
        WHERE user_id = $1 AND created_at > $2
        GROUP BY mood
        ORDER BY count DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Most recent entries fed to the analyze prompt, newest first.
pub async fn recent(db: &PgPool, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<JournalEntry>> {
    let rows = sqlx::query_as::<_, JournalEntry>(&format!(
        "SELECT {ENTRY_COLUMNS}
         FROM journal_entries
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
