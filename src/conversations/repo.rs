use sqlx::PgPool;
use uuid::Uuid;

use crate::chat::client::MessageRole;
use crate::chat::personas::Therapist;

use super::repo_types::{Conversation, Message};

const CONVERSATION_COLUMNS: &str =
    "id, user_id, title, therapist, is_favorite, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, created_at";

/// Favorites first, then most recently touched.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Conversation>> {
    let rows = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {CONVERSATION_COLUMNS}
         FROM conversations
         WHERE user_id = $1
         ORDER BY is_favorite DESC, updated_at DESC
         LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Conversation>> {
    let row = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {CONVERSATION_COLUMNS}
         FROM conversations
         WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Partial update; absent fields keep their value. Bumps `updated_at`.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    title: Option<&str>,
    is_favorite: Option<bool>,
) -> anyhow::Result<Option<Conversation>> {
    let row = sqlx::query_as::<_, Conversation>(&format!(
        "UPDATE conversations
         SET title = COALESCE($3, title),
             is_favorite = COALESCE($4, is_favorite),
             updated_at = now()
         WHERE id = $1 AND user_id = $2
         RETURNING {CONVERSATION_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(is_favorite)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Returns false when the row did not exist (or belongs to someone else).
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(r#"DELETE FROM conversations WHERE id = $1 AND user_id = $2"#)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Full history, oldest first.
pub async fn messages_for(db: &PgPool, conversation_id: Uuid) -> anyhow::Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(&format!(
        "SELECT {MESSAGE_COLUMNS}
         FROM messages
         WHERE conversation_id = $1
         ORDER BY created_at ASC"
    ))
    .bind(conversation_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Append one immutable message and touch the parent conversation, in one
/// transaction.
pub async fn append_message(
    db: &PgPool,
    conversation_id: Uuid,
    role: MessageRole,
    content: &str,
) -> anyhow::Result<Message> {
    let mut tx = db.begin().await?;
    let message = sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (conversation_id, role, content)
         VALUES ($1, $2, $3)
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(conversation_id)
    .bind(role.as_str())
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query(r#"UPDATE conversations SET updated_at = now() WHERE id = $1"#)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(message)
}

/// One-shot import of a locally stored conversation with its history.
pub async fn create_with_messages(
    db: &PgPool,
    user_id: Uuid,
    title: &str,
    therapist: Therapist,
    is_favorite: bool,
    messages: &[(MessageRole, String)],
) -> anyhow::Result<(Conversation, usize)> {
    let mut tx = db.begin().await?;
    let conversation = sqlx::query_as::<_, Conversation>(&format!(
        "INSERT INTO conversations (user_id, title, therapist, is_favorite)
         VALUES ($1, $2, $3, $4)
         RETURNING {CONVERSATION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(title)
    .bind(therapist.as_str())
    .bind(is_favorite)
    .fetch_one(&mut *tx)
    .await?;
    for (role, content) in messages {
        sqlx::query(r#"INSERT INTO messages (conversation_id, role, content) VALUES ($1, $2, $3)"#)
            .bind(conversation.id)
            .bind(role.as_str())
            .bind(content)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok((conversation, messages.len()))
}
