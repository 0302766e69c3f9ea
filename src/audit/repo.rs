use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Append-only security event. Doubles as the rate limiter's counting
/// substrate.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub details: serde_json::Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Option<Uuid>,
    action: &str,
    details: &serde_json::Value,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> anyhow::Result<AuditLog> {
    let row = sqlx::query_as::<_, AuditLog>(
        r#"
        INSERT INTO audit_log (user_id, action, details, ip, user_agent)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, action, details, ip, user_agent, created_at
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(details)
    .bind(ip)
    .bind(user_agent)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Events for `action` since `since`, matching either the request IP or the
/// email recorded in the details payload.
pub async fn count_recent(
    db: &PgPool,
    action: &str,
    email: Option<&str>,
    ip: Option<&str>,
    since: OffsetDateTime,
) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM audit_log
        WHERE action = $1
          AND created_at > $2
          AND (($3::text IS NOT NULL AND details->>'email' = $3)
            OR ($4::text IS NOT NULL AND ip = $4))
        "#,
    )
    .bind(action)
    .bind(since)
    .bind(email)
    .bind(ip)
    .fetch_one(db)
    .await?;
    Ok(count)
}
