use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{VerificationKind, VerificationToken};

/// Drop whatever token the user currently holds for this kind.
pub async fn delete_for(db: &PgPool, user_id: Uuid, kind: VerificationKind) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM verification_tokens
        WHERE user_id = $1 AND kind = $2
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    kind: VerificationKind,
    token: &str,
    expires: OffsetDateTime,
) -> anyhow::Result<VerificationToken> {
    let row = sqlx::query_as::<_, VerificationToken>(
        r#"
        INSERT INTO verification_tokens (token, kind, user_id, expires)
        VALUES ($1, $2, $3, $4)
        RETURNING id, token, kind, user_id, expires, created_at
        "#,
    )
    .bind(token)
    .bind(kind.as_str())
    .bind(user_id)
    .bind(expires)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_by_token(
    db: &PgPool,
    token: &str,
    kind: VerificationKind,
) -> anyhow::Result<Option<VerificationToken>> {
    let row = sqlx::query_as::<_, VerificationToken>(
        r#"
        SELECT id, token, kind, user_id, expires, created_at
        FROM verification_tokens
        WHERE token = $1 AND kind = $2
        "#,
    )
    .bind(token)
    .bind(kind.as_str())
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM verification_tokens WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
