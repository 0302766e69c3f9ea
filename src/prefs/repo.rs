use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Per-user email opt-outs. Absence of a row means nothing was opted out.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserPreference {
    pub user_id: Uuid,
    pub product_emails: bool,
    pub reminder_emails: bool,
    pub updated_at: OffsetDateTime,
}

pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserPreference>> {
    let row = sqlx::query_as::<_, UserPreference>(
        r#"
        SELECT user_id, product_emails, reminder_emails, updated_at
        FROM user_preferences
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Create-or-update; absent fields keep their current value (or the
/// opted-in default for a fresh row).
pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    product_emails: Option<bool>,
    reminder_emails: Option<bool>,
) -> anyhow::Result<UserPreference> {
    let row = sqlx::query_as::<_, UserPreference>(
        r#"
        INSERT INTO user_preferences (user_id, product_emails, reminder_emails, updated_at)
        VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE), now())
        ON CONFLICT (user_id) DO UPDATE
        SET product_emails = COALESCE($2, user_preferences.product_emails),
            reminder_emails = COALESCE($3, user_preferences.reminder_emails),
            updated_at = now()
        RETURNING user_id, product_emails, reminder_emails, updated_at
        "#,
    )
    .bind(user_id)
    .bind(product_emails)
    .bind(reminder_emails)
    .fetch_one(db)
    .await?;
    Ok(row)
}
