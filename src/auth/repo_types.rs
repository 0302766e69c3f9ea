use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    /// Set when the address was confirmed; null until then.
    pub email_verified: Option<OffsetDateTime>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_locked(&self, now: OffsetDateTime) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user(locked_until: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.co".into(),
            password_hash: "x".into(),
            first_name: None,
            last_name: None,
            role: "user".into(),
            email_verified: None,
            failed_login_attempts: 0,
            locked_until,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn lock_only_holds_while_in_the_future() {
        let now = OffsetDateTime::now_utc();
        assert!(!user(None).is_locked(now));
        assert!(!user(Some(now - Duration::minutes(1))).is_locked(now));
        assert!(user(Some(now + Duration::minutes(1))).is_locked(now));
    }

    #[test]
    fn password_hash_never_serializes() {
        let json = serde_json::to_string(&user(None)).unwrap();
        assert!(!json.contains("password_hash"));
    }
}
