pub mod repo;
pub mod services;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// What a verification token unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    EmailVerification,
    PasswordReset,
}

impl VerificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Single-use token row. At most one exists per (user, kind).
#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub id: Uuid,
    pub token: String,
    pub kind: String,
    pub user_id: Uuid,
    pub expires: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl VerificationToken {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn row(expires: OffsetDateTime) -> VerificationToken {
        VerificationToken {
            id: Uuid::new_v4(),
            token: "abc".into(),
            kind: VerificationKind::PasswordReset.as_str().into(),
            user_id: Uuid::new_v4(),
            expires,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = OffsetDateTime::now_utc();
        assert!(row(now).is_expired(now));
        assert!(row(now - Duration::seconds(1)).is_expired(now));
        assert!(!row(now + Duration::seconds(1)).is_expired(now));
    }

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(VerificationKind::EmailVerification.as_str(), "email_verification");
        assert_eq!(VerificationKind::PasswordReset.as_str(), "password_reset");
    }
}
