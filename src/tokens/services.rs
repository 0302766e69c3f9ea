use rand::RngCore;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{repo, VerificationKind};

const TOKEN_BYTES: usize = 32;

/// Random hex token, 32 bytes of entropy.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Rotate the (user, kind) token: delete any existing row, insert a fresh
/// one, return the plaintext token for the email link.
pub async fn issue(
    db: &PgPool,
    user_id: Uuid,
    kind: VerificationKind,
    ttl: Duration,
) -> anyhow::Result<String> {
    repo::delete_for(db, user_id, kind).await?;
    let token = generate_token();
    let expires = OffsetDateTime::now_utc() + ttl;
    repo::insert(db, user_id, kind, &token, expires).await?;
    debug!(user_id = %user_id, kind = ?kind, "verification token issued");
    Ok(token)
}

/// Outcome of trying to redeem a token.
#[derive(Debug, PartialEq, Eq)]
pub enum Redemption {
    Valid { user_id: Uuid },
    Expired,
    Unknown,
}

/// Single-use redemption: the row is deleted whether it was valid or
/// expired, so stale tokens never linger.
pub async fn consume(
    db: &PgPool,
    token: &str,
    kind: VerificationKind,
) -> anyhow::Result<Redemption> {
    let Some(row) = repo::find_by_token(db, token, kind).await? else {
        return Ok(Redemption::Unknown);
    };
    repo::delete_by_id(db, row.id).await?;
    if row.is_expired(OffsetDateTime::now_utc()) {
        debug!(user_id = %row.user_id, kind = ?kind, "expired token purged");
        return Ok(Redemption::Expired);
    }
    Ok(Redemption::Valid { user_id: row.user_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        // 256 bits of entropy; a collision here means the RNG is broken
        assert_ne!(generate_token(), generate_token());
    }
}
