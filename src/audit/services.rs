use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SecurityConfig;

use super::repo;

/// Best-effort client identity pulled from request headers.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        // first hop of x-forwarded-for is the original client
        let ip = header_str("x-forwarded-for")
            .map(|v| v.split(',').next().unwrap_or("").trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| header_str("x-real-ip"));
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        Ok(Self { ip, user_agent })
    }
}

/// Append an audit row. Auditing must never fail the request it describes,
/// so errors are logged and swallowed.
pub async fn record(
    db: &PgPool,
    action: &str,
    user_id: Option<Uuid>,
    details: serde_json::Value,
    client: &ClientMeta,
) {
    match repo::insert(
        db,
        user_id,
        action,
        &details,
        client.ip.as_deref(),
        client.user_agent.as_deref(),
    )
    .await
    {
        Ok(row) => debug!(action, audit_id = %row.id, "audit recorded"),
        Err(e) => warn!(action, error = %e, "audit insert failed"),
    }
}

/// Deny once the trailing window already holds `email_rate_max` events for
/// this action and email/IP.
pub async fn over_email_rate_limit(
    db: &PgPool,
    security: &SecurityConfig,
    action: &str,
    email: &str,
    client: &ClientMeta,
) -> anyhow::Result<bool> {
    let since = OffsetDateTime::now_utc() - Duration::minutes(security.email_rate_window_minutes);
    let count = repo::count_recent(db, action, Some(email), client.ip.as_deref(), since).await?;
    if count >= security.email_rate_max {
        warn!(action, email, count, "rate limit exceeded");
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn meta_for(req: Request<()>) -> ClientMeta {
        let (mut parts, _) = req.into_parts();
        ClientMeta::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn forwarded_for_takes_first_hop() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("user-agent", "test-agent/1.0")
            .body(())
            .unwrap();
        let meta = meta_for(req).await;
        assert_eq!(meta.ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("test-agent/1.0"));
    }

    #[tokio::test]
    async fn falls_back_to_real_ip() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.4")
            .body(())
            .unwrap();
        let meta = meta_for(req).await;
        assert_eq!(meta.ip.as_deref(), Some("198.51.100.4"));
    }

    #[tokio::test]
    async fn missing_headers_yield_none() {
        let meta = meta_for(Request::builder().body(()).unwrap()).await;
        assert!(meta.ip.is_none());
        assert!(meta.user_agent.is_none());
    }
}
