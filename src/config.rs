use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Thresholds for lockout, rate limiting and token lifetimes.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub max_failed_logins: i32,
    pub lockout_minutes: i64,
    pub email_rate_window_minutes: i64,
    pub email_rate_max: i64,
    pub verification_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Base URL used in links embedded in outgoing email.
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub llm: LlmConfig,
    pub security: SecurityConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "solace"),
            audience: env_or("JWT_AUDIENCE", "solace-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let smtp = SmtpConfig {
            host: env_or("SMTP_HOST", "localhost"),
            port: env_parse("SMTP_PORT", 587),
            username: env_or("SMTP_USERNAME", ""),
            password: env_or("SMTP_PASSWORD", ""),
            from: env_or("SMTP_FROM", "Solace <no-reply@solace.app>"),
        };
        let llm = LlmConfig {
            base_url: env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            api_key: env_or("LLM_API_KEY", ""),
            model: env_or("LLM_MODEL", "gpt-4o-mini"),
            max_tokens: env_parse("LLM_MAX_TOKENS", 1024),
            temperature: env_parse("LLM_TEMPERATURE", 0.7),
        };
        let security = SecurityConfig {
            max_failed_logins: env_parse("MAX_FAILED_LOGINS", 5),
            lockout_minutes: env_parse("LOCKOUT_MINUTES", 15),
            email_rate_window_minutes: env_parse("EMAIL_RATE_WINDOW_MINUTES", 15),
            email_rate_max: env_parse("EMAIL_RATE_MAX", 3),
            verification_ttl_hours: env_parse("VERIFICATION_TTL_HOURS", 24),
            reset_ttl_minutes: env_parse("RESET_TTL_MINUTES", 60),
        };
        Ok(Self {
            database_url,
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
            jwt,
            smtp,
            llm,
            security,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("TEST_ENV_PARSE_GARBAGE", "not-a-number");
        assert_eq!(env_parse("TEST_ENV_PARSE_GARBAGE", 42i64), 42);
        std::env::remove_var("TEST_ENV_PARSE_GARBAGE");
    }

    #[test]
    fn env_or_uses_default_when_unset() {
        assert_eq!(env_or("TEST_ENV_OR_MISSING", "fallback"), "fallback");
    }
}
