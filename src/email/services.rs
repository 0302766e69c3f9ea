use tracing::debug;
use uuid::Uuid;

use crate::prefs;
use crate::state::AppState;

use super::EmailCategory;

fn greeting(first_name: Option<&str>) -> &str {
    first_name.filter(|n| !n.is_empty()).unwrap_or("there")
}

/// Security email: always sends, opt-outs do not apply.
pub async fn send_verification_email(
    state: &AppState,
    email: &str,
    first_name: Option<&str>,
    token: &str,
) -> anyhow::Result<()> {
    let url = format!(
        "{}/verify-email?token={token}",
        state.config.public_base_url
    );
    let body = format!(
        "Hi {},\n\n\
         Welcome to Solace. Please confirm your email address by opening the link below:\n\n\
         {url}\n\n\
         The link expires in {} hours. If you didn't create an account, you can ignore this email.\n",
        greeting(first_name),
        state.config.security.verification_ttl_hours,
    );
    state
        .mailer
        .send(email, "Confirm your email address", &body)
        .await
}

pub async fn send_password_reset_email(
    state: &AppState,
    email: &str,
    first_name: Option<&str>,
    token: &str,
) -> anyhow::Result<()> {
    let url = format!(
        "{}/reset-password?token={token}",
        state.config.public_base_url
    );
    let body = format!(
        "Hi {},\n\n\
         We received a request to reset your Solace password. Open the link below to choose a new one:\n\n\
         {url}\n\n\
         The link expires in {} minutes. If you didn't ask for this, you can ignore this email;\n\
         your password has not changed.\n",
        greeting(first_name),
        state.config.security.reset_ttl_minutes,
    );
    state
        .mailer
        .send(email, "Reset your password", &body)
        .await
}

pub async fn send_password_changed_email(
    state: &AppState,
    email: &str,
    first_name: Option<&str>,
) -> anyhow::Result<()> {
    let body = format!(
        "Hi {},\n\n\
         Your Solace password was just changed. If this was you, no action is needed.\n\
         If it wasn't, reset your password immediately at {}/forgot-password and contact support.\n",
        greeting(first_name),
        state.config.public_base_url,
    );
    state
        .mailer
        .send(email, "Your password was changed", &body)
        .await
}

/// Product email sent after the address is confirmed. Skipped when the user
/// opted out of the product category.
pub async fn send_welcome_email(
    state: &AppState,
    user_id: Uuid,
    email: &str,
    first_name: Option<&str>,
) -> anyhow::Result<()> {
    if !category_allowed(state, user_id, EmailCategory::Product).await? {
        debug!(user_id = %user_id, "welcome email skipped, product opt-out");
        return Ok(());
    }
    let body = format!(
        "Hi {},\n\n\
         Your email is confirmed and your Solace space is ready.\n\
         Pick a therapist persona, start a conversation, or write your first journal entry:\n\n\
         {}\n",
        greeting(first_name),
        state.config.public_base_url,
    );
    state.mailer.send(email, "Welcome to Solace", &body).await
}

async fn category_allowed(
    state: &AppState,
    user_id: Uuid,
    category: EmailCategory,
) -> anyhow::Result<bool> {
    let prefs = prefs::repo::find(&state.db, user_id).await?;
    Ok(match prefs {
        Some(p) => match category {
            EmailCategory::Product => p.product_emails,
            EmailCategory::Reminder => p.reminder_emails,
        },
        // no row yet means nothing was opted out
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_falls_back_when_name_missing_or_empty() {
        assert_eq!(greeting(None), "there");
        assert_eq!(greeting(Some("")), "there");
        assert_eq!(greeting(Some("Ada")), "Ada");
    }
}
