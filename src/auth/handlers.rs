use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    audit::{self, services::ClientMeta},
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RefreshRequest, RegisterRequest, ResendVerificationRequest, ResetPasswordRequest,
            VerifyEmailQuery,
        },
        repo_types::User,
        services::{
            hash_password, is_valid_email, validate_new_password, verify_password, AuthUser,
            JwtKeys,
        },
    },
    email,
    error::{ApiError, FieldError},
    state::AppState,
    tokens::{
        services::{self as token_services, Redemption},
        VerificationKind,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/verify-email", get(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    let mut fields = Vec::new();
    if !is_valid_email(&payload.email) {
        fields.push(FieldError::new("email", "invalid email"));
    }
    if let Some(err) = validate_new_password(&payload.password) {
        fields.push(err);
    }
    if !fields.is_empty() {
        warn!(email = %payload.email, "register validation failed");
        return Err(ApiError::Validation(fields));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
    )
    .await?;

    // verification is opportunistic; a failed send must not lose the account
    let ttl = Duration::hours(state.config.security.verification_ttl_hours);
    match token_services::issue(&state.db, user.id, VerificationKind::EmailVerification, ttl).await
    {
        Ok(token) => {
            if let Err(e) = email::services::send_verification_email(
                &state,
                &user.email,
                user.first_name.as_deref(),
                &token,
            )
            .await
            {
                warn!(user_id = %user.id, error = %e, "verification email failed");
            }
        }
        Err(e) => error!(user_id = %user.id, error = %e, "verification token issue failed"),
    }

    audit::services::record(
        &state.db,
        audit::actions::USER_REGISTERED,
        Some(user.id),
        json!({ "email": user.email }),
        &client,
    )
    .await;

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = keys.sign_pair(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation(vec![FieldError::new(
            "email",
            "invalid email",
        )]));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        // same 401 as a wrong password so the response does not confirm
        // whether the address is registered
        warn!(email = %payload.email, "login unknown email");
        audit::services::record(
            &state.db,
            audit::actions::LOGIN_FAILED,
            None,
            json!({ "email": payload.email, "reason": "unknown_email" }),
            &client,
        )
        .await;
        return Err(ApiError::unauthorized("invalid credentials"));
    };

    if user.is_locked(OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, "login attempt on locked account");
        return Err(ApiError::Forbidden(
            "account temporarily locked, try again later".into(),
        ));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        let attempts = User::record_login_failure(&state.db, user.id).await?;
        audit::services::record(
            &state.db,
            audit::actions::LOGIN_FAILED,
            Some(user.id),
            json!({ "email": user.email, "reason": "wrong_password", "attempts": attempts }),
            &client,
        )
        .await;
        if attempts >= state.config.security.max_failed_logins {
            let until =
                OffsetDateTime::now_utc() + Duration::minutes(state.config.security.lockout_minutes);
            User::lock(&state.db, user.id, until).await?;
            audit::services::record(
                &state.db,
                audit::actions::ACCOUNT_LOCKED,
                Some(user.id),
                json!({ "email": user.email, "until": until.unix_timestamp() }),
                &client,
            )
            .await;
            warn!(user_id = %user.id, attempts, "account locked");
        }
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    User::record_login_success(&state.db, user.id).await?;
    audit::services::record(
        &state.db,
        audit::actions::LOGIN_SUCCEEDED,
        Some(user.id),
        json!({ "email": user.email }),
        &client,
    )
    .await;

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = keys.sign_pair(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("user no longer exists"))?;

    let (access_token, refresh_token) = keys.sign_pair(user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("user no longer exists"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation(vec![FieldError::new(
            "email",
            "invalid email",
        )]));
    }

    if audit::services::over_email_rate_limit(
        &state.db,
        &state.config.security,
        audit::actions::PASSWORD_RESET_REQUESTED,
        &payload.email,
        &client,
    )
    .await?
    {
        return Err(ApiError::TooManyRequests);
    }

    let user = User::find_by_email(&state.db, &payload.email).await?;

    // audited whether or not the account exists; these rows are what the
    // rate limiter counts
    audit::services::record(
        &state.db,
        audit::actions::PASSWORD_RESET_REQUESTED,
        user.as_ref().map(|u| u.id),
        json!({ "email": payload.email }),
        &client,
    )
    .await;

    if let Some(user) = user {
        let ttl = Duration::minutes(state.config.security.reset_ttl_minutes);
        let token =
            token_services::issue(&state.db, user.id, VerificationKind::PasswordReset, ttl).await?;
        if let Err(e) = email::services::send_password_reset_email(
            &state,
            &user.email,
            user.first_name.as_deref(),
            &token,
        )
        .await
        {
            warn!(user_id = %user.id, error = %e, "reset email failed");
        }
    }

    // same body either way
    Ok(Json(MessageResponse::email_on_its_way()))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(err) = validate_new_password(&payload.password) {
        return Err(ApiError::Validation(vec![err]));
    }

    let user_id = match token_services::consume(
        &state.db,
        &payload.token,
        VerificationKind::PasswordReset,
    )
    .await?
    {
        Redemption::Valid { user_id } => user_id,
        Redemption::Expired => {
            return Err(ApiError::bad_request("reset link has expired"));
        }
        Redemption::Unknown => return Err(ApiError::NotFound("reset token")),
    };

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let hash = hash_password(&payload.password)?;
    User::set_password(&state.db, user.id, &hash).await?;

    audit::services::record(
        &state.db,
        audit::actions::PASSWORD_RESET_COMPLETED,
        Some(user.id),
        json!({ "email": user.email }),
        &client,
    )
    .await;

    if let Err(e) =
        email::services::send_password_changed_email(&state, &user.email, user.first_name.as_deref())
            .await
    {
        warn!(user_id = %user.id, error = %e, "password-changed email failed");
    }

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageResponse::new("Your password has been updated.")))
}

#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    client: ClientMeta,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = match token_services::consume(
        &state.db,
        &query.token,
        VerificationKind::EmailVerification,
    )
    .await?
    {
        Redemption::Valid { user_id } => user_id,
        Redemption::Expired => {
            return Err(ApiError::bad_request(
                "verification link has expired, request a new one",
            ));
        }
        Redemption::Unknown => return Err(ApiError::NotFound("verification token")),
    };

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    User::mark_email_verified(&state.db, user.id).await?;
    audit::services::record(
        &state.db,
        audit::actions::EMAIL_VERIFIED,
        Some(user.id),
        json!({ "email": user.email }),
        &client,
    )
    .await;

    if let Err(e) = email::services::send_welcome_email(
        &state,
        user.id,
        &user.email,
        user.first_name.as_deref(),
    )
    .await
    {
        warn!(user_id = %user.id, error = %e, "welcome email failed");
    }

    info!(user_id = %user.id, "email verified");
    Ok(Json(MessageResponse::new("Email address confirmed.")))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(mut payload): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation(vec![FieldError::new(
            "email",
            "invalid email",
        )]));
    }

    if audit::services::over_email_rate_limit(
        &state.db,
        &state.config.security,
        audit::actions::VERIFICATION_RESENT,
        &payload.email,
        &client,
    )
    .await?
    {
        return Err(ApiError::TooManyRequests);
    }

    let user = User::find_by_email(&state.db, &payload.email).await?;

    audit::services::record(
        &state.db,
        audit::actions::VERIFICATION_RESENT,
        user.as_ref().map(|u| u.id),
        json!({ "email": payload.email }),
        &client,
    )
    .await;

    // nothing to do for unknown addresses or already-verified accounts,
    // but the response must not say which case it was
    if let Some(user) = user.filter(|u| u.email_verified.is_none()) {
        let ttl = Duration::hours(state.config.security.verification_ttl_hours);
        let token =
            token_services::issue(&state.db, user.id, VerificationKind::EmailVerification, ttl)
                .await?;
        if let Err(e) = email::services::send_verification_email(
            &state,
            &user.email,
            user.first_name.as_deref(),
            &token,
        )
        .await
        {
            warn!(user_id = %user.id, error = %e, "verification resend failed");
        }
    }

    Ok(Json(MessageResponse::email_on_its_way()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Someone@Example.COM "), "someone@example.com");
    }

    #[test]
    fn anti_enumeration_body_is_constant() {
        let a = serde_json::to_string(&MessageResponse::email_on_its_way()).unwrap();
        let b = serde_json::to_string(&MessageResponse::email_on_its_way()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn auth_response_serializes_public_fields_only() {
        let user = crate::auth::repo_types::User {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".into(),
            password_hash: "secret-hash".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            role: "user".into(),
            email_verified: None,
            failed_login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let response = AuthResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            user: user.into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("secret-hash"));
    }
}
