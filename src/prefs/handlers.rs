use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    audit::{self, services::ClientMeta},
    auth::dto::MessageResponse,
    auth::repo_types::User,
    auth::services::AuthUser,
    email::EmailCategory,
    error::ApiError,
    state::AppState,
};

use super::dto::{PreferencesView, UnsubscribeRequest, UpdatePreferencesRequest};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/preferences", get(get_preferences).put(update_preferences))
        .route("/unsubscribe", post(unsubscribe))
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PreferencesView>, ApiError> {
    let prefs = repo::find(&state.db, user_id)
        .await?
        .map(PreferencesView::from)
        .unwrap_or_default();
    Ok(Json(prefs))
}

#[instrument(skip(state, payload))]
pub async fn update_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesView>, ApiError> {
    let prefs = repo::upsert(
        &state.db,
        user_id,
        payload.product_emails,
        payload.reminder_emails,
    )
    .await?;
    info!(user_id = %user_id, "preferences updated");
    Ok(Json(prefs.into()))
}

/// Footer-link unsubscribe. The response never says whether the address is
/// registered.
#[instrument(skip(state, payload))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(payload): Json<UnsubscribeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let (product, reminder) = match payload.category {
            EmailCategory::Product => (Some(false), None),
            EmailCategory::Reminder => (None, Some(false)),
        };
        repo::upsert(&state.db, user.id, product, reminder).await?;
        audit::services::record(
            &state.db,
            audit::actions::EMAIL_UNSUBSCRIBED,
            Some(user.id),
            json!({ "email": email, "category": payload.category.as_str() }),
            &client,
        )
        .await;
        info!(user_id = %user.id, category = payload.category.as_str(), "unsubscribed");
    }

    Ok(Json(MessageResponse::new(
        "You have been unsubscribed from this category.",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_opted_in() {
        let view = PreferencesView::default();
        assert!(view.product_emails);
        assert!(view.reminder_emails);
    }

    #[test]
    fn unsubscribe_request_parses_category() {
        let req: UnsubscribeRequest =
            serde_json::from_str(r#"{"email":"a@b.co","category":"product"}"#).unwrap();
        assert_eq!(req.category, EmailCategory::Product);
    }
}
