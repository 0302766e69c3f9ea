use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit::{self, services::ClientMeta},
    auth::services::AuthUser,
    chat::client::MessageRole,
    error::{ApiError, FieldError},
    journal,
    state::AppState,
};

use super::dto::{
    ConversationDetails, ConversationSummary, CreateConversationRequest, MessageView, NewMessage,
    Pagination, SyncRequest, SyncResponse, UpdateConversationRequest,
};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/conversations/:id",
            get(get_conversation)
                .patch(update_conversation)
                .delete(delete_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(list_messages).post(append_message),
        )
        .route("/sync", post(sync_local_state))
}

/// Stored history holds user/assistant turns only; the system prompt is
/// reconstructed from the persona on every completion.
fn validate_stored_messages(messages: &[NewMessage]) -> Result<(), ApiError> {
    let mut fields = Vec::new();
    if messages.iter().any(|m| m.role == MessageRole::System) {
        fields.push(FieldError::new("messages", "system messages cannot be stored"));
    }
    if messages.iter().any(|m| m.content.trim().is_empty()) {
        fields.push(FieldError::new("messages", "message content must not be blank"));
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

#[instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let rows = repo::list_by_user(&state.db, user_id, p.limit, p.offset).await?;
    Ok(Json(rows.into_iter().map(ConversationSummary::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationDetails>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "title",
            "must not be empty",
        )]));
    }
    validate_stored_messages(&payload.messages)?;

    let initial: Vec<(MessageRole, String)> = payload
        .messages
        .into_iter()
        .map(|m| (m.role, m.content))
        .collect();
    let (conversation, _) = repo::create_with_messages(
        &state.db,
        user_id,
        payload.title.trim(),
        payload.therapist,
        false,
        &initial,
    )
    .await?;
    let messages = repo::messages_for(&state.db, conversation.id).await?;

    info!(user_id = %user_id, conversation_id = %conversation.id, "conversation created");
    Ok((
        StatusCode::CREATED,
        Json(ConversationDetails {
            summary: conversation.into(),
            messages: messages.into_iter().map(MessageView::from).collect(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationDetails>, ApiError> {
    let conversation = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;
    let messages = repo::messages_for(&state.db, conversation.id).await?;
    Ok(Json(ConversationDetails {
        summary: conversation.into(),
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateConversationRequest>,
) -> Result<Json<ConversationSummary>, ApiError> {
    if payload
        .title
        .as_deref()
        .is_some_and(|t| t.trim().is_empty())
    {
        return Err(ApiError::Validation(vec![FieldError::new(
            "title",
            "must not be empty",
        )]));
    }
    let updated = repo::update(
        &state.db,
        user_id,
        id,
        payload.title.as_deref().map(str::trim),
        payload.is_favorite,
    )
    .await?
    .ok_or(ApiError::NotFound("conversation"))?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn delete_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("conversation"));
    }
    info!(user_id = %user_id, conversation_id = %id, "conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    // ownership check before touching the messages table
    repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;
    let messages = repo::messages_for(&state.db, id).await?;
    Ok(Json(messages.into_iter().map(MessageView::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn append_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewMessage>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    validate_stored_messages(std::slice::from_ref(&payload))?;
    repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("conversation"))?;
    let message = repo::append_message(&state.db, id, payload.role, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

/// Bulk import of the anonymous local-storage mirror, called once after
/// login. The client clears its local copy on success.
#[instrument(skip(state, payload))]
pub async fn sync_local_state(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    client: ClientMeta,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    for conversation in &payload.conversations {
        validate_stored_messages(&conversation.messages)?;
    }

    let mut conversations = 0usize;
    let mut messages = 0usize;
    for item in payload.conversations {
        let history: Vec<(MessageRole, String)> = item
            .messages
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();
        let title = if item.title.trim().is_empty() {
            "Imported conversation"
        } else {
            item.title.trim()
        };
        let (_, imported) = repo::create_with_messages(
            &state.db,
            user_id,
            title,
            item.therapist,
            item.is_favorite,
            &history,
        )
        .await?;
        conversations += 1;
        messages += imported;
    }

    let mut journal_entries = 0usize;
    for entry in payload.journal {
        if entry.content.trim().is_empty() {
            warn!(user_id = %user_id, "skipping blank journal entry in sync");
            continue;
        }
        journal::repo::create(
            &state.db,
            user_id,
            entry.title.as_deref(),
            entry.content.trim(),
            entry.mood,
        )
        .await?;
        journal_entries += 1;
    }

    audit::services::record(
        &state.db,
        audit::actions::LOCAL_STATE_SYNCED,
        Some(user_id),
        json!({
            "conversations": conversations,
            "messages": messages,
            "journal_entries": journal_entries,
        }),
        &client,
    )
    .await;

    info!(user_id = %user_id, conversations, messages, journal_entries, "local state synced");
    Ok(Json(SyncResponse {
        conversations,
        messages,
        journal_entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: MessageRole, content: &str) -> NewMessage {
        NewMessage {
            role,
            content: content.into(),
        }
    }

    #[test]
    fn stored_history_rejects_system_role() {
        let err = validate_stored_messages(&[msg(MessageRole::System, "prompt injection")]);
        assert!(err.is_err());
    }

    #[test]
    fn stored_history_rejects_blank_content() {
        let err = validate_stored_messages(&[msg(MessageRole::User, "   ")]);
        assert!(err.is_err());
    }

    #[test]
    fn stored_history_accepts_user_and_assistant_turns() {
        let ok = validate_stored_messages(&[
            msg(MessageRole::User, "hello"),
            msg(MessageRole::Assistant, "hi, how are you feeling?"),
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn pagination_defaults_match_the_client() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn sync_request_tolerates_missing_sections() {
        let req: SyncRequest = serde_json::from_str("{}").unwrap();
        assert!(req.conversations.is_empty());
        assert!(req.journal.is_empty());
    }
}
