use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    error::{ApiError, FieldError},
    state::AppState,
};

use super::dto::{AnalyzeResponse, EntryView, MoodWindow, NewEntryRequest, Pagination};
use super::repo;
use super::repo_types::MoodCount;
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal", get(list_entries).post(create_entry))
        .route("/journal/:id", get(get_entry).delete(delete_entry))
        .route("/journal/moods", get(mood_summary))
        .route("/journal/analyze", post(analyze))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<EntryView>>, ApiError> {
    let rows = repo::list_by_user(&state.db, user_id, p.limit, p.offset).await?;
    Ok(Json(rows.into_iter().map(EntryView::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewEntryRequest>,
) -> Result<(StatusCode, Json<EntryView>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "content",
            "must not be empty",
        )]));
    }
    let entry = repo::create(
        &state.db,
        user_id,
        payload.title.as_deref(),
        payload.content.trim(),
        payload.mood,
    )
    .await?;
    info!(user_id = %user_id, entry_id = %entry.id, mood = %entry.mood, "journal entry created");
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryView>, ApiError> {
    let entry = repo::find(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("journal entry"))?;
    Ok(Json(entry.into()))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("journal entry"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn mood_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(window): Query<MoodWindow>,
) -> Result<Json<Vec<MoodCount>>, ApiError> {
    let days = window.days.clamp(1, 365);
    let since = OffsetDateTime::now_utc() - Duration::days(days);
    let counts = repo::mood_counts(&state.db, user_id, since).await?;
    Ok(Json(counts))
}

/// Summarize recent entries with the LLM.
#[instrument(skip(state))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let entries = repo::recent(&state.db, user_id, services::ANALYZE_ENTRY_LIMIT).await?;
    if entries.is_empty() {
        return Err(ApiError::bad_request(
            "write a journal entry first, then ask for an analysis",
        ));
    }

    let messages = services::build_analysis_messages(&entries);
    let summary = state.llm.complete(&messages).await.map_err(|e| {
        warn!(user_id = %user_id, error = %e, "journal analysis failed");
        ApiError::from(e)
    })?;

    info!(user_id = %user_id, entries = entries.len(), "journal analyzed");
    Ok(Json(AnalyzeResponse {
        summary,
        entries_considered: entries.len(),
    }))
}
