use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::error::ApiError;
use crate::models::{CreatePaste, ListQuery, Paste, PastePage, UpdatePaste};
use crate::state::AppState;
use crate::store::{is_valid_paste_id, new_paste};

fn checked_id(id: &str) -> Result<&str, ApiError> {
    if is_valid_paste_id(id) {
        Ok(id)
    } else {
        Err(ApiError::InvalidId)
    }
}

pub async fn create_paste_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaste>,
) -> Result<(StatusCode, Json<Paste>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::MissingContent);
    }

    let paste = new_paste(payload.title, payload.content, payload.delete_after);
    state.store.insert(paste.clone())?;

    info!(id = %paste.id, title = %paste.title, "created paste");
    Ok((StatusCode::CREATED, Json(paste)))
}

pub async fn view_paste_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Paste>, ApiError> {
    let id = checked_id(&id)?;
    let paste = state.store.record_read(id)?;
    Ok(Json(paste))
}

pub async fn edit_paste_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePaste>,
) -> Result<Json<Paste>, ApiError> {
    let id = checked_id(&id)?;
    if payload.content.trim().is_empty() {
        return Err(ApiError::MissingContent);
    }

    let paste = state.store.update(id, payload)?;
    info!(id, "edited paste");
    Ok(Json(paste))
}

pub async fn delete_paste_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = checked_id(&id)?;
    state.store.remove(id)?;
    info!(id, "deleted paste");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pastes_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PastePage>, ApiError> {
    let pastes = state.store.list(&query, state.page_size)?;
    let page = query.page();
    Ok(Json(PastePage {
        pastes,
        page,
        next: page.saturating_add(1),
        prev: page - 1,
    }))
}
