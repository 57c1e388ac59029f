use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shared::{CreateListRequest, ListPatch, ReorderRequest, Task, TaskList};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

pub async fn list_lists(State(state): State<AppState>) -> Result<Json<Vec<TaskList>>> {
    Ok(Json(state.repo.list_lists().await?))
}

pub async fn get_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<TaskList>> {
    Ok(Json(state.repo.get_list(id).await?))
}

/// Appends the list after the board's last one.
pub async fn create_list(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateListRequest>,
) -> Result<(StatusCode, Json<TaskList>)> {
    let list = state.repo.create_list(request.validate()?).await?;
    tracing::info!(
        list_id = list.id,
        board_id = list.board_id,
        position = list.position,
        "created list"
    );
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn update_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<ListPatch>,
) -> Result<Json<TaskList>> {
    Ok(Json(state.repo.update_list(id, patch.validate()?).await?))
}

/// Deletes the list and its tasks. Remaining lists keep their positions.
pub async fn delete_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    let removed = state.repo.delete_list(id).await?;
    state.uploads.remove_all(&removed).await;
    tracing::info!(list_id = id, attachments = removed.len(), "deleted list");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.repo.tasks_of_list(id).await?))
}

pub async fn reorder_tasks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.repo.reorder_tasks(id, request.ids).await?))
}
