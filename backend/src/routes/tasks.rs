use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shared::{CreateTaskRequest, MoveTaskRequest, MoveTaskResponse, Task, TaskPatch};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.repo.list_tasks().await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Task>> {
    Ok(Json(state.repo.get_task(id).await?))
}

/// Appends the task after the list's last one.
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let task = state.repo.create_task(request.validate()?).await?;
    tracing::info!(
        task_id = task.id,
        list_id = task.list_id,
        position = task.position,
        "created task"
    );
    Ok((StatusCode::CREATED, Json(task)))
}

/// Writes whichever fields are present. Changing `listId` or `position` here
/// does not renumber siblings; use the move endpoint for that.
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<Task>> {
    Ok(Json(state.repo.update_task(id, patch.validate()?).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    let removed = state.repo.delete_task(id).await?;
    state.uploads.remove_all(&removed).await;
    tracing::info!(task_id = id, attachments = removed.len(), "deleted task");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<MoveTaskRequest>,
) -> Result<Json<MoveTaskResponse>> {
    let moved = state
        .repo
        .move_task(id, request.list_id, request.index)
        .await?;
    Ok(Json(MoveTaskResponse {
        source: moved.source,
        destination: moved.destination,
    }))
}
