use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use shared::{Board, BoardPatch, CreateBoardRequest, ReorderRequest, TaskList};

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

pub async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<Board>>> {
    Ok(Json(state.repo.list_boards().await?))
}

pub async fn get_board(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Board>> {
    Ok(Json(state.repo.get_board(id).await?))
}

pub async fn create_board(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>)> {
    let board = state.repo.create_board(request.validate()?).await?;
    tracing::info!(board_id = board.id, name = %board.name, "created board");
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn update_board(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<BoardPatch>,
) -> Result<Json<Board>> {
    Ok(Json(state.repo.update_board(id, patch.validate()?).await?))
}

pub async fn delete_board(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    let removed = state.repo.delete_board(id).await?;
    state.uploads.remove_all(&removed).await;
    tracing::info!(board_id = id, attachments = removed.len(), "deleted board");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn board_lists(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<TaskList>>> {
    Ok(Json(state.repo.lists_of_board(id).await?))
}

pub async fn reorder_lists(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<TaskList>>> {
    Ok(Json(state.repo.reorder_lists(id, request.ids).await?))
}
