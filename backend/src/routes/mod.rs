mod attachments;
mod boards;
mod lists;
mod tasks;

use axum::extract::OriginalUri;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use shared::ErrorBody;
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/boards/:id",
            get(boards::get_board)
                .patch(boards::update_board)
                .delete(boards::delete_board),
        )
        .route("/boards/:id/lists", get(boards::board_lists))
        .route("/boards/:id/lists/order", put(boards::reorder_lists))
        .route("/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/lists/:id",
            get(lists::get_list)
                .patch(lists::update_list)
                .delete(lists::delete_list),
        )
        .route("/lists/:id/tasks", get(lists::list_tasks))
        .route("/lists/:id/tasks/order", put(lists::reorder_tasks))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/:id/move", post(tasks::move_task))
        .route(
            "/tasks/:id/attachments",
            get(attachments::list_attachments).post(attachments::upload_attachment),
        )
        .route(
            "/tasks/attachments/:attachment_id",
            delete(attachments::delete_attachment),
        )
        .fallback(unknown_route)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "server started" }))
}

/// Keeps unknown `/api` paths from falling through to the frontend.
async fn unknown_route(OriginalUri(uri): OriginalUri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("no route for {}", uri.path()),
        }),
    )
}
