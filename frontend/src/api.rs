use shared::{
    Board, BoardPatch, BoardSnapshot, CreateBoardRequest, CreateListRequest, CreateTaskRequest,
    ErrorBody, MoveTaskRequest, MoveTaskResponse, ReorderRequest, Task, TaskList, TaskPatch,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, Request, RequestInit, Response};

/// Issue a request and return the response text. Non-2xx responses become
/// the server's `{error}` message.
async fn send(method: &str, url: &str, body: Option<String>) -> Result<String, String> {
    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(body) = &body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|_| "Failed to create request")?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|_| "Failed to set header")?;
    }

    let window = web_sys::window().ok_or("No window available")?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|_| format!("Failed to send {} {}", method, url))?
        .into();

    let text_promise = response.text().map_err(|_| "Failed to read response")?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| "Failed to get text")?
        .as_string()
        .unwrap_or_default();

    if !response.ok() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("{} {} failed with {}", method, url, response.status()));
        console::log_1(&format!("[api] {}", message).into());
        return Err(message);
    }
    Ok(text)
}

fn parse<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    serde_json::from_str(text).map_err(|e| format!("Failed to parse JSON: {}", e))
}

async fn get<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    parse(&send("GET", url, None).await?)
}

async fn send_json<B: Serialize, T: DeserializeOwned>(
    method: &str,
    url: &str,
    body: &B,
) -> Result<T, String> {
    let body = serde_json::to_string(body).map_err(|_| "Failed to serialize request")?;
    parse(&send(method, url, Some(body)).await?)
}

async fn delete(url: &str) -> Result<(), String> {
    send("DELETE", url, None).await.map(|_| ())
}

pub async fn fetch_boards() -> Result<Vec<Board>, String> {
    get("/api/boards").await
}

/// Board, lists and every list's tasks.
pub async fn fetch_snapshot(board_id: i64) -> Result<BoardSnapshot, String> {
    let board: Board = get(&format!("/api/boards/{}", board_id)).await?;
    let lists: Vec<TaskList> = get(&format!("/api/boards/{}/lists", board_id)).await?;
    let mut tasks = Vec::new();
    for list in &lists {
        let mut list_tasks: Vec<Task> = get(&format!("/api/lists/{}/tasks", list.id)).await?;
        tasks.append(&mut list_tasks);
    }
    Ok(BoardSnapshot::new(board, lists, tasks))
}

pub async fn create_board(name: String) -> Result<Board, String> {
    let request = CreateBoardRequest {
        name,
        description: None,
        is_favorite: false,
    };
    send_json("POST", "/api/boards", &request).await
}

pub async fn update_board(id: i64, patch: BoardPatch) -> Result<Board, String> {
    send_json("PATCH", &format!("/api/boards/{}", id), &patch).await
}

pub async fn delete_board(id: i64) -> Result<(), String> {
    delete(&format!("/api/boards/{}", id)).await
}

pub async fn create_list(board_id: i64, name: String) -> Result<TaskList, String> {
    send_json("POST", "/api/lists", &CreateListRequest { name, board_id }).await
}

pub async fn delete_list(id: i64) -> Result<(), String> {
    delete(&format!("/api/lists/{}", id)).await
}

pub async fn reorder_lists(board_id: i64, ids: Vec<i64>) -> Result<Vec<TaskList>, String> {
    send_json(
        "PUT",
        &format!("/api/boards/{}/lists/order", board_id),
        &ReorderRequest { ids },
    )
    .await
}

pub async fn create_task(list_id: i64, name: String) -> Result<Task, String> {
    let request = CreateTaskRequest {
        name,
        list_id,
        description: None,
    };
    send_json("POST", "/api/tasks", &request).await
}

pub async fn update_task(id: i64, patch: TaskPatch) -> Result<Task, String> {
    send_json("PATCH", &format!("/api/tasks/{}", id), &patch).await
}

pub async fn delete_task(id: i64) -> Result<(), String> {
    delete(&format!("/api/tasks/{}", id)).await
}

pub async fn move_task(id: i64, list_id: i64, index: i64) -> Result<MoveTaskResponse, String> {
    send_json(
        "POST",
        &format!("/api/tasks/{}/move", id),
        &MoveTaskRequest { list_id, index },
    )
    .await
}
