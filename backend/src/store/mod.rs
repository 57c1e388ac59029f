//! Persistence layer.
//!
//! Handlers talk to a [`KanbanRepository`] handed to them through the router
//! state. [`SqliteRepository`] is the only implementation.

mod schema;
mod sqlite;

use async_trait::async_trait;
use shared::{
    Attachment, Board, BoardPatch, CreateBoardRequest, CreateListRequest, CreateTaskRequest,
    ListPatch, Task, TaskList, TaskPatch,
};

use crate::error::Result;

pub use sqlite::SqliteRepository;

/// Attachment row before it has an id.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub task_id: i64,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
}

/// Result of a task move: the full task order of the source and destination
/// lists after renumbering.
#[derive(Debug, Clone, PartialEq)]
pub struct MovedTask {
    pub task: Task,
    pub source: Vec<Task>,
    pub destination: Vec<Task>,
}

#[async_trait]
pub trait KanbanRepository: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>>;
    async fn get_board(&self, id: i64) -> Result<Board>;
    async fn create_board(&self, request: CreateBoardRequest) -> Result<Board>;
    async fn update_board(&self, id: i64, patch: BoardPatch) -> Result<Board>;
    /// Deletes the board with its lists and tasks. Returns the attachments
    /// that went with them.
    async fn delete_board(&self, id: i64) -> Result<Vec<Attachment>>;

    async fn list_lists(&self) -> Result<Vec<TaskList>>;
    /// Lists of a board ordered by position.
    async fn lists_of_board(&self, board_id: i64) -> Result<Vec<TaskList>>;
    async fn get_list(&self, id: i64) -> Result<TaskList>;
    /// Appends a list after the board's current last position.
    async fn create_list(&self, request: CreateListRequest) -> Result<TaskList>;
    async fn update_list(&self, id: i64, patch: ListPatch) -> Result<TaskList>;
    /// Deletes a list and its tasks without renumbering the remaining lists.
    async fn delete_list(&self, id: i64) -> Result<Vec<Attachment>>;

    /// All tasks ordered by position.
    async fn list_tasks(&self) -> Result<Vec<Task>>;
    /// Tasks of a list ordered by position.
    async fn tasks_of_list(&self, list_id: i64) -> Result<Vec<Task>>;
    /// A task with its attachments.
    async fn get_task(&self, id: i64) -> Result<Task>;
    /// Appends a task after the list's current last position.
    async fn create_task(&self, request: CreateTaskRequest) -> Result<Task>;
    async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task>;
    async fn delete_task(&self, id: i64) -> Result<Vec<Attachment>>;

    /// Renumber a board's lists to match `order` in one transaction.
    async fn reorder_lists(&self, board_id: i64, order: Vec<i64>) -> Result<Vec<TaskList>>;
    /// Renumber a list's tasks to match `order` in one transaction.
    async fn reorder_tasks(&self, list_id: i64, order: Vec<i64>) -> Result<Vec<Task>>;
    /// Move a task to `index` of `list_id` in one transaction.
    async fn move_task(&self, task_id: i64, list_id: i64, index: i64) -> Result<MovedTask>;

    /// Attachments of a task, newest first.
    async fn attachments_of_task(&self, task_id: i64) -> Result<Vec<Attachment>>;
    async fn get_attachment(&self, id: i64) -> Result<Attachment>;
    async fn create_attachment(&self, attachment: NewAttachment) -> Result<Attachment>;
    async fn delete_attachment(&self, id: i64) -> Result<Attachment>;
}
