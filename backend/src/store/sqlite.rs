//! SQLite-backed repository.
//!
//! One connection behind an async mutex. Every operation that rewrites more
//! than one position runs inside a single transaction, so a failed reorder or
//! move leaves the previous order intact.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::ordering::{self, Placement};
use shared::{
    Attachment, Board, BoardPatch, CreateBoardRequest, CreateListRequest, CreateTaskRequest,
    ListPatch, Task, TaskList, TaskPatch,
};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tokio::sync::Mutex;

use super::schema::{
    create_schema, row_to_attachment, row_to_board, row_to_list, row_to_task,
    ATTACHMENT_COLUMNS, BOARD_COLUMNS, LIST_COLUMNS, TASK_COLUMNS,
};
use super::{KanbanRepository, MovedTask, NewAttachment};
use crate::error::{KanbanError, Result};

pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) the database at `path`. `:memory:` opens a private
    /// in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return Self::open_in_memory();
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        tracing::info!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, map)?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}

fn fetch_board(conn: &Connection, id: i64) -> Result<Board> {
    conn.query_row(
        &format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ?1"),
        params![id],
        row_to_board,
    )
    .optional()?
    .ok_or_else(|| KanbanError::board_not_found(id))
}

fn fetch_list(conn: &Connection, id: i64) -> Result<TaskList> {
    conn.query_row(
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ?1"),
        params![id],
        row_to_list,
    )
    .optional()?
    .ok_or_else(|| KanbanError::list_not_found(id))
}

fn fetch_task(conn: &Connection, id: i64) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .optional()?
    .ok_or_else(|| KanbanError::task_not_found(id))
}

fn fetch_task_with_attachments(conn: &Connection, id: i64) -> Result<Task> {
    let mut task = fetch_task(conn, id)?;
    task.attachments = Some(attachments_of(conn, id)?);
    Ok(task)
}

fn fetch_attachment(conn: &Connection, id: i64) -> Result<Attachment> {
    conn.query_row(
        &format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = ?1"),
        params![id],
        row_to_attachment,
    )
    .optional()?
    .ok_or_else(|| KanbanError::attachment_not_found(id))
}

fn lists_of(conn: &Connection, board_id: i64) -> Result<Vec<TaskList>> {
    query_all(
        conn,
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE board_id = ?1 ORDER BY position, id"),
        params![board_id],
        row_to_list,
    )
}

fn tasks_of(conn: &Connection, list_id: i64) -> Result<Vec<Task>> {
    query_all(
        conn,
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE list_id = ?1 ORDER BY position, id"),
        params![list_id],
        row_to_task,
    )
}

fn attachments_of(conn: &Connection, task_id: i64) -> Result<Vec<Attachment>> {
    query_all(
        conn,
        &format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE task_id = ?1 \
             ORDER BY uploaded_at DESC, id DESC"
        ),
        params![task_id],
        row_to_attachment,
    )
}

fn attachments_of_list(conn: &Connection, list_id: i64) -> Result<Vec<Attachment>> {
    query_all(
        conn,
        &format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments \
             WHERE task_id IN (SELECT id FROM tasks WHERE list_id = ?1)"
        ),
        params![list_id],
        row_to_attachment,
    )
}

fn attachments_of_board(conn: &Connection, board_id: i64) -> Result<Vec<Attachment>> {
    query_all(
        conn,
        &format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE task_id IN \
             (SELECT id FROM tasks WHERE list_id IN (SELECT id FROM lists WHERE board_id = ?1))"
        ),
        params![board_id],
        row_to_attachment,
    )
}

fn next_list_position(conn: &Connection, board_id: i64) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(position) FROM lists WHERE board_id = ?1",
        params![board_id],
        |row| row.get(0),
    )?;
    ordering::next_position(max).map_err(|e| KanbanError::from_ordering("list", e))
}

fn next_task_position(conn: &Connection, list_id: i64) -> Result<i64> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(position) FROM tasks WHERE list_id = ?1",
        params![list_id],
        |row| row.get(0),
    )?;
    ordering::next_position(max).map_err(|e| KanbanError::from_ordering("task", e))
}

fn list_placements(lists: &[TaskList]) -> Vec<Placement> {
    lists
        .iter()
        .map(|list| Placement {
            id: list.id,
            position: list.position,
        })
        .collect()
}

fn task_placements(tasks: &[Task]) -> Vec<Placement> {
    tasks
        .iter()
        .map(|task| Placement {
            id: task.id,
            position: task.position,
        })
        .collect()
}

fn task_ids(tasks: &[Task]) -> Vec<i64> {
    tasks.iter().map(|task| task.id).collect()
}

/// Write `placements` into `list_id`, skipping rows already in place.
fn write_task_placements(
    conn: &Connection,
    list_id: i64,
    placements: &[Placement],
    current: &[Task],
) -> Result<usize> {
    let updated_at = now();
    let mut written = 0;
    for placement in placements {
        let unchanged = current.iter().any(|task| {
            task.id == placement.id && task.list_id == list_id && task.position == placement.position
        });
        if unchanged {
            continue;
        }
        conn.execute(
            "UPDATE tasks SET list_id = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
            params![list_id, placement.position, updated_at, placement.id],
        )?;
        written += 1;
    }
    Ok(written)
}

fn insert_board(conn: &Connection, request: &CreateBoardRequest) -> Result<Board> {
    let created_at = now();
    conn.execute(
        "INSERT INTO boards (name, description, is_favorite, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![request.name, request.description, request.is_favorite, created_at],
    )?;
    fetch_board(conn, conn.last_insert_rowid())
}

fn apply_board_patch(conn: &Connection, id: i64, patch: &BoardPatch) -> Result<Board> {
    let mut board = fetch_board(conn, id)?;
    if patch.is_empty() {
        return Ok(board);
    }
    if let Some(name) = &patch.name {
        board.name = name.clone();
    }
    if let Some(description) = &patch.description {
        board.description = description.clone();
    }
    if let Some(is_favorite) = patch.is_favorite {
        board.is_favorite = is_favorite;
    }
    conn.execute(
        "UPDATE boards SET name = ?1, description = ?2, is_favorite = ?3, updated_at = ?4 \
         WHERE id = ?5",
        params![board.name, board.description, board.is_favorite, now(), id],
    )?;
    fetch_board(conn, id)
}

fn insert_list(conn: &mut Connection, request: &CreateListRequest) -> Result<TaskList> {
    let tx = conn.transaction()?;
    fetch_board(&tx, request.board_id)?;
    let position = next_list_position(&tx, request.board_id)?;
    let created_at = now();
    tx.execute(
        "INSERT INTO lists (name, board_id, position, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![request.name, request.board_id, position, created_at],
    )?;
    let list = fetch_list(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    Ok(list)
}

fn apply_list_patch(conn: &Connection, id: i64, patch: &ListPatch) -> Result<TaskList> {
    let mut list = fetch_list(conn, id)?;
    if patch.is_empty() {
        return Ok(list);
    }
    if let Some(name) = &patch.name {
        list.name = name.clone();
    }
    if let Some(position) = patch.position {
        list.position = position;
    }
    conn.execute(
        "UPDATE lists SET name = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
        params![list.name, list.position, now(), id],
    )?;
    fetch_list(conn, id)
}

fn insert_task(conn: &mut Connection, request: &CreateTaskRequest) -> Result<Task> {
    let tx = conn.transaction()?;
    fetch_list(&tx, request.list_id)?;
    let position = next_task_position(&tx, request.list_id)?;
    let created_at = now();
    tx.execute(
        "INSERT INTO tasks (name, list_id, position, description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            request.name,
            request.list_id,
            position,
            request.description,
            created_at
        ],
    )?;
    let task = fetch_task(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    Ok(task)
}

fn apply_task_patch(conn: &Connection, id: i64, patch: &TaskPatch) -> Result<Task> {
    let mut task = fetch_task(conn, id)?;
    if patch.is_empty() {
        return fetch_task_with_attachments(conn, id);
    }
    if let Some(list_id) = patch.list_id {
        fetch_list(conn, list_id)?;
    }
    patch.apply_to(&mut task);

    let repeat_days = serde_json::to_string(&task.repeat_days)?;
    conn.execute(
        "UPDATE tasks SET name = ?1, list_id = ?2, position = ?3, description = ?4, \
         started_date = ?5, end_date = ?6, is_completed = ?7, repeat_interval = ?8, \
         repeat_days = ?9, has_reminder = ?10, reminder_time = ?11, updated_at = ?12 \
         WHERE id = ?13",
        params![
            task.name,
            task.list_id,
            task.position,
            task.description,
            task.started_date,
            task.end_date,
            task.is_completed,
            task.repeat_interval.map(|interval| interval.as_str()),
            repeat_days,
            task.has_reminder,
            task.reminder_time,
            now(),
            id
        ],
    )?;
    fetch_task_with_attachments(conn, id)
}

fn reorder_board_lists(conn: &mut Connection, board_id: i64, order: &[i64]) -> Result<Vec<TaskList>> {
    let tx = conn.transaction()?;
    fetch_board(&tx, board_id)?;
    let lists = lists_of(&tx, board_id)?;
    let updates = ordering::reorder(&list_placements(&lists), order)
        .map_err(|e| KanbanError::from_ordering("list", e))?;

    let updated_at = now();
    for update in &updates {
        tx.execute(
            "UPDATE lists SET position = ?1, updated_at = ?2 WHERE id = ?3",
            params![update.position, updated_at, update.id],
        )?;
    }
    let lists = lists_of(&tx, board_id)?;
    tx.commit()?;

    tracing::debug!(board_id, changed = updates.len(), "reordered lists");
    Ok(lists)
}

fn reorder_list_tasks(conn: &mut Connection, list_id: i64, order: &[i64]) -> Result<Vec<Task>> {
    let tx = conn.transaction()?;
    fetch_list(&tx, list_id)?;
    let tasks = tasks_of(&tx, list_id)?;
    let updates = ordering::reorder(&task_placements(&tasks), order)
        .map_err(|e| KanbanError::from_ordering("task", e))?;

    write_task_placements(&tx, list_id, &updates, &tasks)?;
    let tasks = tasks_of(&tx, list_id)?;
    tx.commit()?;

    tracing::debug!(list_id, changed = updates.len(), "reordered tasks");
    Ok(tasks)
}

fn move_task_between(
    conn: &mut Connection,
    task_id: i64,
    list_id: i64,
    index: i64,
) -> Result<MovedTask> {
    let tx = conn.transaction()?;
    let task = fetch_task(&tx, task_id)?;
    fetch_list(&tx, list_id)?;
    let source_id = task.list_id;

    if source_id == list_id {
        let tasks = tasks_of(&tx, list_id)?;
        let order = ordering::move_within(&task_ids(&tasks), task_id, index)
            .map_err(|e| KanbanError::from_ordering("task", e))?;
        write_task_placements(&tx, list_id, &ordering::renumber(&order), &tasks)?;
    } else {
        let source = tasks_of(&tx, source_id)?;
        let destination = tasks_of(&tx, list_id)?;
        let plan = ordering::plan_move(&task_ids(&source), &task_ids(&destination), task_id, index)
            .map_err(|e| KanbanError::from_ordering("task", e))?;
        write_task_placements(&tx, source_id, &plan.source, &source)?;
        write_task_placements(&tx, list_id, &plan.destination, &destination)?;
    }

    let moved = MovedTask {
        task: fetch_task(&tx, task_id)?,
        source: tasks_of(&tx, source_id)?,
        destination: tasks_of(&tx, list_id)?,
    };
    tx.commit()?;

    tracing::debug!(
        task_id,
        from = source_id,
        to = list_id,
        position = moved.task.position,
        "moved task"
    );
    Ok(moved)
}

fn insert_attachment(conn: &mut Connection, attachment: &NewAttachment) -> Result<Attachment> {
    let tx = conn.transaction()?;
    fetch_task(&tx, attachment.task_id)?;
    tx.execute(
        "INSERT INTO attachments (task_id, file_name, file_url, file_size, mime_type, uploaded_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            attachment.task_id,
            attachment.file_name,
            attachment.file_url,
            attachment.file_size,
            attachment.mime_type,
            now()
        ],
    )?;
    let created = fetch_attachment(&tx, tx.last_insert_rowid())?;
    tx.commit()?;
    Ok(created)
}

#[async_trait]
impl KanbanRepository for SqliteRepository {
    async fn list_boards(&self) -> Result<Vec<Board>> {
        let conn = self.conn.lock().await;
        query_all(
            &conn,
            &format!("SELECT {BOARD_COLUMNS} FROM boards ORDER BY id"),
            [],
            row_to_board,
        )
    }

    async fn get_board(&self, id: i64) -> Result<Board> {
        let conn = self.conn.lock().await;
        fetch_board(&conn, id)
    }

    async fn create_board(&self, request: CreateBoardRequest) -> Result<Board> {
        let conn = self.conn.lock().await;
        insert_board(&conn, &request)
    }

    async fn update_board(&self, id: i64, patch: BoardPatch) -> Result<Board> {
        let conn = self.conn.lock().await;
        apply_board_patch(&conn, id, &patch)
    }

    async fn delete_board(&self, id: i64) -> Result<Vec<Attachment>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        fetch_board(&tx, id)?;
        let attachments = attachments_of_board(&tx, id)?;
        tx.execute("DELETE FROM boards WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(attachments)
    }

    async fn list_lists(&self) -> Result<Vec<TaskList>> {
        let conn = self.conn.lock().await;
        query_all(
            &conn,
            &format!("SELECT {LIST_COLUMNS} FROM lists ORDER BY board_id, position, id"),
            [],
            row_to_list,
        )
    }

    async fn lists_of_board(&self, board_id: i64) -> Result<Vec<TaskList>> {
        let conn = self.conn.lock().await;
        fetch_board(&conn, board_id)?;
        lists_of(&conn, board_id)
    }

    async fn get_list(&self, id: i64) -> Result<TaskList> {
        let conn = self.conn.lock().await;
        fetch_list(&conn, id)
    }

    async fn create_list(&self, request: CreateListRequest) -> Result<TaskList> {
        let mut conn = self.conn.lock().await;
        insert_list(&mut conn, &request)
    }

    async fn update_list(&self, id: i64, patch: ListPatch) -> Result<TaskList> {
        let conn = self.conn.lock().await;
        apply_list_patch(&conn, id, &patch)
    }

    async fn delete_list(&self, id: i64) -> Result<Vec<Attachment>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        fetch_list(&tx, id)?;
        let attachments = attachments_of_list(&tx, id)?;
        tx.execute("DELETE FROM lists WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(attachments)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.conn.lock().await;
        query_all(
            &conn,
            &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY position, id"),
            [],
            row_to_task,
        )
    }

    async fn tasks_of_list(&self, list_id: i64) -> Result<Vec<Task>> {
        let conn = self.conn.lock().await;
        fetch_list(&conn, list_id)?;
        tasks_of(&conn, list_id)
    }

    async fn get_task(&self, id: i64) -> Result<Task> {
        let conn = self.conn.lock().await;
        fetch_task_with_attachments(&conn, id)
    }

    async fn create_task(&self, request: CreateTaskRequest) -> Result<Task> {
        let mut conn = self.conn.lock().await;
        insert_task(&mut conn, &request)
    }

    async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task> {
        let conn = self.conn.lock().await;
        apply_task_patch(&conn, id, &patch)
    }

    async fn delete_task(&self, id: i64) -> Result<Vec<Attachment>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        fetch_task(&tx, id)?;
        let attachments = attachments_of(&tx, id)?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(attachments)
    }

    async fn reorder_lists(&self, board_id: i64, order: Vec<i64>) -> Result<Vec<TaskList>> {
        let mut conn = self.conn.lock().await;
        reorder_board_lists(&mut conn, board_id, &order)
    }

    async fn reorder_tasks(&self, list_id: i64, order: Vec<i64>) -> Result<Vec<Task>> {
        let mut conn = self.conn.lock().await;
        reorder_list_tasks(&mut conn, list_id, &order)
    }

    async fn move_task(&self, task_id: i64, list_id: i64, index: i64) -> Result<MovedTask> {
        let mut conn = self.conn.lock().await;
        move_task_between(&mut conn, task_id, list_id, index)
    }

    async fn attachments_of_task(&self, task_id: i64) -> Result<Vec<Attachment>> {
        let conn = self.conn.lock().await;
        fetch_task(&conn, task_id)?;
        attachments_of(&conn, task_id)
    }

    async fn get_attachment(&self, id: i64) -> Result<Attachment> {
        let conn = self.conn.lock().await;
        fetch_attachment(&conn, id)
    }

    async fn create_attachment(&self, attachment: NewAttachment) -> Result<Attachment> {
        let mut conn = self.conn.lock().await;
        insert_attachment(&mut conn, &attachment)
    }

    async fn delete_attachment(&self, id: i64) -> Result<Attachment> {
        let conn = self.conn.lock().await;
        let attachment = fetch_attachment(&conn, id)?;
        conn.execute("DELETE FROM attachments WHERE id = ?1", params![id])?;
        Ok(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteRepository {
        SqliteRepository::open_in_memory().unwrap()
    }

    async fn board(repo: &SqliteRepository, name: &str) -> Board {
        repo.create_board(CreateBoardRequest {
            name: name.into(),
            description: None,
            is_favorite: false,
        })
        .await
        .unwrap()
    }

    async fn list(repo: &SqliteRepository, board_id: i64, name: &str) -> TaskList {
        repo.create_list(CreateListRequest {
            name: name.into(),
            board_id,
        })
        .await
        .unwrap()
    }

    async fn task(repo: &SqliteRepository, list_id: i64, name: &str) -> Task {
        repo.create_task(CreateTaskRequest {
            name: name.into(),
            list_id,
            description: None,
        })
        .await
        .unwrap()
    }

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.name.as_str()).collect()
    }

    fn positions(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|task| task.position).collect()
    }

    #[tokio::test]
    async fn test_append_positions() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let todo = list(&repo, b.id, "Todo").await;
        let done = list(&repo, b.id, "Done").await;
        assert_eq!(todo.position, 0);
        assert_eq!(done.position, 1);

        let t1 = task(&repo, todo.id, "T1").await;
        let t2 = task(&repo, todo.id, "T2").await;
        let t3 = task(&repo, todo.id, "T3").await;
        assert_eq!((t1.position, t2.position, t3.position), (0, 1, 2));

        let first_in_done = task(&repo, done.id, "D1").await;
        assert_eq!(first_in_done.position, 0);
    }

    #[tokio::test]
    async fn test_append_after_max_not_count() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let l = list(&repo, b.id, "Todo").await;
        let t1 = task(&repo, l.id, "T1").await;
        task(&repo, l.id, "T2").await;

        repo.update_task(
            t1.id,
            TaskPatch {
                position: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let appended = task(&repo, l.id, "T3").await;
        assert_eq!(appended.position, 8);
    }

    #[tokio::test]
    async fn test_append_after_largest_position_is_rejected() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let l = list(&repo, b.id, "Todo").await;
        let t1 = task(&repo, l.id, "T1").await;

        repo.update_task(
            t1.id,
            TaskPatch {
                position: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = repo
            .create_task(CreateTaskRequest {
                name: "T2".to_string(),
                list_id: l.id,
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));
        assert_eq!(repo.tasks_of_list(l.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_in_missing_scope() {
        let repo = repo().await;
        let err = repo
            .create_list(CreateListRequest {
                name: "Orphan".into(),
                board_id: 42,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::NotFound { resource: "board", id: 42 }));

        let err = repo
            .create_task(CreateTaskRequest {
                name: "Orphan".into(),
                list_id: 42,
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::NotFound { resource: "list", id: 42 }));
    }

    #[tokio::test]
    async fn test_reorder_round_trip_and_idempotence() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let l = list(&repo, b.id, "Todo").await;
        let t1 = task(&repo, l.id, "T1").await;
        let t2 = task(&repo, l.id, "T2").await;
        let t3 = task(&repo, l.id, "T3").await;

        let order = vec![t3.id, t2.id, t1.id];
        let once = repo.reorder_tasks(l.id, order.clone()).await.unwrap();
        assert_eq!(names(&once), vec!["T3", "T2", "T1"]);
        assert_eq!(positions(&once), vec![0, 1, 2]);

        let twice = repo.reorder_tasks(l.id, order).await.unwrap();
        assert_eq!(names(&twice), names(&once));
        assert_eq!(positions(&twice), positions(&once));

        let fetched = repo.tasks_of_list(l.id).await.unwrap();
        assert_eq!(names(&fetched), vec!["T3", "T2", "T1"]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_foreign_member_atomically() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let todo = list(&repo, b.id, "Todo").await;
        let done = list(&repo, b.id, "Done").await;
        let t1 = task(&repo, todo.id, "T1").await;
        let t2 = task(&repo, todo.id, "T2").await;
        let other = task(&repo, done.id, "X").await;

        let err = repo
            .reorder_tasks(todo.id, vec![t2.id, other.id])
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::NotFound { resource: "task", .. }));

        let err = repo.reorder_tasks(todo.id, vec![t2.id]).await.unwrap_err();
        assert!(matches!(err, KanbanError::Validation(_)));

        let fetched = repo.tasks_of_list(todo.id).await.unwrap();
        assert_eq!(
            fetched.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![t1.id, t2.id]
        );
    }

    #[tokio::test]
    async fn test_reorder_lists() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let a = list(&repo, b.id, "A").await;
        let c = list(&repo, b.id, "C").await;
        let d = list(&repo, b.id, "D").await;

        let lists = repo.reorder_lists(b.id, vec![d.id, a.id, c.id]).await.unwrap();
        let ids: Vec<i64> = lists.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![d.id, a.id, c.id]);
        let positions: Vec<i64> = lists.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_move_scenario_todo_to_done() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let todo = list(&repo, b.id, "Todo").await;
        let t1 = task(&repo, todo.id, "T1").await;
        task(&repo, todo.id, "T2").await;
        task(&repo, todo.id, "T3").await;
        let done = list(&repo, b.id, "Done").await;
        assert_eq!(done.position, 1);

        let moved = repo.move_task(t1.id, done.id, 0).await.unwrap();
        assert_eq!(moved.task.list_id, done.id);
        assert_eq!(moved.task.position, 0);
        assert_eq!(names(&moved.source), vec!["T2", "T3"]);
        assert_eq!(positions(&moved.source), vec![0, 1]);
        assert_eq!(names(&moved.destination), vec!["T1"]);
        assert_eq!(positions(&moved.destination), vec![0]);
    }

    #[tokio::test]
    async fn test_move_conservation_with_clamped_index() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let a = list(&repo, b.id, "A").await;
        let z = list(&repo, b.id, "Z").await;
        let mover = task(&repo, a.id, "a1").await;
        task(&repo, a.id, "a2").await;
        task(&repo, z.id, "z1").await;
        task(&repo, z.id, "z2").await;

        let moved = repo.move_task(mover.id, z.id, 99).await.unwrap();
        assert_eq!(moved.source.len(), 1);
        assert_eq!(positions(&moved.source), vec![0]);
        assert_eq!(names(&moved.destination), vec!["z1", "z2", "a1"]);
        assert_eq!(positions(&moved.destination), vec![0, 1, 2]);
        assert_eq!(moved.task.position, 2);
    }

    #[tokio::test]
    async fn test_move_within_same_list() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let l = list(&repo, b.id, "Todo").await;
        task(&repo, l.id, "T1").await;
        task(&repo, l.id, "T2").await;
        let t3 = task(&repo, l.id, "T3").await;

        let moved = repo.move_task(t3.id, l.id, 0).await.unwrap();
        assert_eq!(moved.source, moved.destination);
        assert_eq!(names(&moved.destination), vec!["T3", "T1", "T2"]);
        assert_eq!(positions(&moved.destination), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_move_missing_task_or_list() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let l = list(&repo, b.id, "Todo").await;
        let t = task(&repo, l.id, "T1").await;

        let err = repo.move_task(999, l.id, 0).await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound { resource: "task", .. }));

        let err = repo.move_task(t.id, 999, 0).await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound { resource: "list", .. }));
    }

    #[tokio::test]
    async fn test_delete_leaves_gap_until_reorder() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let first = list(&repo, b.id, "L0").await;
        let middle = list(&repo, b.id, "L1").await;
        let last = list(&repo, b.id, "L2").await;

        repo.delete_list(middle.id).await.unwrap();
        let lists = repo.lists_of_board(b.id).await.unwrap();
        let positions: Vec<i64> = lists.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 2]);

        let lists = repo.reorder_lists(b.id, vec![first.id, last.id]).await.unwrap();
        let positions: Vec<i64> = lists.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_attachments() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let l = list(&repo, b.id, "Todo").await;
        let t = task(&repo, l.id, "T1").await;
        repo.create_attachment(NewAttachment {
            task_id: t.id,
            file_name: "notes.txt".into(),
            file_url: "/uploads/abc-notes.txt".into(),
            file_size: 5,
            mime_type: "text/plain".into(),
        })
        .await
        .unwrap();

        let removed = repo.delete_board(b.id).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].file_url, "/uploads/abc-notes.txt");

        assert!(matches!(
            repo.get_list(l.id).await.unwrap_err(),
            KanbanError::NotFound { .. }
        ));
        assert!(matches!(
            repo.get_task(t.id).await.unwrap_err(),
            KanbanError::NotFound { .. }
        ));
        assert!(matches!(
            repo.get_attachment(removed[0].id).await.unwrap_err(),
            KanbanError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_task_patch_round_trip() {
        let repo = repo().await;
        let b = board(&repo, "B1").await;
        let todo = list(&repo, b.id, "Todo").await;
        let done = list(&repo, b.id, "Done").await;
        let t = task(&repo, todo.id, "T1").await;

        let started = Utc::now();
        let patch: TaskPatch = serde_json::from_value(serde_json::json!({
            "description": "write it",
            "isCompleted": true,
            "listId": done.id,
            "repeatInterval": "weekly",
            "repeatDays": [1, 3],
            "startedDate": started,
        }))
        .unwrap();
        let updated = repo.update_task(t.id, patch).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("write it"));
        assert!(updated.is_completed);
        assert_eq!(updated.list_id, done.id);
        assert_eq!(updated.repeat_days, vec![1, 3]);
        assert!(updated.started_date.is_some());
        assert_eq!(updated.attachments, Some(Vec::new()));

        let cleared: TaskPatch =
            serde_json::from_value(serde_json::json!({ "description": null })).unwrap();
        let updated = repo.update_task(t.id, cleared).await.unwrap();
        assert_eq!(updated.description, None);
        assert!(updated.is_completed);

        let err = repo
            .update_task(
                t.id,
                TaskPatch {
                    list_id: Some(404),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::NotFound { resource: "list", .. }));
    }
}
