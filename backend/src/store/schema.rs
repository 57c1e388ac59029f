//! Table definitions and row mapping.
//!
//! - `boards`
//! - `lists`: `board_id` -> boards, cascade
//! - `tasks`: `list_id` -> lists, cascade
//! - `attachments`: `task_id` -> tasks, cascade
//!
//! `position` has no unique index. Appends, PATCHes and deletes may leave
//! duplicates or gaps that the next reorder closes.

use shared::{Attachment, Board, RepeatInterval, Task, TaskList};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS boards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    is_favorite INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    description TEXT,
    started_date TEXT,
    end_date TEXT,
    is_completed INTEGER NOT NULL DEFAULT 0,
    repeat_interval TEXT,
    repeat_days TEXT NOT NULL DEFAULT '[]',
    has_reminder INTEGER NOT NULL DEFAULT 0,
    reminder_time TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    file_url TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    mime_type TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lists_board ON lists(board_id, position);
CREATE INDEX IF NOT EXISTS idx_tasks_list ON tasks(list_id, position);
CREATE INDEX IF NOT EXISTS idx_attachments_task ON attachments(task_id);
"#;

pub(crate) const BOARD_COLUMNS: &str =
    "id, name, description, is_favorite, created_at, updated_at";

pub(crate) const LIST_COLUMNS: &str = "id, name, board_id, position, created_at, updated_at";

pub(crate) const TASK_COLUMNS: &str = "id, name, list_id, position, description, started_date, \
     end_date, is_completed, repeat_interval, repeat_days, has_reminder, reminder_time, \
     created_at, updated_at";

pub(crate) const ATTACHMENT_COLUMNS: &str =
    "id, task_id, file_name, file_url, file_size, mime_type, uploaded_at";

pub(crate) fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA)
}

pub(crate) fn row_to_board(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_favorite: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn row_to_list(row: &Row<'_>) -> rusqlite::Result<TaskList> {
    Ok(TaskList {
        id: row.get(0)?,
        name: row.get(1)?,
        board_id: row.get(2)?,
        position: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let repeat_interval: Option<String> = row.get(8)?;
    let repeat_interval = match repeat_interval {
        Some(value) => Some(RepeatInterval::parse(&value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                Type::Text,
                format!("unknown repeat interval {value:?}").into(),
            )
        })?),
        None => None,
    };

    let repeat_days: String = row.get(9)?;
    let repeat_days: Vec<u8> = serde_json::from_str(&repeat_days)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        list_id: row.get(2)?,
        position: row.get(3)?,
        description: row.get(4)?,
        started_date: row.get(5)?,
        end_date: row.get(6)?,
        is_completed: row.get(7)?,
        repeat_interval,
        repeat_days,
        has_reminder: row.get(10)?,
        reminder_time: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        attachments: None,
    })
}

pub(crate) fn row_to_attachment(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        task_id: row.get(1)?,
        file_name: row.get(2)?,
        file_url: row.get(3)?,
        file_size: row.get(4)?,
        mime_type: row.get(5)?,
        uploaded_at: row.get(6)?,
    })
}
