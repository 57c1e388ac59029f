//! Types and ordering rules shared by the Itero server and browser client.

pub mod board;
pub mod models;
pub mod ordering;

pub use board::BoardSnapshot;
pub use models::{
    validate_name, Attachment, Board, BoardPatch, CreateBoardRequest, CreateListRequest,
    CreateTaskRequest, ErrorBody, InvalidField, ListPatch, MoveTaskRequest, MoveTaskResponse,
    ReorderRequest, RepeatInterval, Task, TaskList, TaskPatch,
};
pub use ordering::{OrderingError, Placement, Position};
