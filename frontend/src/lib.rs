use std::collections::HashMap;

use shared::{
    ordering, Board, BoardPatch, BoardSnapshot, MoveTaskResponse, Task, TaskList, TaskPatch,
};
use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use web_sys::{console, window};

mod api;

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Boards,
    Board(i64),
}

impl Page {
    fn to_path(&self) -> String {
        match self {
            Page::Boards => "/".to_string(),
            Page::Board(id) => format!("/boards/{}", id),
        }
    }

    fn from_path(path: &str) -> Self {
        path.strip_prefix("/boards/")
            .and_then(|rest| rest.trim_end_matches('/').parse().ok())
            .map(Page::Board)
            .unwrap_or(Page::Boards)
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    NavigateTo(Page),

    // Boards page
    LoadBoards,
    BoardsLoaded(Vec<Board>),
    SetNewBoardName(String),
    CreateBoard,
    BoardCreated(Board),
    ToggleFavorite(i64),
    BoardUpdated(Board),
    DeleteBoard(i64),

    // Board page
    LoadBoard(i64),
    BoardLoaded(BoardSnapshot),
    SetNewListName(String),
    CreateList,
    ListCreated(TaskList),
    DeleteList(i64),
    MoveList(i64, i64),
    ListsReordered(Vec<TaskList>),
    SetNewTaskName(i64, String),
    CreateTask(i64),
    TaskCreated(Task),
    ToggleTask(i64),
    TaskUpdated(Task),
    DeleteTask(i64),
    MoveTask { task_id: i64, list_id: i64, index: i64 },
    TaskMoved(MoveTaskResponse),

    Synced,
    /// An optimistic change was rejected; the page is reloaded from the server.
    SyncFailed(String),
    DismissError,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct Model {
    current_page: Page,
    boards: Vec<Board>,
    new_board_name: String,
    snapshot: Option<BoardSnapshot>,
    new_list_name: String,
    new_task_names: HashMap<i64, String>,
    loading: bool,
    error: Option<String>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            current_page: Page::Boards,
            boards: Vec::new(),
            new_board_name: String::new(),
            snapshot: None,
            new_list_name: String::new(),
            new_task_names: HashMap::new(),
            loading: false,
            error: None,
        }
    }
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        if let Some(window) = window() {
            if let Ok(pathname) = window.location().pathname() {
                self.current_page = Page::from_path(&pathname);
            }
        }
        setup_popstate_listener();
        self.load_page()
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::NavigateTo(page) => {
                if let Some(history) = window().and_then(|w| w.history().ok()) {
                    let _ = history.push_state_with_url(
                        &wasm_bindgen::JsValue::NULL,
                        "",
                        Some(&page.to_path()),
                    );
                }
                if self.snapshot.as_ref().map(|s| Page::Board(s.board.id)) != Some(page.clone()) {
                    self.snapshot = None;
                }
                self.current_page = page;
                self.load_page()
            }
            Msg::LoadBoards => {
                self.loading = true;
                Cmd::new(async {
                    match api::fetch_boards().await {
                        Ok(boards) => Msg::BoardsLoaded(boards),
                        Err(e) => Msg::Error(e),
                    }
                })
            }
            Msg::BoardsLoaded(boards) => {
                self.boards = boards;
                self.loading = false;
                Cmd::none()
            }
            Msg::SetNewBoardName(name) => {
                self.new_board_name = name;
                Cmd::none()
            }
            Msg::CreateBoard => {
                let board_name = self.new_board_name.trim().to_string();
                if board_name.is_empty() {
                    return Cmd::none();
                }
                self.new_board_name.clear();
                Cmd::new(async move {
                    match api::create_board(board_name).await {
                        Ok(board) => Msg::BoardCreated(board),
                        Err(e) => Msg::Error(e),
                    }
                })
            }
            Msg::BoardCreated(board) => {
                self.boards.push(board);
                Cmd::none()
            }
            Msg::ToggleFavorite(id) => {
                let Some(board) = self.boards.iter_mut().find(|b| b.id == id) else {
                    return Cmd::none();
                };
                board.is_favorite = !board.is_favorite;
                let patch = BoardPatch {
                    is_favorite: Some(board.is_favorite),
                    ..BoardPatch::default()
                };
                Cmd::new(async move {
                    match api::update_board(id, patch).await {
                        Ok(board) => Msg::BoardUpdated(board),
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::BoardUpdated(updated) => {
                if let Some(board) = self.boards.iter_mut().find(|b| b.id == updated.id) {
                    *board = updated;
                }
                Cmd::none()
            }
            Msg::DeleteBoard(id) => {
                if !confirm("Delete this board with all its lists and tasks?") {
                    return Cmd::none();
                }
                self.boards.retain(|b| b.id != id);
                Cmd::new(async move {
                    match api::delete_board(id).await {
                        Ok(()) => Msg::Synced,
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::LoadBoard(id) => {
                self.loading = true;
                Cmd::new(async move {
                    match api::fetch_snapshot(id).await {
                        Ok(snapshot) => Msg::BoardLoaded(snapshot),
                        Err(e) => Msg::Error(e),
                    }
                })
            }
            Msg::BoardLoaded(snapshot) => {
                self.loading = false;
                // Ignore a response for a board we already navigated away from.
                if self.current_page == Page::Board(snapshot.board.id) {
                    console::log_1(
                        &format!(
                            "[board] loaded '{}' with {} lists and {} tasks",
                            snapshot.board.name,
                            snapshot.lists.len(),
                            snapshot.tasks.len()
                        )
                        .into(),
                    );
                    self.snapshot = Some(snapshot);
                }
                Cmd::none()
            }
            Msg::SetNewListName(name) => {
                self.new_list_name = name;
                Cmd::none()
            }
            Msg::CreateList => {
                let list_name = self.new_list_name.trim().to_string();
                let Some(board_id) = self.snapshot.as_ref().map(|s| s.board.id) else {
                    return Cmd::none();
                };
                if list_name.is_empty() {
                    return Cmd::none();
                }
                self.new_list_name.clear();
                Cmd::new(async move {
                    match api::create_list(board_id, list_name).await {
                        Ok(list) => Msg::ListCreated(list),
                        Err(e) => Msg::Error(e),
                    }
                })
            }
            Msg::ListCreated(list) => {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    if snapshot.board.id == list.board_id {
                        snapshot.insert_list(list);
                    }
                }
                Cmd::none()
            }
            Msg::DeleteList(id) => {
                if !confirm("Delete this list and its tasks?") {
                    return Cmd::none();
                }
                if let Some(snapshot) = self.snapshot.as_mut() {
                    snapshot.remove_list(id);
                }
                Cmd::new(async move {
                    match api::delete_list(id).await {
                        Ok(()) => Msg::Synced,
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::MoveList(list_id, index) => {
                let Some(snapshot) = self.snapshot.as_mut() else {
                    return Cmd::none();
                };
                let board_id = snapshot.board.id;
                let order = match ordering::move_within(&snapshot.list_order(), list_id, index) {
                    Ok(order) => order,
                    Err(e) => return report(e.to_string()),
                };
                if let Err(e) = snapshot.apply_list_reorder(&order) {
                    return report(e.to_string());
                }
                Cmd::new(async move {
                    match api::reorder_lists(board_id, order).await {
                        Ok(lists) => Msg::ListsReordered(lists),
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::ListsReordered(lists) => {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    if lists.iter().all(|list| list.board_id == snapshot.board.id) {
                        snapshot.lists = lists;
                    }
                }
                Cmd::none()
            }
            Msg::SetNewTaskName(list_id, name) => {
                self.new_task_names.insert(list_id, name);
                Cmd::none()
            }
            Msg::CreateTask(list_id) => {
                let task_name = self
                    .new_task_names
                    .remove(&list_id)
                    .map(|name| name.trim().to_string())
                    .unwrap_or_default();
                if task_name.is_empty() {
                    return Cmd::none();
                }
                Cmd::new(async move {
                    match api::create_task(list_id, task_name).await {
                        Ok(task) => Msg::TaskCreated(task),
                        Err(e) => Msg::Error(e),
                    }
                })
            }
            Msg::TaskCreated(task) => {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    snapshot.insert_task(task);
                }
                Cmd::none()
            }
            Msg::ToggleTask(id) => {
                let Some(task) = self
                    .snapshot
                    .as_mut()
                    .and_then(|s| s.tasks.iter_mut().find(|t| t.id == id))
                else {
                    return Cmd::none();
                };
                task.is_completed = !task.is_completed;
                let patch = TaskPatch {
                    is_completed: Some(task.is_completed),
                    ..TaskPatch::default()
                };
                Cmd::new(async move {
                    match api::update_task(id, patch).await {
                        Ok(task) => Msg::TaskUpdated(task),
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::TaskUpdated(task) => {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    snapshot.replace_task(task);
                }
                Cmd::none()
            }
            Msg::DeleteTask(id) => {
                if !confirm("Delete this task?") {
                    return Cmd::none();
                }
                if let Some(snapshot) = self.snapshot.as_mut() {
                    snapshot.remove_task(id);
                }
                Cmd::new(async move {
                    match api::delete_task(id).await {
                        Ok(()) => Msg::Synced,
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::MoveTask {
                task_id,
                list_id,
                index,
            } => {
                let Some(snapshot) = self.snapshot.as_mut() else {
                    return Cmd::none();
                };
                if let Err(e) = snapshot.apply_task_move(task_id, list_id, index) {
                    return report(e.to_string());
                }
                Cmd::new(async move {
                    match api::move_task(task_id, list_id, index).await {
                        Ok(moved) => Msg::TaskMoved(moved),
                        Err(e) => Msg::SyncFailed(e),
                    }
                })
            }
            Msg::TaskMoved(moved) => {
                if let Some(snapshot) = self.snapshot.as_mut() {
                    for task in moved.source.into_iter().chain(moved.destination) {
                        snapshot.replace_task(task);
                    }
                }
                Cmd::none()
            }
            Msg::Synced => Cmd::none(),
            Msg::SyncFailed(error) => {
                console::log_1(&format!("[sync] {}; reloading from server", error).into());
                self.error = Some(error);
                self.load_page()
            }
            Msg::DismissError => {
                self.error = None;
                Cmd::none()
            }
            Msg::Error(error) => {
                console::log_1(&format!("Error: {}", error).into());
                self.loading = false;
                self.error = Some(error);
                Cmd::none()
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                self.view_header(),
                self.view_error(),
                div(
                    [class("max-w-7xl mx-auto px-6 py-8")],
                    [match self.current_page {
                        Page::Boards => self.view_boards_page(),
                        Page::Board(_) => self.view_board_page(),
                    }],
                ),
            ],
        )
    }
}

impl Model {
    /// Fetch whatever the current page shows.
    fn load_page(&self) -> Cmd<Msg> {
        match self.current_page {
            Page::Boards => Cmd::new(async { Msg::LoadBoards }),
            Page::Board(id) => Cmd::new(async move { Msg::LoadBoard(id) }),
        }
    }

    fn view_header(&self) -> Node<Msg> {
        header(
            [class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")],
            [div(
                [class("max-w-7xl mx-auto px-6 py-4 flex items-center justify-between")],
                [
                    a(
                        [
                            href("/"),
                            on_click(|event| {
                                event.prevent_default();
                                Msg::NavigateTo(Page::Boards)
                            }),
                            class("text-2xl font-bold text-ctp-text hover:text-ctp-blue"),
                        ],
                        [text("Itero")],
                    ),
                    if self.loading {
                        span([class("text-sm text-ctp-subtext0 italic")], [text("Loading...")])
                    } else {
                        span([], [])
                    },
                ],
            )],
        )
    }

    fn view_error(&self) -> Node<Msg> {
        match &self.error {
            Some(error) => div(
                [class("max-w-7xl mx-auto mt-4 px-4 py-3 rounded-lg bg-ctp-red/20 text-ctp-red flex justify-between")],
                [
                    span([], [text(error)]),
                    button(
                        [on_click(|_| Msg::DismissError), r#type("button")],
                        [text("✕")],
                    ),
                ],
            ),
            None => span([], []),
        }
    }

    fn view_boards_page(&self) -> Node<Msg> {
        let mut boards: Vec<&Board> = self.boards.iter().collect();
        boards.sort_by_key(|b| (!b.is_favorite, b.created_at));

        div(
            [class("space-y-8")],
            [
                div(
                    [class("p-6 bg-ctp-surface0 rounded-lg border border-ctp-surface1 flex gap-4")],
                    [
                        input(
                            [
                                r#type("text"),
                                placeholder("New board name"),
                                value(&self.new_board_name),
                                on_input(|event| Msg::SetNewBoardName(event.value())),
                                class("flex-1 px-3 py-2 bg-ctp-surface1 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0"),
                            ],
                            [],
                        ),
                        button(
                            [
                                on_click(|_| Msg::CreateBoard),
                                class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md"),
                                r#type("button"),
                            ],
                            [text("Create Board")],
                        ),
                    ],
                ),
                if boards.is_empty() && !self.loading {
                    div(
                        [class("text-center py-12 text-ctp-subtext0")],
                        [text("No boards yet. Create one above to get started!")],
                    )
                } else {
                    div(
                        [class("grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6")],
                        boards.into_iter().map(|b| self.view_board_card(b)).collect::<Vec<_>>(),
                    )
                },
            ],
        )
    }

    fn view_board_card(&self, board: &Board) -> Node<Msg> {
        let board_id = board.id;
        div(
            [
                key(board_id.to_string()),
                class("bg-ctp-surface0 rounded-lg shadow-lg p-6 border border-ctp-surface1 flex flex-col gap-3"),
            ],
            [
                div(
                    [class("flex items-center justify-between")],
                    [
                        a(
                            [
                                href(&Page::Board(board_id).to_path()),
                                on_click(move |event| {
                                    event.prevent_default();
                                    Msg::NavigateTo(Page::Board(board_id))
                                }),
                                class("text-xl font-semibold text-ctp-text hover:text-ctp-blue"),
                            ],
                            [text(&board.name)],
                        ),
                        button(
                            [
                                on_click(move |_| Msg::ToggleFavorite(board_id)),
                                class("text-xl text-ctp-yellow"),
                                r#type("button"),
                            ],
                            [text(if board.is_favorite { "★" } else { "☆" })],
                        ),
                    ],
                ),
                p(
                    [class("text-sm text-ctp-subtext1")],
                    [text(board.description.as_deref().unwrap_or(""))],
                ),
                button(
                    [
                        on_click(move |_| Msg::DeleteBoard(board_id)),
                        class("self-end bg-ctp-red/20 text-ctp-red hover:bg-ctp-red/30 px-3 py-1 rounded-full text-sm"),
                        r#type("button"),
                    ],
                    [text("Delete")],
                ),
            ],
        )
    }

    fn view_board_page(&self) -> Node<Msg> {
        let Some(snapshot) = &self.snapshot else {
            return div(
                [class("text-center py-10 text-ctp-subtext0 italic")],
                [text("Loading...")],
            );
        };
        let lists = snapshot.lists_in_order();
        let list_ids: Vec<i64> = lists.iter().map(|list| list.id).collect();

        div(
            [class("space-y-6")],
            [
                h2(
                    [class("text-3xl font-bold text-ctp-text")],
                    [text(&snapshot.board.name)],
                ),
                div(
                    [class("flex gap-4 max-w-md")],
                    [
                        input(
                            [
                                r#type("text"),
                                placeholder("New list name"),
                                value(&self.new_list_name),
                                on_input(|event| Msg::SetNewListName(event.value())),
                                class("flex-1 px-3 py-2 bg-ctp-surface1 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0"),
                            ],
                            [],
                        ),
                        button(
                            [
                                on_click(|_| Msg::CreateList),
                                class("bg-ctp-green hover:bg-ctp-teal text-ctp-base font-medium px-4 py-2 rounded-md"),
                                r#type("button"),
                            ],
                            [text("Add List")],
                        ),
                    ],
                ),
                div(
                    [class("flex gap-6 overflow-x-auto pb-4")],
                    lists
                        .iter()
                        .enumerate()
                        .map(|(index, list)| self.view_list(snapshot, list, index, &list_ids))
                        .collect::<Vec<_>>(),
                ),
            ],
        )
    }

    fn view_list(
        &self,
        snapshot: &BoardSnapshot,
        list: &TaskList,
        index: usize,
        list_ids: &[i64],
    ) -> Node<Msg> {
        let list_id = list.id;
        let tasks = snapshot.tasks_in_list(list_id);
        let is_last = index + 1 == list_ids.len();
        let neighbours = Neighbours {
            left: index.checked_sub(1).map(|i| list_ids[i]),
            right: list_ids.get(index + 1).copied(),
        };
        let new_task_name = self
            .new_task_names
            .get(&list_id)
            .cloned()
            .unwrap_or_default();

        div(
            [
                key(list_id.to_string()),
                class("w-72 flex-shrink-0 bg-ctp-surface0 rounded-lg border border-ctp-surface1 p-4 space-y-3"),
            ],
            [
                div(
                    [class("flex items-center justify-between")],
                    [
                        h3([class("text-lg font-semibold text-ctp-text")], [text(&list.name)]),
                        div(
                            [class("flex gap-1")],
                            [
                                small_button(
                                    "◀",
                                    index == 0,
                                    Msg::MoveList(list_id, index as i64 - 1),
                                ),
                                small_button("▶", is_last, Msg::MoveList(list_id, index as i64 + 1)),
                                small_button("🗑️", false, Msg::DeleteList(list_id)),
                            ],
                        ),
                    ],
                ),
                div(
                    [class("space-y-2")],
                    tasks
                        .iter()
                        .enumerate()
                        .map(|(task_index, task)| {
                            self.view_task(snapshot, task, task_index, tasks.len(), &neighbours)
                        })
                        .collect::<Vec<_>>(),
                ),
                div(
                    [class("flex gap-2")],
                    [
                        input(
                            [
                                r#type("text"),
                                placeholder("New task"),
                                value(&new_task_name),
                                on_input(move |event| Msg::SetNewTaskName(list_id, event.value())),
                                class("flex-1 px-2 py-1 bg-ctp-surface1 border border-ctp-surface2 rounded-md text-sm text-ctp-text placeholder-ctp-subtext0"),
                            ],
                            [],
                        ),
                        button(
                            [
                                on_click(move |_| Msg::CreateTask(list_id)),
                                class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base text-sm px-3 py-1 rounded-md"),
                                r#type("button"),
                            ],
                            [text("Add")],
                        ),
                    ],
                ),
            ],
        )
    }

    fn view_task(
        &self,
        snapshot: &BoardSnapshot,
        task: &Task,
        index: usize,
        count: usize,
        neighbours: &Neighbours,
    ) -> Node<Msg> {
        let task_id = task.id;
        let list_id = task.list_id;
        // Cross-list moves append to the end of the neighbouring list.
        let append_to = |target: i64| Msg::MoveTask {
            task_id,
            list_id: target,
            index: snapshot.tasks_in_list(target).len() as i64,
        };
        let to_left = neighbours.left.map(&append_to);
        let to_right = neighbours.right.map(&append_to);

        div(
            [
                key(task_id.to_string()),
                class("bg-ctp-surface1 rounded-md p-3 border border-ctp-surface2 space-y-2"),
            ],
            [
                div(
                    [class("flex items-start gap-2")],
                    [
                        input(
                            [
                                r#type("checkbox"),
                                checked(task.is_completed),
                                on_click(move |_| Msg::ToggleTask(task_id)),
                            ],
                            [],
                        ),
                        span(
                            [class(if task.is_completed {
                                "line-through text-ctp-overlay1"
                            } else {
                                "text-ctp-text"
                            })],
                            [text(&task.name)],
                        ),
                    ],
                ),
                div(
                    [class("flex gap-1 justify-end")],
                    [
                        small_button(
                            "▲",
                            index == 0,
                            Msg::MoveTask {
                                task_id,
                                list_id,
                                index: index as i64 - 1,
                            },
                        ),
                        small_button(
                            "▼",
                            index + 1 >= count,
                            Msg::MoveTask {
                                task_id,
                                list_id,
                                index: index as i64 + 1,
                            },
                        ),
                        move_button("◀", to_left),
                        move_button("▶", to_right),
                        small_button("🗑️", false, Msg::DeleteTask(task_id)),
                    ],
                ),
            ],
        )
    }
}

/// Lists on either side of the one being rendered.
struct Neighbours {
    left: Option<i64>,
    right: Option<i64>,
}

fn small_button(label_text: &str, is_disabled: bool, msg: Msg) -> Node<Msg> {
    button(
        [
            on_click(move |_| msg.clone()),
            class("w-7 h-7 rounded bg-ctp-surface2 hover:bg-ctp-overlay0 text-xs disabled:opacity-30"),
            r#type("button"),
            disabled(is_disabled),
        ],
        [text(label_text)],
    )
}

fn move_button(label_text: &str, msg: Option<Msg>) -> Node<Msg> {
    match msg {
        Some(msg) => small_button(label_text, false, msg),
        None => small_button(label_text, true, Msg::Synced),
    }
}

fn report(error: String) -> Cmd<Msg> {
    Cmd::new(async move { Msg::Error(error) })
}

fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// The app keeps no history state of its own, so back and forward reload the
/// page for the new path.
fn setup_popstate_listener() {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    let Some(window) = window() else {
        return;
    };
    let callback = Closure::wrap(Box::new(|_event: web_sys::PopStateEvent| {
        if let Some(window) = web_sys::window() {
            let location = window.location();
            if let Ok(pathname) = location.pathname() {
                console::log_1(&format!("Route changed to: {}", pathname).into());
            }
            let _ = location.reload();
        }
    }) as Box<dyn FnMut(_)>);

    if window
        .add_event_listener_with_callback("popstate", callback.as_ref().unchecked_ref())
        .is_err()
    {
        console::log_1(&"Failed to register popstate listener".into());
    }
    callback.forget();
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
