//! Client-side copy of one board.
//!
//! The browser applies drags to a `BoardSnapshot` before the server has
//! answered. The snapshot is a cache, not the source of truth: after a failed
//! request the client refetches and rebuilds it.

use serde::{Deserialize, Serialize};

use crate::models::{Board, Task, TaskList};
use crate::ordering::{self, OrderingError, Placement};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board: Board,
    pub lists: Vec<TaskList>,
    pub tasks: Vec<Task>,
}

impl BoardSnapshot {
    pub fn new(board: Board, lists: Vec<TaskList>, tasks: Vec<Task>) -> Self {
        Self {
            board,
            lists,
            tasks,
        }
    }

    /// Lists sorted left to right.
    pub fn lists_in_order(&self) -> Vec<&TaskList> {
        let mut lists: Vec<&TaskList> = self.lists.iter().collect();
        lists.sort_by_key(|list| (list.position, list.id));
        lists
    }

    /// Tasks of one list sorted top to bottom.
    pub fn tasks_in_list(&self, list_id: i64) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.list_id == list_id)
            .collect();
        tasks.sort_by_key(|task| (task.position, task.id));
        tasks
    }

    pub fn list_order(&self) -> Vec<i64> {
        self.lists_in_order().iter().map(|list| list.id).collect()
    }

    pub fn task_order(&self, list_id: i64) -> Vec<i64> {
        self.tasks_in_list(list_id).iter().map(|task| task.id).collect()
    }

    pub fn find_task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn apply_list_reorder(&mut self, order: &[i64]) -> Result<(), OrderingError> {
        let members: Vec<Placement> = self
            .lists
            .iter()
            .map(|list| Placement {
                id: list.id,
                position: list.position,
            })
            .collect();
        for update in ordering::reorder(&members, order)? {
            if let Some(list) = self.lists.iter_mut().find(|list| list.id == update.id) {
                list.position = update.position;
            }
        }
        Ok(())
    }

    pub fn apply_task_reorder(&mut self, list_id: i64, order: &[i64]) -> Result<(), OrderingError> {
        let members: Vec<Placement> = self
            .tasks
            .iter()
            .filter(|task| task.list_id == list_id)
            .map(|task| Placement {
                id: task.id,
                position: task.position,
            })
            .collect();
        for update in ordering::reorder(&members, order)? {
            self.set_task_placement(update, list_id);
        }
        Ok(())
    }

    /// Move a task to `index` of `list_id`, which may be its current list.
    pub fn apply_task_move(
        &mut self,
        task_id: i64,
        list_id: i64,
        index: i64,
    ) -> Result<(), OrderingError> {
        let source_id = self
            .find_task(task_id)
            .map(|task| task.list_id)
            .ok_or(OrderingError::UnknownMember(task_id))?;

        if source_id == list_id {
            let order = ordering::move_within(&self.task_order(list_id), task_id, index)?;
            return self.apply_task_reorder(list_id, &order);
        }

        let plan = ordering::plan_move(
            &self.task_order(source_id),
            &self.task_order(list_id),
            task_id,
            index,
        )?;
        for placement in plan.source {
            self.set_task_placement(placement, source_id);
        }
        for placement in plan.destination {
            self.set_task_placement(placement, list_id);
        }
        Ok(())
    }

    fn set_task_placement(&mut self, placement: Placement, list_id: i64) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == placement.id) {
            task.list_id = list_id;
            task.position = placement.position;
        }
    }

    pub fn insert_list(&mut self, list: TaskList) {
        self.lists.push(list);
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Replace a task with the server's copy.
    pub fn replace_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Drop a list and its tasks. Sibling positions are left alone.
    pub fn remove_list(&mut self, list_id: i64) {
        self.lists.retain(|list| list.id != list_id);
        self.tasks.retain(|task| task.list_id != list_id);
    }

    pub fn remove_task(&mut self, task_id: i64) {
        self.tasks.retain(|task| task.id != task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn board() -> Board {
        Board {
            id: 1,
            name: "B1".into(),
            description: None,
            is_favorite: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn list(id: i64, position: i64) -> TaskList {
        TaskList {
            id,
            name: format!("list {id}"),
            board_id: 1,
            position,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(id: i64, list_id: i64, position: i64) -> Task {
        Task {
            id,
            name: format!("T{id}"),
            list_id,
            position,
            description: None,
            started_date: None,
            end_date: None,
            is_completed: false,
            repeat_interval: None,
            repeat_days: Vec::new(),
            has_reminder: false,
            reminder_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            attachments: None,
        }
    }

    fn snapshot() -> BoardSnapshot {
        BoardSnapshot::new(
            board(),
            vec![list(10, 0), list(20, 1)],
            vec![task(1, 10, 0), task(2, 10, 1), task(3, 10, 2)],
        )
    }

    #[test]
    fn test_move_to_other_list_renumbers_both() {
        let mut snapshot = snapshot();
        snapshot.apply_task_move(1, 20, 0).unwrap();

        assert_eq!(snapshot.task_order(10), vec![2, 3]);
        assert_eq!(snapshot.task_order(20), vec![1]);
        let positions: Vec<i64> = snapshot
            .tasks_in_list(10)
            .iter()
            .map(|task| task.position)
            .collect();
        assert_eq!(positions, vec![0, 1]);
        assert_eq!(snapshot.find_task(1).unwrap().position, 0);
    }

    #[test]
    fn test_move_within_same_list() {
        let mut snapshot = snapshot();
        snapshot.apply_task_move(3, 10, 0).unwrap();
        assert_eq!(snapshot.task_order(10), vec![3, 1, 2]);
        assert_eq!(snapshot.find_task(1).unwrap().position, 1);
    }

    #[test]
    fn test_list_reorder() {
        let mut snapshot = snapshot();
        snapshot.apply_list_reorder(&[20, 10]).unwrap();
        assert_eq!(snapshot.list_order(), vec![20, 10]);
        assert!(snapshot.apply_list_reorder(&[20]).is_err());
    }

    #[test]
    fn test_remove_list_keeps_gap() {
        let mut snapshot = snapshot();
        snapshot.insert_list(list(30, 2));
        snapshot.remove_list(20);
        let positions: Vec<i64> = snapshot
            .lists_in_order()
            .iter()
            .map(|list| list.position)
            .collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn test_negative_index_moves_to_front() {
        let mut snapshot = snapshot();
        snapshot.insert_task(task(4, 20, 0));
        snapshot.apply_task_move(2, 20, -3).unwrap();
        assert_eq!(snapshot.task_order(20), vec![2, 4]);
        assert_eq!(snapshot.task_order(10), vec![1, 3]);
    }

    #[test]
    fn test_unknown_task_move_fails() {
        let mut snapshot = snapshot();
        assert_eq!(
            snapshot.apply_task_move(99, 20, 0),
            Err(OrderingError::UnknownMember(99))
        );
    }
}
