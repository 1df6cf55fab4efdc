// src/engine/scheduler.rs

//! Pure task selection.
//!
//! The scheduler loop never caches eligibility: each iteration re-derives the
//! next task from the catalog's fixed order plus the current execution state.
//! This module is synchronous and deterministic so the selection rule can be
//! tested without Tokio, processes, or the filesystem.

use crate::catalog::Task;
use crate::state::ExecutionState;
use crate::types::TaskId;

/// The first task in catalog order that is neither completed nor exhausted.
///
/// Returns `None` when every task is terminal for this run ("all done",
/// where permanently skipped ids count as done).
pub fn next_eligible<'a>(
    tasks: &'a [Task],
    state: &ExecutionState,
    retry_ceiling: u32,
) -> Option<&'a Task> {
    tasks
        .iter()
        .find(|task| is_eligible(task, state, retry_ceiling))
}

/// Ids that are still runnable: not completed, attempts below the ceiling,
/// and not currently in flight.
pub fn pending_ids(tasks: &[Task], state: &ExecutionState, retry_ceiling: u32) -> Vec<TaskId> {
    tasks
        .iter()
        .filter(|task| is_eligible(task, state, retry_ceiling))
        .filter(|task| state.current.as_deref() != Some(task.id.as_str()))
        .map(|task| task.id.clone())
        .collect()
}

/// Ids permanently skipped for this run: failed at least `retry_ceiling`
/// times and never completed.
pub fn exhausted_ids(tasks: &[Task], state: &ExecutionState, retry_ceiling: u32) -> Vec<TaskId> {
    tasks
        .iter()
        .filter(|task| !state.is_completed(&task.id))
        .filter(|task| state.attempts_of(&task.id) >= retry_ceiling)
        .map(|task| task.id.clone())
        .collect()
}

fn is_eligible(task: &Task, state: &ExecutionState, retry_ceiling: u32) -> bool {
    !state.is_completed(&task.id) && state.attempts_of(&task.id) < retry_ceiling
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter()
            .map(|id| Task {
                id: id.to_string(),
                cmd: format!("echo {id}"),
                dir: PathBuf::from("."),
            })
            .collect()
    }

    fn completed(state: &mut ExecutionState, id: &str) {
        state.completed.push(id.to_string());
    }

    fn failed(state: &mut ExecutionState, id: &str, code: i32, attempts: u32) {
        state.failed.insert(id.to_string(), code);
        state.attempts.insert(id.to_string(), attempts);
    }

    #[test]
    fn picks_the_first_task_of_a_fresh_state() {
        let tasks = tasks(&["a", "b", "c"]);
        let state = ExecutionState::default();
        assert_eq!(next_eligible(&tasks, &state, 3).unwrap().id, "a");
    }

    #[test]
    fn skips_completed_ids() {
        let tasks = tasks(&["a", "b", "c"]);
        let mut state = ExecutionState::default();
        completed(&mut state, "a");
        completed(&mut state, "b");
        assert_eq!(next_eligible(&tasks, &state, 3).unwrap().id, "c");
    }

    #[test]
    fn failed_tasks_stay_eligible_below_the_ceiling() {
        let tasks = tasks(&["a", "b"]);
        let mut state = ExecutionState::default();
        failed(&mut state, "a", 1, 2);
        assert_eq!(next_eligible(&tasks, &state, 3).unwrap().id, "a");
    }

    #[test]
    fn exhausted_tasks_are_permanently_skipped() {
        let tasks = tasks(&["a", "b"]);
        let mut state = ExecutionState::default();
        failed(&mut state, "a", 1, 3);
        assert_eq!(next_eligible(&tasks, &state, 3).unwrap().id, "b");
        assert_eq!(exhausted_ids(&tasks, &state, 3), vec!["a".to_string()]);
    }

    #[test]
    fn all_terminal_means_no_selection() {
        let tasks = tasks(&["a", "b"]);
        let mut state = ExecutionState::default();
        completed(&mut state, "a");
        failed(&mut state, "b", 124, 3);
        assert!(next_eligible(&tasks, &state, 3).is_none());
        assert!(pending_ids(&tasks, &state, 3).is_empty());
    }

    #[test]
    fn pending_excludes_the_in_flight_task() {
        let tasks = tasks(&["a", "b"]);
        let mut state = ExecutionState::default();
        state.current = Some("a".to_string());
        assert_eq!(pending_ids(&tasks, &state, 3), vec!["b".to_string()]);
    }

    #[test]
    fn a_crashed_attempt_does_not_consume_a_retry() {
        // `current` set but no attempt recorded: the task is simply pending.
        let tasks = tasks(&["a"]);
        let mut state = ExecutionState::default();
        state.current = Some("a".to_string());
        assert_eq!(next_eligible(&tasks, &state, 1).unwrap().id, "a");
    }
}
