//! Property tests for the pure selection rules.

use std::path::PathBuf;

use proptest::prelude::*;

use runqueue::catalog::Task;
use runqueue::engine::scheduler::{exhausted_ids, next_eligible, pending_ids};
use runqueue::state::ExecutionState;

fn make_tasks(n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| Task {
            id: format!("t{i}"),
            cmd: "true".to_string(),
            dir: PathBuf::from("."),
        })
        .collect()
}

proptest! {
    #[test]
    fn selection_respects_completion_and_the_ceiling(
        completed_mask in prop::collection::vec(any::<bool>(), 1..12),
        attempt_counts in prop::collection::vec(0u32..5, 12),
        ceiling in 1u32..5,
    ) {
        let n = completed_mask.len();
        let tasks = make_tasks(n);

        let mut state = ExecutionState::default();
        for i in 0..n {
            if completed_mask[i] {
                state.completed.push(format!("t{i}"));
            }
            if attempt_counts[i] > 0 {
                state.attempts.insert(format!("t{i}"), attempt_counts[i]);
                state.failed.insert(format!("t{i}"), 1);
            }
        }

        match next_eligible(&tasks, &state, ceiling) {
            Some(task) => {
                prop_assert!(!state.is_completed(&task.id));
                prop_assert!(state.attempts_of(&task.id) < ceiling);

                // Selection honours catalog order: everything before the
                // chosen task must be terminal.
                let idx = tasks.iter().position(|t| t.id == task.id).unwrap();
                for earlier in &tasks[..idx] {
                    prop_assert!(
                        state.is_completed(&earlier.id)
                            || state.attempts_of(&earlier.id) >= ceiling
                    );
                }
            }
            None => {
                for task in &tasks {
                    prop_assert!(
                        state.is_completed(&task.id)
                            || state.attempts_of(&task.id) >= ceiling
                    );
                }
            }
        }
    }

    #[test]
    fn pending_and_exhausted_partition_the_unfinished_tasks(
        completed_mask in prop::collection::vec(any::<bool>(), 1..12),
        attempt_counts in prop::collection::vec(0u32..5, 12),
        ceiling in 1u32..5,
    ) {
        let n = completed_mask.len();
        let tasks = make_tasks(n);

        let mut state = ExecutionState::default();
        for i in 0..n {
            if completed_mask[i] {
                state.completed.push(format!("t{i}"));
            }
            if attempt_counts[i] > 0 {
                state.attempts.insert(format!("t{i}"), attempt_counts[i]);
                state.failed.insert(format!("t{i}"), 1);
            }
        }

        let pending = pending_ids(&tasks, &state, ceiling);
        let exhausted = exhausted_ids(&tasks, &state, ceiling);

        for task in &tasks {
            let in_pending = pending.contains(&task.id);
            let in_exhausted = exhausted.contains(&task.id);
            prop_assert!(!(in_pending && in_exhausted));
            if state.is_completed(&task.id) {
                prop_assert!(!in_pending && !in_exhausted);
            } else {
                // Every unfinished task lands in exactly one bucket.
                prop_assert!(in_pending ^ in_exhausted);
            }
        }

        // With nothing in flight, the next selection is the pending head.
        prop_assert_eq!(
            next_eligible(&tasks, &state, ceiling).map(|t| t.id.clone()),
            pending.first().cloned()
        );
    }

    #[test]
    fn the_in_flight_task_is_never_reported_pending(
        n in 1usize..8,
        current_idx in 0usize..8,
    ) {
        let tasks = make_tasks(n);
        let mut state = ExecutionState::default();
        state.current = Some(format!("t{}", current_idx % n));

        let pending = pending_ids(&tasks, &state, 3);
        prop_assert!(!pending.contains(state.current.as_ref().unwrap()));
    }
}
