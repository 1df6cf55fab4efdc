// src/state/store.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{Result, RunqueueError};
use crate::state::STATE_FILE_PATH;
use crate::types::TaskId;

/// Per-workspace execution record, serialized as TOML.
///
/// Invariants:
/// - an id is never simultaneously in `completed` and `failed`;
/// - `completed` only grows;
/// - `failed` entries are overwritten by later failures, while `attempts`
///   only ever increases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    /// Ids that finished with the canonical success outcome, in completion order.
    #[serde(default)]
    pub completed: Vec<TaskId>,

    /// Last observed non-success code per id.
    #[serde(default)]
    pub failed: BTreeMap<TaskId, i32>,

    /// Total times each id has been marked failed across the life of the store.
    #[serde(default)]
    pub attempts: BTreeMap<TaskId, u32>,

    /// The task presumed in flight; non-empty at load time means the previous
    /// run died between launching a task and recording its outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<TaskId>,
}

impl ExecutionState {
    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.iter().any(|c| c == id)
    }

    pub fn attempts_of(&self, id: &str) -> u32 {
        self.attempts.get(id).copied().unwrap_or(0)
    }
}

/// Durable store wrapping [`ExecutionState`].
///
/// Every mutating operation persists synchronously before returning; the
/// scheduler loop's eligibility decisions depend on the persisted form
/// surviving a crash at any point.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: ExecutionState,
}

impl StateStore {
    /// Load the persisted state from `<workspace>/.runqueue/state.toml`.
    ///
    /// An absent file yields an empty state. A malformed file is a
    /// `CorruptState` error: the caller fails the run rather than silently
    /// discarding history.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = workspace.join(STATE_FILE_PATH);

        let state = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str(&contents).map_err(|err| RunqueueError::CorruptState {
                path: path.clone(),
                reason: err.to_string(),
            })?
        } else {
            debug!(path = %path.display(), "no persisted state; starting empty");
            ExecutionState::default()
        };

        Ok(Self { path, state })
    }

    /// Detect and repair an abnormal prior shutdown.
    ///
    /// If `current` is non-empty the previous run died mid-task. The orphaned
    /// id is returned for logging and `current` is cleared; the task is
    /// neither completed nor charged an attempt, so it is simply re-selected
    /// as if pending.
    pub fn reconcile(&mut self) -> Result<Option<TaskId>> {
        let Some(orphan) = self.state.current.take() else {
            return Ok(None);
        };
        warn!(
            task = %orphan,
            "found task left in flight by a previous run; it will be re-attempted"
        );
        self.persist()?;
        Ok(Some(orphan))
    }

    /// Record the canonical success outcome for `id`.
    pub fn mark_completed(&mut self, id: &str) -> Result<()> {
        if !self.state.is_completed(id) {
            self.state.completed.push(id.to_string());
        }
        self.state.failed.remove(id);
        self.persist()
    }

    /// Record a non-success outcome `code` for `id` and charge an attempt.
    pub fn mark_failed(&mut self, id: &str, code: i32) -> Result<()> {
        self.state.failed.insert(id.to_string(), code);
        *self.state.attempts.entry(id.to_string()).or_insert(0) += 1;
        self.persist()
    }

    /// Record (or clear) the in-flight task id.
    ///
    /// Called with `Some(id)` immediately before a process is launched and
    /// with `None` immediately after the task resolves; the window between
    /// the two is what crash reconciliation detects.
    pub fn mark_current(&mut self, id: Option<&str>) -> Result<()> {
        self.state.current = id.map(|s| s.to_string());
        self.persist()
    }

    pub fn attempts_of(&self, id: &str) -> u32 {
        self.state.attempts_of(id)
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Rewrite the backing document in full, atomically.
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "persisted execution state");
        Ok(())
    }
}
