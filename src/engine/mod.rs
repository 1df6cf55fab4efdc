// src/engine/mod.rs

//! The task execution engine.
//!
//! This module ties together:
//! - the catalog (what to run, in what order)
//! - the state store (what already happened, durably)
//! - the supervisor (one external process at a time)
//! - the classifier (what actually happened)
//!
//! The pure selection rule lives in [`scheduler`]; the async loop and the
//! `Engine` control surface (`start` / `stop` / `status`) live in
//! [`runtime`]. There are no process-wide singletons: all run state is owned
//! by an [`Engine`] instance.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::TaskId;

pub mod runtime;
pub mod scheduler;

pub use runtime::Engine;

/// Options for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Per-task wall-clock limit.
    pub timeout: Duration,
    /// Maximum attempts per task before it is permanently skipped.
    pub retry_ceiling: u32,
    /// Directory holding the persisted state and task logs.
    pub workspace: PathBuf,
}

/// Read-only snapshot derived from the state store; safe to poll while a run
/// is active.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    /// Ids still eligible to run (not completed, not exhausted, not in flight).
    pub pending: Vec<TaskId>,
    /// The task currently in flight, if any.
    pub in_flight: Option<TaskId>,
    /// Number of completed tasks.
    pub completed: usize,
    /// Number of tasks with a recorded failure.
    pub failed: usize,
    /// Last observed non-success code per id.
    pub last_codes: BTreeMap<TaskId, i32>,
}

/// Outcome of one scheduler-loop run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    /// Ids permanently skipped because they reached the retry ceiling.
    pub skipped: Vec<TaskId>,
    /// True when the loop exited because `stop()` was requested.
    pub stopped: bool,
}
