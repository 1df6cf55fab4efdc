// src/state/mod.rs

//! Durable execution state: which tasks are completed, which failed with what
//! code, how many attempts each has consumed, and which one (if any) was in
//! flight when the process last stopped.
//!
//! The store is the single source of truth for resumability. It is loaded in
//! full at startup and rewritten in full (write-to-temp-then-rename) after
//! every transition, so a concurrent `--status` reader can never observe a
//! torn document.

pub mod store;

pub use store::{ExecutionState, StateStore};

/// Relative path (from the workspace root) to the persisted state document.
pub const STATE_FILE_PATH: &str = ".runqueue/state.toml";

/// Relative path (from the workspace root) to the per-task log directory.
pub const LOG_DIR_PATH: &str = ".runqueue/logs";
