// src/types.rs

//! Exit-code taxonomy shared across the engine.
//!
//! Codes exposed to callers:
//! - `0` — success
//! - `124` — task exceeded its wall-clock timeout (shell `timeout(1)` convention)
//! - `127` — the task's process could not be launched
//! - `503` — in-band service failure detected by the classifier (synthetic)
//! - negative values — terminated by the signal with that number (e.g. `-15`)
//! - any other positive value — the child's own failure code, verbatim

/// Canonical task identifier type used throughout the engine.
pub type TaskId = String;

/// Canonical success code.
pub const EXIT_SUCCESS: i32 = 0;

/// Sentinel recorded when a task exceeds its wall-clock limit.
pub const EXIT_TIMEOUT: i32 = 124;

/// Sentinel recorded when the task's process cannot be started at all.
pub const EXIT_LAUNCH_FAILURE: i32 = 127;

/// Sentinel recorded when an apparently-successful run carried an in-band
/// failure in its output.
pub const EXIT_SERVICE_FAILURE: i32 = 503;
