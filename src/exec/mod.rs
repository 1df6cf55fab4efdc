// src/exec/mod.rs

//! Process supervision layer.
//!
//! This module owns everything between "the scheduler picked a task" and
//! "here is what actually happened", using `tokio::process::Command`:
//!
//! - [`supervisor`] launches one task at a time in its own process group,
//!   bounds it with a wall-clock timeout and reacts to cancellation.
//! - [`stream`] drains stdout/stderr concurrently, mirroring each line into
//!   a durable per-task log as it arrives.
//! - [`terminate`] implements the escalating termination sequence
//!   (graceful → process group → force kill), each step its own fault
//!   boundary so a stop request can never crash the supervising process.

pub mod stream;
pub mod supervisor;
pub mod terminate;

pub use supervisor::{RunResult, Supervisor};
