// src/exec/terminate.rs

//! Escalating termination of a task's process tree.
//!
//! Used both for timeouts and for user cancellation. Three attempts of
//! increasing severity, each bounded by a grace period:
//!
//! 1. graceful termination of the primary handle (SIGTERM),
//! 2. the same signal to the whole process group, covering children the
//!    primary may have spawned,
//! 3. force kill of the primary handle.
//!
//! The child may legitimately exit between any two steps, so every step is
//! its own fault boundary: errors are logged and swallowed, never propagated.
//! A user-requested stop must not be able to crash the supervising process.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Run the termination sequence until the child is confirmed reaped.
///
/// Returns the exit status when the child could be waited on; `None` only if
/// even the final wait failed (the process is gone either way).
pub async fn escalate(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    // Step 1: ask nicely.
    signal_primary(child);
    if let Some(status) = wait_bounded(child, grace).await {
        debug!("child exited after graceful termination request");
        return Some(status);
    }

    // Step 2: the primary may have spawned its own children; signal the
    // whole group. The group may already be gone, hence best effort.
    signal_group(child);
    if let Some(status) = wait_bounded(child, grace).await {
        debug!("child exited after process-group signal");
        return Some(status);
    }

    // Step 3: no more patience.
    if let Err(err) = child.kill().await {
        warn!(error = %err, "force kill of task process failed");
    }

    match child.wait().await {
        Ok(status) => Some(status),
        Err(err) => {
            warn!(error = %err, "could not reap task process after force kill");
            None
        }
    }
}

async fn wait_bounded(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    match timeout(grace, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(err)) => {
            warn!(error = %err, "waiting on task process failed");
            None
        }
        Err(_elapsed) => None,
    }
}

#[cfg(unix)]
fn signal_primary(child: &mut Child) {
    let Some(pid) = child.id() else {
        // Already reaped.
        return;
    };
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        debug!(
            pid,
            error = %std::io::Error::last_os_error(),
            "SIGTERM to primary process failed"
        );
    }
}

#[cfg(not(unix))]
fn signal_primary(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        debug!(error = %err, "terminating primary process failed");
    }
}

/// Signal the child's process group. The child was spawned with
/// `process_group(0)`, so its pgid equals its pid.
#[cfg(unix)]
fn signal_group(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        debug!(
            pid,
            error = %std::io::Error::last_os_error(),
            "SIGTERM to process group failed"
        );
    }
}

#[cfg(not(unix))]
fn signal_group(_child: &mut Child) {
    // No process-group semantics; step 3 will force kill the primary.
}
