// src/exec/supervisor.rs

//! Single-task process supervision.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalog::Task;
use crate::exec::{stream, terminate};
use crate::types::{EXIT_LAUNCH_FAILURE, EXIT_TIMEOUT};

/// Everything observed from one task execution.
///
/// Owned by the supervisor while the task is in flight; handed to the
/// classifier afterwards and then discarded (the log files keep the full
/// output).
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Child's native exit status, `-(signal)` for signal termination, or a
    /// synthetic sentinel (124 timeout, 127 launch failure).
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub duration_exceeded: bool,
}

impl RunResult {
    fn launch_failure(message: String) -> Self {
        Self {
            exit_code: EXIT_LAUNCH_FAILURE,
            stdout: Vec::new(),
            stderr: vec![message],
            duration_exceeded: false,
        }
    }
}

/// Launches and supervises one external process at a time.
#[derive(Debug, Clone)]
pub struct Supervisor {
    log_dir: Option<PathBuf>,
    grace: Duration,
}

impl Supervisor {
    /// `log_dir`: where per-task `<id>.out.log` / `<id>.err.log` files go;
    /// `None` disables log mirroring (used by some tests).
    pub fn new(log_dir: Option<PathBuf>) -> Self {
        Self {
            log_dir,
            grace: Duration::from_secs(1),
        }
    }

    /// Override the per-step grace period of the termination sequence.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run `task` to completion, bounded by `timeout`.
    ///
    /// Never returns an error: launch failures are reported as exit code 127
    /// so the result channel stays uniform, and the termination sequence
    /// swallows its own faults. `cancel` flipping to `true` at any point
    /// triggers the termination sequence.
    pub async fn run(
        &self,
        task: &Task,
        timeout: Duration,
        mut cancel: watch::Receiver<bool>,
    ) -> RunResult {
        info!(task = %task.id, cmd = %task.cmd, dir = %task.dir.display(), "launching task process");

        let mut cmd = shell_command(&task.cmd);
        cmd.current_dir(&task.dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(task = %task.id, error = %err, "task process could not be launched");
                return RunResult::launch_failure(format!("failed to launch command: {err}"));
            }
        };

        let stdout_reader =
            stream::spawn_line_reader(child.stdout.take(), self.log_path(task, "out"));
        let stderr_reader =
            stream::spawn_line_reader(child.stderr.take(), self.log_path(task, "err"));

        let mut duration_exceeded = false;

        // Wait for exit, bounded by the timeout, interruptible by
        // cancellation at sub-second granularity.
        let status: Option<ExitStatus> = tokio::select! {
            res = child.wait() => match res {
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(task = %task.id, error = %err, "waiting on task process failed");
                    None
                }
            },
            _ = tokio::time::sleep(timeout) => {
                warn!(task = %task.id, ?timeout, "task exceeded its wall-clock limit");
                duration_exceeded = true;
                None
            }
            _ = cancelled(&mut cancel) => {
                info!(task = %task.id, "cancellation requested; terminating task process");
                None
            }
        };

        let exit_code = match status {
            Some(status) => exit_code_of(&status),
            None => {
                let reaped = terminate::escalate(&mut child, self.grace).await;
                if duration_exceeded {
                    EXIT_TIMEOUT
                } else {
                    reaped
                        .map(|status| exit_code_of(&status))
                        .unwrap_or(default_kill_code())
                }
            }
        };

        let stdout = stream::finish(stdout_reader).await;
        let stderr = stream::finish(stderr_reader).await;

        debug!(
            task = %task.id,
            exit_code,
            duration_exceeded,
            stdout_lines = stdout.len(),
            stderr_lines = stderr.len(),
            "task process resolved"
        );

        RunResult {
            exit_code,
            stdout,
            stderr,
            duration_exceeded,
        }
    }

    fn log_path(&self, task: &Task, kind: &str) -> Option<PathBuf> {
        self.log_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}.log", task.id, kind)))
    }
}

/// Resolves when cancellation has been requested; pends forever if the cancel
/// channel is closed (a closed channel means nobody can ask us to stop).
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

fn exit_code_of(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

#[cfg(unix)]
fn default_kill_code() -> i32 {
    -libc::SIGKILL
}

#[cfg(not(unix))]
fn default_kill_code() -> i32 {
    -9
}
