// src/exec/stream.rs

//! Non-blocking stream drainage for task processes.
//!
//! Each stream gets its own reader task so a chatty child can never fill a
//! pipe buffer and stall. Lines are kept in memory (bounded) for the
//! classifier and mirrored to an append-only log file as they arrive, so a
//! consumer can tail progress without waiting for completion.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::warn;

/// Upper bound on lines kept in memory per stream; beyond this the oldest
/// lines are dropped (the log file still has everything).
pub const MAX_CAPTURED_LINES: usize = 10_000;

/// How long to wait for a reader to finish after the child has exited.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a reader task draining `stream` line by line.
///
/// The returned handle resolves to the captured lines once the stream hits
/// EOF (i.e. the child closed its end). Log write failures are degraded to
/// warnings; they must not interrupt drainage.
pub fn spawn_line_reader<R>(
    stream: Option<R>,
    log_path: Option<PathBuf>,
) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut captured: VecDeque<String> = VecDeque::new();

        let Some(stream) = stream else {
            return Vec::new();
        };

        let mut log = open_log(log_path.as_deref()).await;
        let mut lines = BufReader::new(stream).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(file) = log.as_mut() {
                if write_line(file, &line).await.is_err() {
                    warn!("task log write failed; disabling log mirroring for this stream");
                    log = None;
                }
            }

            if captured.len() == MAX_CAPTURED_LINES {
                captured.pop_front();
            }
            captured.push_back(line);
        }

        captured.into()
    })
}

/// Collect the lines from a reader spawned by [`spawn_line_reader`].
///
/// Bounded: a reader that somehow fails to reach EOF (or panicked) yields an
/// empty capture instead of hanging the supervisor.
pub async fn finish(handle: JoinHandle<Vec<String>>) -> Vec<String> {
    match tokio::time::timeout(READER_DRAIN_TIMEOUT, handle).await {
        Ok(Ok(lines)) => lines,
        Ok(Err(err)) => {
            warn!(error = %err, "stream reader task failed");
            Vec::new()
        }
        Err(_) => {
            warn!("stream reader did not reach EOF in time; discarding capture");
            Vec::new()
        }
    }
}

async fn open_log(path: Option<&Path>) -> Option<tokio::fs::File> {
    let path = path?;

    if let Some(parent) = path.parent() {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            warn!(error = %err, dir = %parent.display(), "could not create log directory");
            return None;
        }
    }

    match tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
    {
        Ok(file) => Some(file),
        Err(err) => {
            warn!(error = %err, path = %path.display(), "could not open task log");
            None
        }
    }
}

async fn write_line(file: &mut tokio::fs::File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    // Flush per line so the log can be tailed while the task runs.
    file.flush().await
}
