// src/engine/runtime.rs

//! The async scheduler loop and the `Engine` control surface.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::classify::Classifier;
use crate::engine::{scheduler, RunConfig, RunSummary, StatusSnapshot};
use crate::errors::Result;
use crate::exec::Supervisor;
use crate::state::{StateStore, LOG_DIR_PATH};
use crate::types::EXIT_SUCCESS;

/// Cheap handle for requesting a stop from another task (e.g. a Ctrl-C
/// listener). Idempotent; safe to use when nothing is running.
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// One engine instance owns one run's state: catalog, durable store,
/// supervisor and classifier. No globals.
pub struct Engine {
    catalog: Arc<Catalog>,
    store: Arc<Mutex<StateStore>>,
    classifier: Arc<Classifier>,
    config: RunConfig,
    grace: Duration,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<Result<RunSummary>>>,
}

impl Engine {
    /// Load (and crash-reconcile) the persisted state for `config.workspace`
    /// and prepare a run. Fails on a corrupt state file: history is never
    /// silently discarded.
    pub fn new(catalog: Catalog, classifier: Classifier, config: RunConfig) -> Result<Self> {
        let mut store = StateStore::load(&config.workspace)?;
        store.reconcile()?;

        let (cancel_tx, cancel_rx) = watch::channel(false);

        Ok(Self {
            catalog: Arc::new(catalog),
            store: Arc::new(Mutex::new(store)),
            classifier: Arc::new(classifier),
            config,
            grace: Duration::from_secs(1),
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
            handle: None,
        })
    }

    /// Override the termination-sequence grace period (mainly for tests).
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Spawn the scheduler loop. Errors if the engine was already started.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(anyhow!("engine already started").into());
        }

        let supervisor =
            Supervisor::new(Some(self.config.workspace.join(LOG_DIR_PATH))).with_grace(self.grace);

        let fut = run_loop(
            self.catalog.clone(),
            self.store.clone(),
            self.classifier.clone(),
            supervisor,
            self.config.clone(),
            self.cancel_rx.clone(),
        );
        self.handle = Some(tokio::spawn(fut));

        Ok(())
    }

    /// Request cancellation of the in-flight task and loop exit.
    ///
    /// Idempotent; safe before `start`, after completion, and repeatedly.
    pub fn stop(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// A clonable stop handle, detached from the engine's lifetime.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            cancel_tx: self.cancel_tx.clone(),
        }
    }

    /// Read-only snapshot of the last durably persisted state.
    pub fn status(&self) -> StatusSnapshot {
        let store = lock(&self.store);
        let state = store.state();

        StatusSnapshot {
            pending: scheduler::pending_ids(
                self.catalog.enumerate(),
                state,
                self.config.retry_ceiling,
            ),
            in_flight: state.current.clone(),
            completed: state.completed.len(),
            failed: state.failed.len(),
            last_codes: state.failed.clone(),
        }
    }

    /// Wait for the scheduler loop to finish and return its summary.
    pub async fn wait(&mut self) -> Result<RunSummary> {
        let Some(handle) = self.handle.take() else {
            return Ok(RunSummary::default());
        };

        match handle.await {
            Ok(res) => res,
            Err(err) => Err(anyhow!("scheduler loop panicked: {err}").into()),
        }
    }
}

/// The scheduler loop: select, supervise, classify, persist, repeat.
///
/// Errors from within one task's execution never abort the loop; only store
/// persistence failures do (losing durability would break resumability).
async fn run_loop(
    catalog: Arc<Catalog>,
    store: Arc<Mutex<StateStore>>,
    classifier: Arc<Classifier>,
    supervisor: Supervisor,
    config: RunConfig,
    cancel: watch::Receiver<bool>,
) -> Result<RunSummary> {
    info!(
        tasks = catalog.len(),
        retry_ceiling = config.retry_ceiling,
        timeout = ?config.timeout,
        "scheduler loop started"
    );

    let mut stopped = false;

    loop {
        if *cancel.borrow() {
            info!("stop requested; exiting scheduler loop");
            stopped = true;
            break;
        }

        // Re-derive eligibility from the catalog's fixed order plus the
        // persisted state; nothing is cached between iterations.
        let next = {
            let store = lock(&store);
            scheduler::next_eligible(catalog.enumerate(), store.state(), config.retry_ceiling)
                .cloned()
        };

        let Some(task) = next else {
            info!("no eligible task remains; run is done");
            break;
        };

        let attempt = lock(&store).attempts_of(&task.id) + 1;
        info!(task = %task.id, attempt, "task selected");

        // Bracket the crash-detection window: `current` is durable before
        // the process launches and cleared only after a terminal state for
        // this attempt has been persisted.
        lock(&store).mark_current(Some(&task.id))?;

        let result = supervisor.run(&task, config.timeout, cancel.clone()).await;
        let verdict = classifier.classify(&result);

        {
            let mut store = lock(&store);
            if verdict.code == EXIT_SUCCESS {
                info!(task = %task.id, "task completed");
                store.mark_completed(&task.id)?;
            } else {
                warn!(
                    task = %task.id,
                    code = verdict.code,
                    reason = ?verdict.reason,
                    timed_out = result.duration_exceeded,
                    "task failed"
                );
                store.mark_failed(&task.id, verdict.code)?;
            }
            store.mark_current(None)?;
        }
    }

    let (summary, skipped) = {
        let store = lock(&store);
        let state = store.state();
        let skipped = scheduler::exhausted_ids(catalog.enumerate(), state, config.retry_ceiling);
        (
            RunSummary {
                completed: state.completed.len(),
                failed: state.failed.len(),
                skipped: skipped.clone(),
                stopped,
            },
            skipped,
        )
    };

    for id in &skipped {
        warn!(task = %id, ceiling = config.retry_ceiling, "task reached the retry ceiling; permanently skipped");
    }

    info!(
        completed = summary.completed,
        failed = summary.failed,
        skipped = summary.skipped.len(),
        stopped = summary.stopped,
        "scheduler loop finished"
    );

    Ok(summary)
}

/// Lock the store, recovering from a poisoned mutex (the store itself stays
/// consistent because every mutation persists before returning).
fn lock(store: &Mutex<StateStore>) -> MutexGuard<'_, StateStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
