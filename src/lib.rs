// src/lib.rs

pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod state;
pub mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::catalog::Catalog;
use crate::classify::Classifier;
use crate::cli::CliArgs;
use crate::config::model::Manifest;
use crate::engine::{scheduler, Engine, RunConfig, RunSummary, StatusSnapshot};
use crate::state::StateStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading and catalog enumeration
/// - the execution engine (state store, supervisor, classifier)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let manifest_path = PathBuf::from(&args.manifest);
    let manifest = Catalog::load_manifest(&manifest_path)?;
    let root = manifest_root(&manifest_path);
    let catalog = Catalog::from_manifest(&manifest, &root);

    if args.dry_run {
        print_dry_run(&catalog, &manifest);
        return Ok(());
    }

    let workspace = args
        .workspace
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.clone());

    let config = RunConfig {
        timeout: Duration::from_secs(
            args.timeout.unwrap_or(manifest.settings.timeout_seconds),
        ),
        retry_ceiling: args.retries.unwrap_or(manifest.settings.retry_ceiling),
        workspace,
    };

    if args.status {
        // Read-only: report the persisted state without reconciling it.
        let store = StateStore::load(&config.workspace)?;
        let state = store.state();
        print_status(&StatusSnapshot {
            pending: scheduler::pending_ids(catalog.enumerate(), state, config.retry_ceiling),
            in_flight: state.current.clone(),
            completed: state.completed.len(),
            failed: state.failed.len(),
            last_codes: state.failed.clone(),
        });
        return Ok(());
    }

    let classifier = Classifier::new(&manifest.classifier.signatures)?;
    let mut engine = Engine::new(catalog, classifier, config)?;

    // Ctrl-C → graceful stop: the in-flight task is reclaimed and its state
    // persisted before the loop exits.
    {
        let stop = engine.stop_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; stopping after the current task");
            stop.stop();
        });
    }

    engine.start()?;
    let summary = engine.wait().await?;
    print_summary(&summary);

    Ok(())
}

/// Directory task `dir` entries resolve against: the manifest's own
/// directory, falling back to the current working directory for a bare
/// filename like "Runqueue.toml".
fn manifest_root(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print the enumerated queue.
fn print_dry_run(catalog: &Catalog, manifest: &Manifest) {
    println!("runqueue dry-run");
    println!(
        "  settings.timeout_seconds = {}",
        manifest.settings.timeout_seconds
    );
    println!(
        "  settings.retry_ceiling = {}",
        manifest.settings.retry_ceiling
    );
    println!();

    println!("tasks ({}):", catalog.len());
    for task in catalog.enumerate() {
        println!("  - {}", task.id);
        println!("      cmd: {}", task.cmd);
        println!("      dir: {}", task.dir.display());
    }
}

fn print_status(status: &StatusSnapshot) {
    println!("runqueue status");
    println!("  completed: {}", status.completed);
    println!("  failed:    {}", status.failed);
    match &status.in_flight {
        Some(id) => println!("  in flight: {id}"),
        None => println!("  in flight: none"),
    }
    println!("  pending ({}):", status.pending.len());
    for id in &status.pending {
        println!("    - {id}");
    }
    if !status.last_codes.is_empty() {
        println!("  last failure codes:");
        for (id, code) in &status.last_codes {
            println!("    - {id}: {code}");
        }
    }
}

fn print_summary(summary: &RunSummary) {
    if summary.stopped {
        println!("run stopped on request");
    } else {
        println!("run finished");
    }
    println!("  completed: {}", summary.completed);
    println!("  failed:    {}", summary.failed);
    if !summary.skipped.is_empty() {
        println!("  skipped (retry ceiling reached):");
        for id in &summary.skipped {
            println!("    - {id}");
        }
    }
}
