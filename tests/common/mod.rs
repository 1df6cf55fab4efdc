#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use runqueue::catalog::Catalog;
use runqueue::classify::Classifier;
use runqueue::config::Manifest;
use runqueue::engine::{Engine, RunConfig};

pub use runqueue_test_utils::{builders::ManifestBuilder, init_tracing, with_timeout};

/// Build an engine over `manifest`, running tasks relative to `root` and
/// persisting state under `workspace`. A short grace keeps the escalating
/// termination tests fast.
pub fn engine(manifest: &Manifest, root: &Path, workspace: &Path) -> Engine {
    let catalog = Catalog::from_manifest(manifest, root);
    let classifier =
        Classifier::new(&manifest.classifier.signatures).expect("valid test signatures");
    let config = RunConfig {
        timeout: Duration::from_secs(manifest.settings.timeout_seconds),
        retry_ceiling: manifest.settings.retry_ceiling,
        workspace: workspace.to_path_buf(),
    };

    Engine::new(catalog, classifier, config)
        .expect("engine construction")
        .with_grace(Duration::from_millis(200))
}

/// Run an engine to completion and return its summary.
pub async fn run_to_end(mut engine: Engine) -> runqueue::engine::RunSummary {
    engine.start().expect("engine start");
    with_timeout(engine.wait()).await.expect("engine run")
}
