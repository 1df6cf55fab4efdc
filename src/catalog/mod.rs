// src/catalog/mod.rs

//! Task catalog: the ordered, immutable set of tasks for a run.
//!
//! The catalog is derived from the manifest once and then re-consulted by the
//! scheduler loop on every iteration (via [`Catalog::enumerate`]); it never
//! changes during a run. Enumeration is deterministic: the same manifest
//! always yields the same ids in the same order, which is what makes the
//! persisted execution state resumable across restarts.

use std::path::{Path, PathBuf};

use crate::config::loader::load_and_validate;
use crate::config::model::Manifest;
use crate::errors::{Result, RunqueueError};
use crate::types::TaskId;

/// One unit of queued work: a stable id plus an opaque shell command and the
/// directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub cmd: String,
    pub dir: PathBuf,
}

/// Ordered task catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    tasks: Vec<Task>,
}

impl Catalog {
    /// Read and validate the manifest backing a catalog.
    ///
    /// An unreadable source is reported as `CatalogUnavailable` and is fatal
    /// to the run; semantic manifest problems keep their `ConfigError` shape.
    pub fn load_manifest(path: &Path) -> Result<Manifest> {
        match load_and_validate(path) {
            Ok(manifest) => Ok(manifest),
            Err(err @ (RunqueueError::IoError(_) | RunqueueError::TomlError(_))) => Err(
                RunqueueError::CatalogUnavailable(format!("{}: {}", path.display(), err)),
            ),
            Err(err) => Err(err),
        }
    }

    /// Build the catalog from a validated manifest.
    ///
    /// `root` is the directory task `dir` entries are resolved against
    /// (normally the manifest's directory).
    pub fn from_manifest(manifest: &Manifest, root: &Path) -> Self {
        let tasks = manifest
            .tasks
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let dir = match &entry.dir {
                    Some(d) if d.is_absolute() => d.clone(),
                    Some(d) => root.join(d),
                    None => root.to_path_buf(),
                };
                let id = entry
                    .name
                    .clone()
                    .unwrap_or_else(|| derive_id(idx, &entry.cmd, &dir));
                Task {
                    id,
                    cmd: entry.cmd.clone(),
                    dir,
                }
            })
            .collect();

        Self { tasks }
    }

    /// The ordered task sequence. Idempotent; manifest order.
    pub fn enumerate(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Derive a stable id for an unnamed task: ordinal plus a short content hash,
/// e.g. `003-9f2ab1c`.
fn derive_id(index: usize, cmd: &str, dir: &Path) -> TaskId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(cmd.as_bytes());
    hasher.update(dir.as_os_str().as_encoded_bytes());
    let hex = hasher.finalize().to_hex();
    format!("{:03}-{}", index + 1, &hex.as_str()[..7])
}
