// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::validate;
use crate::errors::RunqueueError;

/// Top-level manifest as read from a TOML file, before validation.
///
/// All sections are optional and have reasonable defaults; only `[[task]]`
/// entries carry required fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawManifest {
    /// Run-wide settings from `[settings]`.
    #[serde(default)]
    pub settings: SettingsSection,

    /// Extra failure signatures from `[classifier]`.
    #[serde(default)]
    pub classifier: ClassifierSection,

    /// Ordered task queue from `[[task]]` entries.
    ///
    /// Order in the file is the execution order; it also feeds derived
    /// task ids, so reordering the manifest changes unnamed ids.
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskEntry>,
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Per-task wall-clock limit in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum attempts per task before it is permanently skipped.
    #[serde(default = "default_retry_ceiling")]
    pub retry_ceiling: u32,
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_retry_ceiling() -> u32 {
    3
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            retry_ceiling: default_retry_ceiling(),
        }
    }
}

/// `[classifier]` section.
///
/// Signatures listed here are appended after the built-in list; each entry is
/// a case-insensitive regex matched against captured output lines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierSection {
    #[serde(default)]
    pub signatures: Vec<String>,
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskEntry {
    /// Optional stable name. When absent, an id is derived from the entry's
    /// position and content, so the same manifest always yields the same id.
    #[serde(default)]
    pub name: Option<String>,

    /// The command to execute (run through the platform shell).
    pub cmd: String,

    /// Working directory for the command, relative to the manifest directory
    /// unless absolute. Defaults to the manifest directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Validated manifest, produced from [`RawManifest`] via `TryFrom`.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub settings: SettingsSection,
    pub classifier: ClassifierSection,
    pub tasks: Vec<TaskEntry>,
}

impl TryFrom<RawManifest> for Manifest {
    type Error = RunqueueError;

    fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
        validate::validate(&raw)?;
        Ok(Self {
            settings: raw.settings,
            classifier: raw.classifier,
            tasks: raw.tasks,
        })
    }
}
