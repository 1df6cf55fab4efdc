#![allow(dead_code)]

use runqueue::config::{ClassifierSection, Manifest, RawManifest, SettingsSection, TaskEntry};

/// Builder for `Manifest` to simplify test setup.
pub struct ManifestBuilder {
    raw: RawManifest,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawManifest {
                settings: SettingsSection::default(),
                classifier: ClassifierSection::default(),
                tasks: Vec::new(),
            },
        }
    }

    /// Add an unnamed task (id will be derived from position + content).
    pub fn task(mut self, cmd: &str) -> Self {
        self.raw.tasks.push(TaskEntry {
            name: None,
            cmd: cmd.to_string(),
            dir: None,
        });
        self
    }

    /// Add a named task, so tests can assert on a readable id.
    pub fn named_task(mut self, name: &str, cmd: &str) -> Self {
        self.raw.tasks.push(TaskEntry {
            name: Some(name.to_string()),
            cmd: cmd.to_string(),
            dir: None,
        });
        self
    }

    pub fn named_task_in_dir(mut self, name: &str, cmd: &str, dir: &str) -> Self {
        self.raw.tasks.push(TaskEntry {
            name: Some(name.to_string()),
            cmd: cmd.to_string(),
            dir: Some(dir.into()),
        });
        self
    }

    pub fn signature(mut self, pattern: &str) -> Self {
        self.raw.classifier.signatures.push(pattern.to_string());
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.raw.settings.timeout_seconds = secs;
        self
    }

    pub fn retry_ceiling(mut self, ceiling: u32) -> Self {
        self.raw.settings.retry_ceiling = ceiling;
        self
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.raw).expect("Failed to build valid manifest from builder")
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
