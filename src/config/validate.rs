// src/config/validate.rs

use std::collections::HashSet;

use regex::RegexBuilder;

use crate::config::model::RawManifest;
use crate::errors::{Result, RunqueueError};

/// Semantic validation of a raw manifest.
///
/// TOML shape errors are caught by serde before this runs; here we check the
/// things serde can't express: non-empty commands, unique explicit names,
/// sane settings, and compilable classifier signatures.
pub fn validate(raw: &RawManifest) -> Result<()> {
    validate_settings(raw)?;
    validate_tasks(raw)?;
    validate_signatures(raw)?;
    Ok(())
}

fn validate_settings(raw: &RawManifest) -> Result<()> {
    if raw.settings.timeout_seconds == 0 {
        return Err(RunqueueError::ConfigError(
            "[settings].timeout_seconds must be >= 1 (got 0)".to_string(),
        ));
    }

    if raw.settings.retry_ceiling == 0 {
        return Err(RunqueueError::ConfigError(
            "[settings].retry_ceiling must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_tasks(raw: &RawManifest) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();

    for (idx, entry) in raw.tasks.iter().enumerate() {
        if entry.cmd.trim().is_empty() {
            return Err(RunqueueError::ConfigError(format!(
                "[[task]] entry {} has an empty `cmd`",
                idx + 1
            )));
        }

        if let Some(name) = entry.name.as_deref() {
            if name.trim().is_empty() {
                return Err(RunqueueError::ConfigError(format!(
                    "[[task]] entry {} has an empty `name`",
                    idx + 1
                )));
            }
            if !seen.insert(name) {
                return Err(RunqueueError::ConfigError(format!(
                    "duplicate task name '{}'",
                    name
                )));
            }
        }
    }

    Ok(())
}

fn validate_signatures(raw: &RawManifest) -> Result<()> {
    for pattern in raw.classifier.signatures.iter() {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| {
                RunqueueError::ConfigError(format!(
                    "invalid classifier signature '{}': {}",
                    pattern, err
                ))
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Manifest, TaskEntry};

    fn entry(name: Option<&str>, cmd: &str) -> TaskEntry {
        TaskEntry {
            name: name.map(|s| s.to_string()),
            cmd: cmd.to_string(),
            dir: None,
        }
    }

    #[test]
    fn accepts_minimal_manifest() {
        let raw = RawManifest {
            tasks: vec![entry(None, "echo hi")],
            ..Default::default()
        };
        assert!(Manifest::try_from(raw).is_ok());
    }

    #[test]
    fn rejects_empty_cmd() {
        let raw = RawManifest {
            tasks: vec![entry(Some("a"), "   ")],
            ..Default::default()
        };
        assert!(matches!(
            Manifest::try_from(raw),
            Err(RunqueueError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let raw = RawManifest {
            tasks: vec![entry(Some("a"), "echo 1"), entry(Some("a"), "echo 2")],
            ..Default::default()
        };
        assert!(matches!(
            Manifest::try_from(raw),
            Err(RunqueueError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_zero_retry_ceiling() {
        let mut raw = RawManifest {
            tasks: vec![entry(None, "echo hi")],
            ..Default::default()
        };
        raw.settings.retry_ceiling = 0;
        assert!(matches!(
            Manifest::try_from(raw),
            Err(RunqueueError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_bad_signature_regex() {
        let mut raw = RawManifest {
            tasks: vec![entry(None, "echo hi")],
            ..Default::default()
        };
        raw.classifier.signatures.push("(unclosed".to_string());
        assert!(matches!(
            Manifest::try_from(raw),
            Err(RunqueueError::ConfigError(_))
        ));
    }
}
