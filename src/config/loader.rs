// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;

/// Load a manifest from a given path and return the raw `RawManifest`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (unique names, sane settings, etc.). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let manifest: RawManifest = toml::from_str(&contents)?;

    Ok(manifest)
}

/// Load a manifest from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for empty commands, duplicate names, zero timeouts/ceilings and
///   malformed classifier signatures.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    let manifest = Manifest::try_from(raw)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_manifest_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[task]]
cmd = "echo hi"

[[task]]
name = "second"
cmd = "echo bye"
dir = "sub"
"#
        )
        .unwrap();

        let manifest = load_and_validate(file.path()).unwrap();
        assert_eq!(manifest.settings.timeout_seconds, 300);
        assert_eq!(manifest.settings.retry_ceiling, 3);
        assert_eq!(manifest.tasks.len(), 2);
        assert_eq!(manifest.tasks[1].name.as_deref(), Some("second"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_and_validate("/definitely/not/here.toml").is_err());
    }
}
