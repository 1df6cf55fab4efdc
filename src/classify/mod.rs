// src/classify/mod.rs

//! Outcome classification for finished task processes.
//!
//! A child's exit status is not trustworthy on its own: the tools we drive
//! can report a fatal upstream condition (rate limit, expired credentials,
//! overloaded service) through their normal output and still exit 0. The
//! classifier scans the captured output against an ordered signature list
//! and demotes such apparent successes to a synthetic service-failure code.
//! It never promotes a genuine failure: non-zero codes pass through verbatim.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::errors::{Result, RunqueueError};
use crate::exec::RunResult;
use crate::types::{EXIT_SERVICE_FAILURE, EXIT_SUCCESS};

/// Built-in in-band failure signatures, in match priority order.
///
/// Tuned against the upstream tooling's observed failure modes; the list is
/// not assumed exhaustive, and the manifest can append to it.
pub const DEFAULT_SIGNATURES: &[&str] = &[
    "error:",
    "stream error",
    "error sending request",
    "deadline exceeded",
    "connection reset",
    "broken pipe",
    "service unavailable",
    "bad gateway",
    "too many requests",
    "rate limit",
    "invalid api key",
    "unauthenticated",
    "unauthorized",
];

/// One compiled signature.
#[derive(Debug, Clone)]
struct Signature {
    label: String,
    pattern: Regex,
}

/// Final verdict for one task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// The recorded exit code; [`EXIT_SUCCESS`] means the task completed.
    pub code: i32,
    /// The signature that triggered an override, if any.
    pub reason: Option<String>,
}

/// Scans captured output for known in-band failure signatures.
#[derive(Debug, Clone)]
pub struct Classifier {
    signatures: Vec<Signature>,
}

impl Classifier {
    /// Build a classifier from the default signature list plus any extra
    /// patterns from the manifest (appended after the defaults, so built-in
    /// signatures win ties).
    pub fn new(extra: &[String]) -> Result<Self> {
        let mut signatures = Vec::with_capacity(DEFAULT_SIGNATURES.len() + extra.len());

        for pattern in DEFAULT_SIGNATURES
            .iter()
            .map(|s| s.to_string())
            .chain(extra.iter().cloned())
        {
            let compiled = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|err| {
                    RunqueueError::ConfigError(format!(
                        "invalid classifier signature '{}': {}",
                        pattern, err
                    ))
                })?;
            signatures.push(Signature {
                label: pattern,
                pattern: compiled,
            });
        }

        Ok(Self { signatures })
    }

    /// Classify one run result.
    ///
    /// Non-zero exit codes pass through unchanged. For an exit code of 0 the
    /// captured stdout and stderr lines are scanned in order against the
    /// signature list; the first matching signature overrides the code to
    /// [`EXIT_SERVICE_FAILURE`].
    pub fn classify(&self, result: &RunResult) -> Verdict {
        if result.exit_code != EXIT_SUCCESS {
            return Verdict {
                code: result.exit_code,
                reason: None,
            };
        }

        for sig in &self.signatures {
            let hit = result
                .stdout
                .iter()
                .chain(result.stderr.iter())
                .any(|line| sig.pattern.is_match(line));

            if hit {
                debug!(signature = %sig.label, "in-band failure signature matched");
                return Verdict {
                    code: EXIT_SERVICE_FAILURE,
                    reason: Some(sig.label.clone()),
                };
            }
        }

        Verdict {
            code: EXIT_SUCCESS,
            reason: None,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        // The built-in list always compiles.
        Self::new(&[]).expect("built-in signatures are valid regexes")
    }
}
