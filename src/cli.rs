// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runqueue`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runqueue",
    version,
    about = "Run a queue of external task processes with resumable, durable state.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task manifest (TOML).
    ///
    /// Default: `Runqueue.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Runqueue.toml")]
    pub manifest: String,

    /// Workspace directory for persisted state and task logs.
    ///
    /// Default: the directory containing the manifest.
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<String>,

    /// Per-task wall-clock timeout in seconds (overrides the manifest).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum attempts per task before it is permanently skipped
    /// (overrides the manifest).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Print a snapshot of the persisted run state and exit.
    #[arg(long)]
    pub status: bool,

    /// Parse + validate, print the enumerated tasks, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNQUEUE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
