// src/config/mod.rs

//! Manifest loading and validation.
//!
//! The manifest is a TOML file describing the ordered task queue plus a few
//! run-wide settings:
//!
//! ```toml
//! [settings]
//! timeout_seconds = 300
//! retry_ceiling = 3
//!
//! [classifier]
//! signatures = ["quota exceeded"]
//!
//! [[task]]
//! name = "intro"
//! cmd = "make intro"
//! dir = "chapters/intro"
//! ```

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ClassifierSection, Manifest, RawManifest, SettingsSection, TaskEntry};
