//! # tykctl-core
//!
//! Core library for the tykctl CLI providing:
//! - The subsystem error taxonomy
//! - Execution configuration resolved once from the environment
//! - Type definitions for plugins and installed extensions
//! - Filesystem layout conventions (XDG data/config directories)

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::ExecutionConfig;
pub use error::{Error, Result};
pub use types::{ExecutionOutcome, ExtensionsFile, InstalledExtension, Plugin};
