//! Extension management for tykctl
//!
//! This crate handles:
//! - The persisted installed-extension registry (extensions.yaml)
//! - The GitHub release source boundary
//! - Lifecycle orchestration with before/after hook dispatch

pub mod lifecycle;
pub mod registry;
pub mod source;

pub use lifecycle::{ExtensionLifecycle, Orphan};
pub use registry::InstalledRegistry;
pub use source::{ExtensionSource, GithubSource, ResolvedExtension};
