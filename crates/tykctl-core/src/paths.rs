//! Filesystem layout conventions
//!
//! Extension binaries live under the XDG data directory
//! (`<data>/tykctl/extensions/tykctl-<name>/`); per-extension configuration,
//! the extensions registry file, and the hooks directory live under the XDG
//! config directory. All of these are overridable through [`crate::config::ExecutionConfig`]
//! so tests never touch the real home directory.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Name of the persisted extensions registry file
pub const EXTENSIONS_FILE: &str = "extensions.yaml";

/// Resolve project directories for tykctl
fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "tykctl").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine home directory",
        ))
    })
}

/// Base data directory for installed extensions (`<data>/tykctl/extensions`)
pub fn extensions_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("extensions"))
}

/// Directory holding one installed extension's binary
/// (`<data>/tykctl/extensions/tykctl-<name>/`)
pub fn extension_install_dir(name: &str) -> Result<PathBuf> {
    Ok(extensions_data_dir()?.join(format!("tykctl-{name}")))
}

/// Per-extension configuration directory (`<config>/tykctl/<extension>`)
pub fn extension_config_dir(extension: &str) -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(extension))
}

/// Global configuration directory (`<config>/tykctl`)
pub fn global_config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Hooks directory (`<config>/tykctl/hooks`)
///
/// One directory serves every lifecycle operation; hook scripts learn which
/// extension fired them from the `TYKCTL_HOOK_EXTENSION` environment block.
pub fn hooks_dir() -> Result<PathBuf> {
    Ok(global_config_dir()?.join("hooks"))
}
