//! Error types for tykctl-core

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using tykctl-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the extension lifecycle subsystem
#[derive(Error, Debug)]
pub enum Error {
    /// No executable matched the naming convention in any discovery path
    #[error("plugin '{name}' not found for extension '{extension}'. Run 'tykctl plugin list' to see available plugins")]
    PluginNotFound { name: String, extension: String },

    /// Extension is not recorded in the installed registry
    #[error("extension '{name}' is not installed. Run 'tykctl extension list' to see installed extensions")]
    NotInstalled { name: String },

    /// Child process could not be spawned
    #[error("failed to execute '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Child process exceeded the configured deadline
    #[error("'{program}' timed out after {timeout:?}")]
    ExecutionTimeout { program: String, timeout: Duration },

    /// Child process ran and exited non-zero while output was captured
    #[error("'{program}' exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    /// A hook returned an error or an external hook exited non-zero
    #[error("{event} hook failed: {message}")]
    HookFailed { event: String, message: String },

    /// Install target path already exists
    #[error("target already exists: {}. Use --force to overwrite", path.display())]
    AlreadyExists { path: PathBuf },

    /// Name violates the tykctl naming convention
    #[error("invalid name: '{name}'")]
    InvalidName { name: String },

    /// Plugin bundle directory contains no executables
    #[error("no executables found in {}", path.display())]
    NoExecutables { path: PathBuf },

    /// Timeout value could not be parsed as a duration
    #[error("invalid timeout value: '{value}' (expected e.g. 300ms, 30s, 5m, 1h)")]
    InvalidTimeout { value: String },

    /// Release could not be resolved or downloaded
    #[error("source error: {0}")]
    Source(String),

    /// Registry file could not be parsed
    #[error("extensions registry is corrupt: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a plugin not found error
    pub fn plugin_not_found(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::PluginNotFound {
            name: name.into(),
            extension: extension.into(),
        }
    }

    /// Create a not installed error
    pub fn not_installed(name: impl Into<String>) -> Self {
        Self::NotInstalled { name: name.into() }
    }

    /// Create a hook failed error
    pub fn hook_failed(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            event: event.into(),
            message: message.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Create an invalid timeout error
    pub fn invalid_timeout(value: impl Into<String>) -> Self {
        Self::InvalidTimeout {
            value: value.into(),
        }
    }
}
