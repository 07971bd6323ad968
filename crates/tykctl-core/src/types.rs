//! Type definitions for plugins and installed extensions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A discovered plugin executable
///
/// Ephemeral: recomputed on every discovery call, never persisted. The name
/// is the file name with the `tykctl-<extension>-` prefix stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    /// Plugin name (file name without the naming-convention prefix)
    pub name: String,

    /// Absolute path to the executable
    pub path: PathBuf,

    /// Extension this plugin belongs to
    pub extension: String,
}

/// Persisted record of an installed extension
///
/// Created on install, overwritten on re-install, deleted on removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledExtension {
    /// Installed version (release tag without the leading 'v')
    pub version: String,

    /// Source repository URL
    pub repository: String,

    /// Installation timestamp (UTC)
    pub installed_at: DateTime<Utc>,

    /// Path to the installed binary
    pub path: PathBuf,
}

/// On-disk shape of extensions.yaml: one map keyed by extension name
///
/// BTreeMap keeps serialized output stable across writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionsFile {
    #[serde(default)]
    pub extensions: BTreeMap<String, InstalledExtension>,
}

/// Result of running a plugin or extension process
///
/// The engine reports the child's exit code instead of terminating the host
/// process; the CLI entry point decides whether to exit with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Child exit code (0 on success)
    pub exit_code: i32,

    /// Captured stdout when capture mode was requested
    pub stdout: Option<String>,
}

impl ExecutionOutcome {
    /// Outcome for a successful, uncaptured run
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            stdout: None,
        }
    }

    /// Whether the child exited zero
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_file_yaml_round_trip() {
        let mut file = ExtensionsFile::default();
        file.extensions.insert(
            "widgets".to_string(),
            InstalledExtension {
                version: "1.0.0".to_string(),
                repository: "https://github.com/acme/widgets".to_string(),
                installed_at: Utc::now(),
                path: PathBuf::from("/data/tykctl/extensions/tykctl-widgets/tykctl-widgets"),
            },
        );

        let yaml = serde_yaml_ng::to_string(&file).unwrap();
        assert!(yaml.contains("widgets:"));
        assert!(yaml.contains("version: 1.0.0"));

        let parsed: ExtensionsFile = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed.extensions.len(), 1);
        assert_eq!(parsed.extensions["widgets"].version, "1.0.0");
    }

    #[test]
    fn test_extensions_file_empty_map_default() {
        let parsed: ExtensionsFile = serde_yaml_ng::from_str("{}").unwrap();
        assert!(parsed.extensions.is_empty());
    }

    #[test]
    fn test_execution_outcome_success() {
        let outcome = ExecutionOutcome::success();
        assert!(outcome.is_success());
        assert!(outcome.stdout.is_none());

        let failed = ExecutionOutcome {
            exit_code: 3,
            stdout: None,
        };
        assert!(!failed.is_success());
    }
}
