//! OS-appropriate subprocess invocations and script syntax
//!
//! POSIX targets get shell scripts run through `sh` and detect executables by
//! mode bits; Windows targets get batch files run through `cmd /C` and detect
//! executables by file suffix.

use std::path::Path;
use tokio::process::Command;

/// Target platform for generated scripts and executable checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// Platform the host is running on
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// File name for a generated script with the given stem
    pub fn script_file_name(&self, stem: &str) -> String {
        match self {
            Platform::Posix => stem.to_string(),
            Platform::Windows => format!("{stem}.bat"),
        }
    }

    /// Whether a directory entry counts as an executable on this platform
    pub fn is_executable(&self, path: &Path, metadata: &std::fs::Metadata) -> bool {
        if !metadata.is_file() {
            return false;
        }
        match self {
            Platform::Posix => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    metadata.permissions().mode() & 0o111 != 0
                }
                #[cfg(not(unix))]
                {
                    let _ = path;
                    false
                }
            }
            Platform::Windows => matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("exe") | Some("bat") | Some("cmd")
            ),
        }
    }

    /// Command that runs a script file on this platform
    pub fn shell_invocation(&self, script: &Path) -> Command {
        match self {
            Platform::Posix => {
                let mut cmd = Command::new("sh");
                cmd.arg(script);
                cmd
            }
            Platform::Windows => {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C").arg(script);
                cmd
            }
        }
    }
}
