//! External executable hooks
//!
//! A hook directory holds standalone scripts invoked as subprocesses when
//! their event fires, in the manner of version-control hooks. A file matches
//! an event when its name equals the event tag, or starts with `<tag>-` so
//! several hooks can attach to one event; matching files run sorted by name.
//! Disabling keeps the file and drops a `<name>.disabled` sidecar marker next
//! to it, which also works on filesystems without a mode-bit notion.

use crate::event::{HookData, HookEvent};
use std::path::{Path, PathBuf};
use tracing::debug;
use tykctl_core::{Error, Result};
use tykctl_plugins::Platform;

/// Suffix of the sidecar marker gating a hook off
const DISABLED_SUFFIX: &str = ".disabled";

/// A file-backed executable hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalHook {
    /// File name (equals the event tag, optionally with a `-suffix`)
    pub name: String,

    /// Absolute path of the hook script
    pub path: PathBuf,

    /// False when a `.disabled` sidecar marker is present
    pub enabled: bool,
}

impl ExternalHook {
    /// Whether this hook fires for the given event
    pub fn matches(&self, event: &HookEvent) -> bool {
        self.name == event.tag() || self.name.starts_with(&format!("{}-", event.tag()))
    }

    /// Run the hook as a subprocess with the hook environment block
    ///
    /// Stdout and stderr are forwarded to the parent; a non-zero exit is a
    /// [`Error::HookFailed`], identical to a builtin hook error.
    pub async fn run(&self, event: &HookEvent, data: &HookData) -> Result<()> {
        let working_dir = std::env::current_dir()?;
        let mut cmd = Platform::current().shell_invocation(&self.path);
        cmd.env("TYKCTL_HOOK_EVENT", event.tag());
        cmd.env("TYKCTL_HOOK_EXTENSION", &data.extension_name);
        cmd.env("TYKCTL_HOOK_PATH", &data.extension_path);
        cmd.env("TYKCTL_HOOK_WORKING_DIR", &working_dir);

        debug!("Running external hook {:?} for event {}", self.path, event);
        let status = cmd.status().await.map_err(|e| Error::SpawnFailed {
            program: self.path.display().to_string(),
            source: e,
        })?;

        if !status.success() {
            return Err(Error::hook_failed(
                event.tag(),
                format!(
                    "external hook {:?} exited with {}",
                    self.path,
                    status.code().unwrap_or(-1)
                ),
            ));
        }
        Ok(())
    }
}

/// List every hook in a directory, sorted by file name
///
/// A missing directory is an empty hook set, not an error.
pub fn list_hooks(hook_dir: &Path) -> Result<Vec<ExternalHook>> {
    let mut hooks = Vec::new();
    let entries = match std::fs::read_dir(hook_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(hooks),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(DISABLED_SUFFIX) {
            continue;
        }
        let enabled = !disabled_marker(&path).exists();
        hooks.push(ExternalHook {
            name: name.to_string(),
            path: path.clone(),
            enabled,
        });
    }

    hooks.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(hooks)
}

/// Enabled hooks matching one event, sorted by file name
pub fn hooks_for_event(hook_dir: &Path, event: &HookEvent) -> Result<Vec<ExternalHook>> {
    Ok(list_hooks(hook_dir)?
        .into_iter()
        .filter(|h| h.enabled && h.matches(event))
        .collect())
}

/// Write an executable hook script into the hook directory
pub fn create_hook(hook_dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name.ends_with(DISABLED_SUFFIX) {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    std::fs::create_dir_all(hook_dir)?;
    let path = hook_dir.join(name);
    if path.exists() {
        return Err(Error::already_exists(path));
    }
    std::fs::write(&path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}

/// Re-enable a hook by removing its sidecar marker
pub fn enable_hook(hook_dir: &Path, name: &str) -> Result<()> {
    let path = existing_hook_path(hook_dir, name)?;
    let marker = disabled_marker(&path);
    if marker.exists() {
        std::fs::remove_file(marker)?;
    }
    Ok(())
}

/// Gate a hook off without deleting the file
pub fn disable_hook(hook_dir: &Path, name: &str) -> Result<()> {
    let path = existing_hook_path(hook_dir, name)?;
    std::fs::write(disabled_marker(&path), b"")?;
    Ok(())
}

/// Delete a hook file (and its marker, if any)
pub fn delete_hook(hook_dir: &Path, name: &str) -> Result<()> {
    let path = existing_hook_path(hook_dir, name)?;
    std::fs::remove_file(&path)?;
    let marker = disabled_marker(&path);
    if marker.exists() {
        std::fs::remove_file(marker)?;
    }
    Ok(())
}

fn existing_hook_path(hook_dir: &Path, name: &str) -> Result<PathBuf> {
    let path = hook_dir.join(name);
    if !path.is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("hook not found: {name}"),
        )));
    }
    Ok(path)
}

fn disabled_marker(hook_path: &Path) -> PathBuf {
    let mut name = hook_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(DISABLED_SUFFIX);
    hook_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_list_and_toggle() {
        let dir = TempDir::new().unwrap();
        create_hook(dir.path(), "before-install", "#!/bin/sh\nexit 0\n").unwrap();
        create_hook(dir.path(), "after-install", "#!/bin/sh\nexit 0\n").unwrap();

        let hooks = list_hooks(dir.path()).unwrap();
        assert_eq!(hooks.len(), 2);
        // Sorted by name
        assert_eq!(hooks[0].name, "after-install");
        assert!(hooks.iter().all(|h| h.enabled));

        disable_hook(dir.path(), "before-install").unwrap();
        let hooks = list_hooks(dir.path()).unwrap();
        let before = hooks.iter().find(|h| h.name == "before-install").unwrap();
        assert!(!before.enabled);
        // The file itself is preserved
        assert!(dir.path().join("before-install").exists());

        enable_hook(dir.path(), "before-install").unwrap();
        let hooks = list_hooks(dir.path()).unwrap();
        assert!(hooks.iter().all(|h| h.enabled));
    }

    #[test]
    fn test_delete_removes_file_and_marker() {
        let dir = TempDir::new().unwrap();
        create_hook(dir.path(), "before-run", "exit 0").unwrap();
        disable_hook(dir.path(), "before-run").unwrap();

        delete_hook(dir.path(), "before-run").unwrap();
        assert!(!dir.path().join("before-run").exists());
        assert!(!dir.path().join("before-run.disabled").exists());
    }

    #[test]
    fn test_event_matching_with_priority_suffix() {
        let event = HookEvent::new(HookEvent::BEFORE_INSTALL);
        let exact = ExternalHook {
            name: "before-install".into(),
            path: PathBuf::from("/hooks/before-install"),
            enabled: true,
        };
        let suffixed = ExternalHook {
            name: "before-install-01-lint".into(),
            path: PathBuf::from("/hooks/before-install-01-lint"),
            enabled: true,
        };
        let other = ExternalHook {
            name: "before-uninstall".into(),
            path: PathBuf::from("/hooks/before-uninstall"),
            enabled: true,
        };
        assert!(exact.matches(&event));
        assert!(suffixed.matches(&event));
        assert!(!other.matches(&event));
    }

    #[test]
    fn test_hooks_for_event_excludes_disabled() {
        let dir = TempDir::new().unwrap();
        create_hook(dir.path(), "before-install", "exit 0").unwrap();
        create_hook(dir.path(), "before-install-extra", "exit 0").unwrap();
        disable_hook(dir.path(), "before-install-extra").unwrap();

        let event = HookEvent::new(HookEvent::BEFORE_INSTALL);
        let hooks = hooks_for_event(dir.path(), &event).unwrap();
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].name, "before-install");
    }

    #[test]
    fn test_missing_hook_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let hooks = list_hooks(&dir.path().join("nope")).unwrap();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let dir = TempDir::new().unwrap();
        assert!(create_hook(dir.path(), "", "x").is_err());
        assert!(create_hook(dir.path(), "a/b", "x").is_err());
        assert!(create_hook(dir.path(), "x.disabled", "x").is_err());
    }
}
