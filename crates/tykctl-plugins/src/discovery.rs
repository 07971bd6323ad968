//! Plugin discovery across ordered search paths

use crate::naming;
use crate::platform::Platform;
use std::path::Path;
use tracing::debug;
use tykctl_core::Plugin;

/// Discover plugins for an extension across the given directories
///
/// Directories are scanned independently in path order and the results
/// concatenated; duplicate plugin names across directories are not
/// deduplicated, so callers see every match. Missing or unreadable
/// directories are skipped silently.
pub fn discover_plugins(paths: &[impl AsRef<Path>], extension: &str) -> Vec<Plugin> {
    let platform = Platform::current();
    let mut plugins = Vec::new();
    for path in paths {
        scan_directory(path.as_ref(), extension, platform, &mut plugins);
    }
    plugins
}

fn scan_directory(dir: &Path, extension: &str, platform: Platform, out: &mut Vec<Plugin>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping discovery path {:?}: {}", dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !platform.is_executable(&path, &metadata) {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // Windows executables carry a suffix that is not part of the name
        let stem = match platform {
            Platform::Windows => file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(file_name),
            Platform::Posix => file_name,
        };

        if let Some(name) = naming::plugin_name_from_file(stem, extension) {
            out.push(Plugin {
                name: name.to_string(),
                path: path.clone(),
                extension: extension.to_string(),
            });
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_discover_filters_by_prefix_and_exec_bit() {
        let dir = TempDir::new().unwrap();
        write_executable(dir.path(), "tykctl-widgets-deploy");
        write_executable(dir.path(), "tykctl-other-tool");
        // Matching name but not executable
        fs::write(dir.path().join("tykctl-widgets-docs"), "").unwrap();

        let plugins = discover_plugins(&[dir.path()], "widgets");
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "deploy");
        assert_eq!(plugins[0].extension, "widgets");
    }

    #[test]
    fn test_discover_concatenates_in_path_order_without_dedup() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_executable(first.path(), "tykctl-widgets-deploy");
        write_executable(second.path(), "tykctl-widgets-deploy");
        write_executable(second.path(), "tykctl-widgets-sync");

        let plugins = discover_plugins(&[first.path(), second.path()], "widgets");
        let names: Vec<_> = plugins.iter().map(|p| p.name.as_str()).collect();
        // First path's match comes first; the duplicate is kept
        assert_eq!(names.iter().filter(|n| **n == "deploy").count(), 2);
        assert_eq!(plugins[0].path.parent().unwrap(), first.path());
        assert!(names.contains(&"sync"));
    }

    #[test]
    fn test_discover_skips_missing_directories() {
        let dir = TempDir::new().unwrap();
        write_executable(dir.path(), "tykctl-widgets-deploy");
        let missing = dir.path().join("does-not-exist");

        let plugins = discover_plugins(&[missing.as_path(), dir.path()], "widgets");
        assert_eq!(plugins.len(), 1);
    }
}
