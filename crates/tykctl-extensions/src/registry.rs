//! Installed-extension registry
//!
//! One YAML file per config directory, `extensions.yaml`, mapping extension
//! name to its [`InstalledExtension`] record. Every mutation reloads nothing
//! and writes the whole map back; there is no file locking, so concurrent
//! installer processes can race (accepted limitation; callers serialize).

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tykctl_core::{paths, ExtensionsFile, InstalledExtension, Result};

/// Manages the persisted extensions.yaml file
#[derive(Debug)]
pub struct InstalledRegistry {
    file_path: PathBuf,
    file: ExtensionsFile,
}

impl InstalledRegistry {
    /// Open the registry file, creating an empty one if absent
    ///
    /// An unparsable file surfaces the YAML error; there is no recovery path
    /// beyond editing the file by hand.
    pub fn open(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(paths::EXTENSIONS_FILE);
        debug!("Loading extensions registry from {:?}", file_path);

        let file = if file_path.exists() {
            let content = std::fs::read_to_string(&file_path)?;
            serde_yaml_ng::from_str(&content)?
        } else {
            ExtensionsFile::default()
        };

        Ok(Self { file_path, file })
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(&self.file)?;
        std::fs::write(&self.file_path, content)?;
        debug!(
            "Saved extensions registry with {} entries",
            self.file.extensions.len()
        );
        Ok(())
    }

    /// Record an installation; a re-install overwrites the previous record
    pub fn insert(&mut self, name: &str, record: InstalledExtension) -> Result<()> {
        info!("Recording {} {} as installed", name, record.version);
        self.file.extensions.insert(name.to_string(), record);
        self.save()
    }

    /// Drop an extension's record
    pub fn remove(&mut self, name: &str) -> Result<Option<InstalledExtension>> {
        let removed = self.file.extensions.remove(name);
        if removed.is_some() {
            info!("Removing {} from registry", name);
            self.save()?;
        }
        Ok(removed)
    }

    /// Installed record for one extension
    pub fn get(&self, name: &str) -> Option<&InstalledExtension> {
        self.file.extensions.get(name)
    }

    /// Whether the extension has a registry entry
    pub fn is_installed(&self, name: &str) -> bool {
        self.file.extensions.contains_key(name)
    }

    /// All records, sorted by name
    pub fn list(&self) -> Vec<(&str, &InstalledExtension)> {
        self.file
            .extensions
            .iter()
            .map(|(name, record)| (name.as_str(), record))
            .collect()
    }

    /// Number of installed extensions
    pub fn count(&self) -> usize {
        self.file.extensions.len()
    }

    /// Path of the backing YAML file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(version: &str) -> InstalledExtension {
        InstalledExtension {
            version: version.to_string(),
            repository: "https://github.com/acme/widgets".to_string(),
            installed_at: Utc::now(),
            path: PathBuf::from("/data/tykctl-widgets/tykctl-widgets"),
        }
    }

    #[test]
    fn test_open_creates_nothing_until_first_write() {
        let dir = TempDir::new().unwrap();
        let registry = InstalledRegistry::open(dir.path()).unwrap();
        assert_eq!(registry.count(), 0);
        assert!(!dir.path().join("extensions.yaml").exists());
    }

    #[test]
    fn test_insert_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        {
            let mut registry = InstalledRegistry::open(dir.path()).unwrap();
            registry.insert("widgets", record("1.0.0")).unwrap();
        }

        let registry = InstalledRegistry::open(dir.path()).unwrap();
        assert!(registry.is_installed("widgets"));
        assert_eq!(registry.get("widgets").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_reinstall_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut registry = InstalledRegistry::open(dir.path()).unwrap();
        registry.insert("widgets", record("1.0.0")).unwrap();
        registry.insert("widgets", record("2.0.0")).unwrap();

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.get("widgets").unwrap().version, "2.0.0");
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let mut registry = InstalledRegistry::open(dir.path()).unwrap();
        registry.insert("widgets", record("1.0.0")).unwrap();

        assert!(registry.remove("widgets").unwrap().is_some());
        assert!(!registry.is_installed("widgets"));
        assert!(registry.remove("widgets").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_yaml_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("extensions.yaml"), ": not [ yaml }").unwrap();

        let err = InstalledRegistry::open(dir.path()).unwrap_err();
        assert!(matches!(err, tykctl_core::Error::Yaml(_)));
    }
}
