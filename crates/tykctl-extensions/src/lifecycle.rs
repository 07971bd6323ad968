//! Extension lifecycle orchestration
//!
//! Each operation moves Pending → Executing → Completed, or Aborted when a
//! before-hook fails: the `before-<op>` event fires first and any error
//! returns to the caller with no filesystem or network work done; the
//! operation's effect runs next; the `after-<op>` event fires last and its
//! errors are logged, never propagated, and never revert the effect.
//!
//! Install is not transactional. The binary is written before the registry
//! entry and the registry is the source of truth for "installed"; a crash
//! between the two leaves an orphaned binary that [`ExtensionLifecycle::verify`]
//! reports on request.

use crate::registry::InstalledRegistry;
use crate::source::ExtensionSource;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tykctl_core::{Error, ExecutionConfig, ExecutionOutcome, InstalledExtension, Plugin, Result};
use tykctl_hooks::{HookData, HookEvent, HookManager};
use tykctl_plugins::{naming, PluginExecutor};

/// A mismatch between the registry and the extension data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orphan {
    /// Registry entry whose binary is gone
    MissingBinary { name: String, path: PathBuf },

    /// Binary directory on disk with no registry entry
    UntrackedBinary { name: String, path: PathBuf },
}

/// Orchestrates install, uninstall, and run for GitHub-sourced extensions
///
/// Not synchronized: one operation at a time per instance, and the registry
/// file has no cross-process locking.
pub struct ExtensionLifecycle {
    registry: InstalledRegistry,
    hooks: HookManager,
    source: Arc<dyn ExtensionSource>,
    data_dir: PathBuf,
}

impl ExtensionLifecycle {
    pub fn new(
        registry: InstalledRegistry,
        hooks: HookManager,
        source: Arc<dyn ExtensionSource>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            hooks,
            source,
            data_dir: data_dir.into(),
        }
    }

    /// The installed-extension registry
    pub fn registry(&self) -> &InstalledRegistry {
        &self.registry
    }

    /// The hook manager
    pub fn hooks(&self) -> &HookManager {
        &self.hooks
    }

    /// The hook manager, for builtin registrations and hook tooling
    pub fn hooks_mut(&mut self) -> &mut HookManager {
        &mut self.hooks
    }

    /// Directory holding one extension's binary
    pub fn install_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("tykctl-{name}"))
    }

    /// Install the latest release of `owner/name`
    pub async fn install(&mut self, repo: &str, force: bool) -> Result<InstalledExtension> {
        let name = repo.rsplit('/').next().unwrap_or(repo).to_string();
        let install_dir = self.install_dir(&name);

        let mut data = HookData::new(&name, &install_dir);
        data.metadata.insert(
            "repository".to_string(),
            serde_json::Value::String(repo.to_string()),
        );
        self.fire_before("install", &mut data).await?;

        if install_dir.exists() {
            if !force {
                return Err(Error::already_exists(install_dir));
            }
            std::fs::remove_dir_all(&install_dir)?;
        }

        let resolved = self.source.resolve(repo).await?;
        let bytes = self.source.fetch(&resolved).await?;

        // Binary first, registry second; a crash between the two leaves
        // an orphan for `verify` rather than a phantom registry entry.
        let binary_path = install_dir.join(naming::extension_binary_name(&name));
        std::fs::create_dir_all(&install_dir)?;
        std::fs::write(&binary_path, &bytes)?;
        force_executable(&binary_path)?;

        let record = InstalledExtension {
            version: resolved.version.clone(),
            repository: resolved.repository.clone(),
            installed_at: Utc::now(),
            path: binary_path,
        };
        self.registry.insert(&name, record.clone())?;
        info!("Installed extension '{}' {}", name, record.version);

        self.fire_after("install", &mut data).await;
        Ok(record)
    }

    /// Remove an installed extension's binary directory and registry entry
    pub async fn uninstall(&mut self, name: &str) -> Result<()> {
        if !self.registry.is_installed(name) {
            return Err(Error::not_installed(name));
        }
        let install_dir = self.install_dir(name);

        let mut data = HookData::new(name, &install_dir);
        self.fire_before("uninstall", &mut data).await?;

        if install_dir.exists() {
            std::fs::remove_dir_all(&install_dir)?;
        }
        self.registry.remove(name)?;
        info!("Uninstalled extension '{}'", name);

        self.fire_after("uninstall", &mut data).await;
        Ok(())
    }

    /// Run an installed extension as a subprocess
    ///
    /// Only installed extensions are runnable here; ad-hoc binaries never
    /// pass through this path. The caller supplies the resolved execution
    /// configuration for the extension.
    pub async fn run(
        &mut self,
        name: &str,
        args: &[String],
        config: &ExecutionConfig,
    ) -> Result<ExecutionOutcome> {
        let record = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_installed(name))?;

        let mut data = HookData::new(name, &record.path);
        self.fire_before("run", &mut data).await?;

        let target = Plugin {
            name: name.to_string(),
            path: record.path,
            extension: name.to_string(),
        };
        let outcome = PluginExecutor::new(config.clone())
            .execute(&target, args)
            .await?;

        self.fire_after("run", &mut data).await;
        Ok(outcome)
    }

    /// Reconcile the registry against the data directory
    ///
    /// Reports orphans in both directions without repairing either: a
    /// registry entry whose binary vanished, and a binary directory no
    /// registry entry claims.
    pub fn verify(&self) -> Result<Vec<Orphan>> {
        let mut orphans = Vec::new();

        for (name, record) in self.registry.list() {
            if !record.path.exists() {
                orphans.push(Orphan::MissingBinary {
                    name: name.to_string(),
                    path: record.path.clone(),
                });
            }
        }

        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(orphans),
            Err(e) => return Err(e.into()),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(name) = dir_name.strip_prefix("tykctl-") else {
                continue;
            };
            if !self.registry.is_installed(name) {
                orphans.push(Orphan::UntrackedBinary {
                    name: name.to_string(),
                    path,
                });
            }
        }

        Ok(orphans)
    }

    /// Fire `before-<op>`: any error aborts the operation
    async fn fire_before(&self, op: &str, data: &mut HookData) -> Result<()> {
        let event = HookEvent::before(op);
        self.hooks.execute(&event, data).await.map_err(|e| match e {
            hook @ Error::HookFailed { .. } => hook,
            other => Error::hook_failed(event.tag(), other.to_string()),
        })
    }

    /// Fire `after-<op>`: errors are logged, the completed effect stands
    async fn fire_after(&self, op: &str, data: &mut HookData) {
        let event = HookEvent::after(op);
        if let Err(e) = self.hooks.execute(&event, data).await {
            warn!("{} hook failed after completed operation: {}", event, e);
        }
    }
}

#[cfg(unix)]
fn force_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn force_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
