//! Plugin manager: discovery, installation, removal, and execution

use crate::discovery::discover_plugins;
use crate::executor::PluginExecutor;
use crate::naming;
use crate::wrapper::WrapperScriptGenerator;
use std::path::{Path, PathBuf};
use tracing::info;
use tykctl_core::{Error, ExecutionConfig, ExecutionOutcome, Plugin, Result};

/// Manages one extension's plugins
///
/// Not synchronized: callers run one operation at a time per instance.
pub struct PluginManager {
    executor: PluginExecutor,
    generator: WrapperScriptGenerator,
}

impl PluginManager {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            executor: PluginExecutor::new(config),
            generator: WrapperScriptGenerator::for_current_platform(),
        }
    }

    fn config(&self) -> &ExecutionConfig {
        self.executor.config()
    }

    /// All plugins discovered across the configured paths, in path order
    pub fn list(&self) -> Vec<Plugin> {
        discover_plugins(&self.config().discovery_paths, &self.config().extension)
    }

    /// First discovered plugin with the given name
    pub fn find(&self, name: &str) -> Result<Plugin> {
        self.list()
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::plugin_not_found(name, &self.config().extension))
    }

    /// Discover and run a plugin under the configured timeout policy
    pub async fn run(&self, name: &str, args: &[String]) -> Result<ExecutionOutcome> {
        let plugin = self.find(name)?;
        self.executor.execute(&plugin, args).await
    }

    /// Canonical path for a plugin binary of this extension
    pub fn canonical_path(&self, name: &str) -> PathBuf {
        let config = self.config();
        config
            .plugin_dir
            .join(naming::plugin_binary_name(&config.extension, name))
    }

    /// Install a plugin from a source directory
    ///
    /// The source may hold a single executable (copied directly) or a bundle
    /// of several (dispatcher synthesized). The target path must not already
    /// exist unless `force` is set.
    pub fn install(&self, source_dir: &Path, name: &str, force: bool) -> Result<PathBuf> {
        let dest = self.canonical_path(name);
        if dest.exists() {
            if !force {
                return Err(Error::already_exists(dest));
            }
            self.remove(name)?;
        }
        std::fs::create_dir_all(&self.config().plugin_dir)?;
        self.generator.install_bundle(source_dir, &dest)?;
        info!("Installed plugin '{}' at {:?}", name, dest);
        Ok(dest)
    }

    /// Write a skeleton plugin script at the canonical path
    pub fn scaffold(&self, name: &str) -> Result<PathBuf> {
        let dest = self.canonical_path(name);
        if dest.exists() {
            return Err(Error::already_exists(dest));
        }
        std::fs::create_dir_all(&self.config().plugin_dir)?;
        let script = self
            .generator
            .skeleton_script(&self.config().extension, name);
        std::fs::write(&dest, script)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755))?;
        }
        info!("Scaffolded plugin '{}' at {:?}", name, dest);
        Ok(dest)
    }

    /// Delete a plugin's canonical binary (and its bundle directory, if any)
    pub fn remove(&self, name: &str) -> Result<()> {
        let dest = self.canonical_path(name);
        if !dest.exists() {
            return Err(Error::plugin_not_found(name, &self.config().extension));
        }
        std::fs::remove_file(&dest)?;

        let bundle_dir = dest.with_file_name(format!(
            "{}.d",
            dest.file_name().and_then(|n| n.to_str()).unwrap_or_default()
        ));
        if bundle_dir.is_dir() {
            std::fs::remove_dir_all(&bundle_dir)?;
        }
        info!("Removed plugin '{}'", name);
        Ok(())
    }
}
