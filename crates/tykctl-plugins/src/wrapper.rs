//! Wrapper script synthesis
//!
//! A plugin bundle with several executables gets a single dispatcher script
//! at the canonical plugin path, routing the first argument to the matching
//! binary. Single-executable bundles skip synthesis entirely and are copied
//! with the executable bit forced. The same generator also produces the
//! boilerplate skeleton for a brand-new plugin.

use crate::platform::Platform;
use std::path::Path;
use tracing::{debug, info};
use tykctl_core::{Error, Result};

/// Suffix of the directory holding a dispatched bundle's binaries
const BUNDLE_DIR_SUFFIX: &str = ".d";

/// Platform-polymorphic generator for dispatcher and skeleton scripts
pub struct WrapperScriptGenerator {
    platform: Platform,
}

impl WrapperScriptGenerator {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Generator for the host platform
    pub fn for_current_platform() -> Self {
        Self::new(Platform::current())
    }

    /// Dispatcher script routing `argv[1]` to one of the bundled binaries
    ///
    /// `bundle_dir` is baked into the script so the dispatcher works from any
    /// working directory.
    pub fn dispatcher_script(&self, bundle_dir: &Path, binaries: &[String]) -> String {
        match self.platform {
            Platform::Posix => self.posix_dispatcher(bundle_dir, binaries),
            Platform::Windows => self.windows_dispatcher(bundle_dir, binaries),
        }
    }

    fn posix_dispatcher(&self, bundle_dir: &Path, binaries: &[String]) -> String {
        let mut script = String::from("#!/bin/sh\n# Generated by tykctl. Do not edit.\n");
        script.push_str(&format!("DIR=\"{}\"\n", bundle_dir.display()));
        script.push_str("COMMAND=\"$1\"\ncase \"$COMMAND\" in\n");
        for binary in binaries {
            script.push_str(&format!(
                "  {binary})\n    shift\n    exec \"$DIR/{binary}\" \"$@\"\n    ;;\n"
            ));
        }
        script.push_str("  help|\"\")\n    echo \"Available commands:\"\n");
        for binary in binaries {
            script.push_str(&format!("    echo \"  {binary}\"\n"));
        }
        script.push_str("    ;;\n  *)\n    echo \"unknown command: $COMMAND\" >&2\n");
        script.push_str(&format!(
            "    echo \"available: {}\" >&2\n    exit 1\n    ;;\nesac\n",
            binaries.join(" ")
        ));
        script
    }

    fn windows_dispatcher(&self, bundle_dir: &Path, binaries: &[String]) -> String {
        let mut script = String::from("@echo off\nrem Generated by tykctl. Do not edit.\n");
        script.push_str(&format!("set \"DIR={}\"\n", bundle_dir.display()));
        script.push_str("set COMMAND=%1\n");
        script.push_str(
            "set \"REST=\"\n:collect\nshift\nif \"%1\"==\"\" goto dispatch\nset \"REST=%REST% %1\"\ngoto collect\n:dispatch\n",
        );
        for binary in binaries {
            script.push_str(&format!(
                "if \"%COMMAND%\"==\"{binary}\" (\n  \"%DIR%\\{binary}\" %REST%\n  exit /b %errorlevel%\n)\n"
            ));
        }
        script.push_str("echo Available commands:\n");
        for binary in binaries {
            script.push_str(&format!("echo   {binary}\n"));
        }
        script.push_str("if not \"%COMMAND%\"==\"\" if not \"%COMMAND%\"==\"help\" exit /b 1\n");
        script
    }

    /// Boilerplate script for a brand-new plugin skeleton
    pub fn skeleton_script(&self, extension: &str, plugin: &str) -> String {
        match self.platform {
            Platform::Posix => format!(
                r#"#!/bin/sh
# {plugin}: a tykctl {extension} plugin
case "$1" in
  version)
    echo "{plugin} 0.1.0"
    ;;
  info)
    echo "{plugin}: a plugin for the {extension} extension"
    ;;
  help|*)
    echo "usage: tykctl {extension} {plugin} <version|info|help>"
    ;;
esac
"#
            ),
            Platform::Windows => format!(
                "@echo off\r\nrem {plugin}: a tykctl {extension} plugin\r\n\
                 if \"%1\"==\"version\" (\r\n  echo {plugin} 0.1.0\r\n  exit /b 0\r\n)\r\n\
                 if \"%1\"==\"info\" (\r\n  echo {plugin}: a plugin for the {extension} extension\r\n  exit /b 0\r\n)\r\n\
                 echo usage: tykctl {extension} {plugin} ^<version^|info^|help^>\r\n"
            ),
        }
    }

    /// Install a bundle directory at the canonical plugin path
    ///
    /// One executable: copied directly to `dest` with the executable bit
    /// forced regardless of source permissions. Several executables: copied
    /// into `<dest>.d/` with a dispatcher written at `dest`.
    pub fn install_bundle(&self, source_dir: &Path, dest: &Path) -> Result<()> {
        let mut binaries = self.list_executables(source_dir)?;
        binaries.sort();

        match binaries.len() {
            0 => Err(Error::NoExecutables {
                path: source_dir.to_path_buf(),
            }),
            1 => {
                debug!("Single executable bundle, copying directly to {:?}", dest);
                std::fs::copy(source_dir.join(&binaries[0]), dest)?;
                force_executable(dest)?;
                Ok(())
            }
            _ => {
                let bundle_dir = dest.with_file_name(format!(
                    "{}{BUNDLE_DIR_SUFFIX}",
                    dest.file_name()
                        .and_then(|n| n.to_str())
                        .ok_or_else(|| Error::InvalidName {
                            name: dest.display().to_string(),
                        })?
                ));
                std::fs::create_dir_all(&bundle_dir)?;
                for binary in &binaries {
                    let target = bundle_dir.join(binary);
                    std::fs::copy(source_dir.join(binary), &target)?;
                    force_executable(&target)?;
                }

                let script = self.dispatcher_script(&bundle_dir, &binaries);
                std::fs::write(dest, script)?;
                force_executable(dest)?;
                info!(
                    "Wrote dispatcher for {} binaries at {:?}",
                    binaries.len(),
                    dest
                );
                Ok(())
            }
        }
    }

    /// Names of executable entries in a directory, unsorted
    fn list_executables(&self, dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let metadata = entry.metadata()?;
            if self.platform.is_executable(&path, &metadata) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}

#[cfg(unix)]
fn force_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn force_executable(_path: &Path) -> Result<()> {
    Ok(())
}
