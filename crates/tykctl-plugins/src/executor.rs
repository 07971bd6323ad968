//! Plugin execution engine
//!
//! Spawns plugin executables with the injected `TYKCTL_*` environment block
//! and enforces the configured timeout. The engine never terminates the host
//! process: non-zero exits come back in an [`ExecutionOutcome`] (pass-through
//! mode) or as an error carrying captured stderr (capture mode), and the CLI
//! entry point decides what to do with them.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use tykctl_core::{Error, ExecutionConfig, ExecutionOutcome, Plugin, Result};

/// Exit code reported when the child was killed by a signal
const SIGNAL_EXIT_CODE: i32 = -1;

/// Executes plugins under timeout and environment-injection policy
pub struct PluginExecutor {
    config: ExecutionConfig,
}

impl PluginExecutor {
    /// Create an executor for one extension's resolved configuration
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// The configuration this executor runs under
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Run a plugin with the configured timeout, stdio inherited
    pub async fn execute(&self, plugin: &Plugin, args: &[String]) -> Result<ExecutionOutcome> {
        self.execute_with_timeout(plugin, args, self.config.plugin_timeout)
            .await
    }

    /// Run a plugin with an explicit timeout, stdio inherited
    ///
    /// `None` (or a zero duration) waits on the child without a deadline. The
    /// child's exit code is reported in the outcome rather than surfaced as
    /// an error.
    pub async fn execute_with_timeout(
        &self,
        plugin: &Plugin,
        args: &[String],
        timeout: Option<Duration>,
    ) -> Result<ExecutionOutcome> {
        let mut cmd = self.command(plugin, args);
        debug!("Executing plugin {:?} with timeout {:?}", plugin.path, timeout);

        let mut child = cmd.spawn().map_err(|e| Error::SpawnFailed {
            program: plugin.path.display().to_string(),
            source: e,
        })?;

        let status = match normalize(timeout) {
            None => child.wait().await?,
            Some(t) => match tokio::time::timeout(t, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    // The deadline fired: kill the child and report the
                    // timeout, not the kill error.
                    let _ = child.kill().await;
                    return Err(Error::ExecutionTimeout {
                        program: plugin.path.display().to_string(),
                        timeout: t,
                    });
                }
            },
        };

        Ok(ExecutionOutcome {
            exit_code: status.code().unwrap_or(SIGNAL_EXIT_CODE),
            stdout: None,
        })
    }

    /// Run a plugin with stdout captured
    ///
    /// Stderr is captured too, but only to embed in the error when the child
    /// exits non-zero; in capture mode a failure is an error, not an exit
    /// code to pass through.
    pub async fn execute_captured(
        &self,
        plugin: &Plugin,
        args: &[String],
    ) -> Result<ExecutionOutcome> {
        let mut cmd = self.command(plugin, args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| Error::SpawnFailed {
            program: plugin.path.display().to_string(),
            source: e,
        })?;

        let output = match normalize(self.config.plugin_timeout) {
            None => child.wait_with_output().await?,
            Some(t) => match tokio::time::timeout(t, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    return Err(Error::ExecutionTimeout {
                        program: plugin.path.display().to_string(),
                        timeout: t,
                    });
                }
            },
        };

        if !output.status.success() {
            return Err(Error::NonZeroExit {
                program: plugin.path.display().to_string(),
                code: output.status.code().unwrap_or(SIGNAL_EXIT_CODE),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ExecutionOutcome {
            exit_code: 0,
            stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        })
    }

    /// Build the command: parent environment plus the injected block
    fn command(&self, plugin: &Plugin, args: &[String]) -> Command {
        let mut cmd = Command::new(&plugin.path);
        cmd.args(args);
        cmd.kill_on_drop(true);
        for (key, value) in self.plugin_env(plugin) {
            cmd.env(key, value);
        }
        cmd
    }

    /// The `TYKCTL_*` block injected into every plugin subprocess
    pub fn plugin_env(&self, plugin: &Plugin) -> Vec<(String, String)> {
        let config = &self.config;
        let mut env = vec![
            ("TYKCTL_PLUGIN_NAME".to_string(), plugin.name.clone()),
            (
                "TYKCTL_PLUGIN_PATH".to_string(),
                plugin.path.display().to_string(),
            ),
            (
                "TYKCTL_PLUGIN_EXTENSION".to_string(),
                plugin.extension.clone(),
            ),
            (
                "TYKCTL_PLUGIN_DIR".to_string(),
                config.plugin_dir.display().to_string(),
            ),
            (
                config.env_key("CONFIG_DIR"),
                config.config_dir.display().to_string(),
            ),
            (
                config.env_key("PLUGIN_DIR"),
                config.plugin_dir.display().to_string(),
            ),
            (
                config.env_key("GLOBAL_CONFIG_DIR"),
                config.global_config_dir.display().to_string(),
            ),
            (
                config.env_key("PLUGIN_DISCOVERY_PATHS"),
                config.discovery_paths_joined(),
            ),
            (config.env_key("DEBUG"), config.debug.to_string()),
            (config.env_key("VERBOSE"), config.verbose.to_string()),
        ];

        if let Some(context) = &config.context {
            env.push((config.env_key("CONTEXT"), context.clone()));
        }
        // API endpoint passthroughs are forwarded only when the parent
        // environment supplied them.
        if let Some(url) = &config.api_url {
            env.push((config.passthrough_key("URL"), url.clone()));
        }
        if let Some(token) = &config.api_token {
            env.push((config.passthrough_key("TOKEN"), token.clone()));
        }

        env
    }
}

/// Zero-duration timeouts behave exactly like no timeout at all
fn normalize(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|t| !t.is_zero())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    fn script_plugin(dir: &Path, name: &str, body: &str) -> Plugin {
        let path = dir.join(format!("tykctl-widgets-{name}"));
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        Plugin {
            name: name.to_string(),
            path,
            extension: "widgets".to_string(),
        }
    }

    fn test_executor(dir: &Path) -> PluginExecutor {
        let config = ExecutionConfig::new("widgets")
            .unwrap()
            .with_plugin_dir(dir)
            .with_config_dir(dir.join("cfg"));
        PluginExecutor::new(config)
    }

    #[tokio::test]
    async fn test_zero_timeout_behaves_unbounded() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "ok", "exit 0");
        let executor = test_executor(dir.path());

        let unbounded = executor
            .execute_with_timeout(&plugin, &[], None)
            .await
            .unwrap();
        let zero = executor
            .execute_with_timeout(&plugin, &[], Some(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(unbounded, zero);
        assert!(zero.is_success());
    }

    #[tokio::test]
    async fn test_timeout_kills_and_reports_timeout_error() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "slow", "sleep 30");
        let executor = test_executor(dir.path());

        let start = Instant::now();
        let err = executor
            .execute_with_timeout(&plugin, &[], Some(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(matches!(err, Error::ExecutionTimeout { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit_passes_through_as_outcome() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "fail", "exit 3");
        let executor = test_executor(dir.path());

        let outcome = executor.execute(&plugin, &[]).await.unwrap();
        assert_eq!(outcome.exit_code, 3);
    }

    #[tokio::test]
    async fn test_captured_nonzero_exit_is_an_error_with_stderr() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "bad", "echo boom >&2; exit 2");
        let executor = test_executor(dir.path());

        let err = executor.execute_captured(&plugin, &[]).await.unwrap_err();
        match err {
            Error::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_env_block_reaches_the_child() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(
            dir.path(),
            "env",
            "echo \"$TYKCTL_PLUGIN_NAME:$TYKCTL_PLUGIN_EXTENSION:$TYKCTL_WIDGETS_DEBUG\"",
        );
        let executor = test_executor(dir.path());

        let outcome = executor.execute_captured(&plugin, &[]).await.unwrap();
        assert_eq!(outcome.stdout.unwrap().trim(), "env:widgets:false");
    }

    #[tokio::test]
    async fn test_args_are_forwarded() {
        let dir = TempDir::new().unwrap();
        let plugin = script_plugin(dir.path(), "echoargs", "echo \"$1 $2\"");
        let executor = test_executor(dir.path());

        let outcome = executor
            .execute_captured(&plugin, &["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.stdout.unwrap().trim(), "alpha beta");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_distinct() {
        let dir = TempDir::new().unwrap();
        let plugin = Plugin {
            name: "ghost".to_string(),
            path: dir.path().join("tykctl-widgets-ghost"),
            extension: "widgets".to_string(),
        };
        let executor = test_executor(dir.path());

        let err = executor.execute(&plugin, &[]).await.unwrap_err();
        assert!(matches!(err, Error::SpawnFailed { .. }));
    }
}
