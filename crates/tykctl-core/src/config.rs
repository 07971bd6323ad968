//! Execution configuration
//!
//! All environment-driven knobs (timeouts, directories, debug flags, API
//! passthroughs) are resolved exactly once at startup into an
//! [`ExecutionConfig`]; the plugin and hook engines take the struct and never
//! read the process environment themselves.

use crate::error::{Error, Result};
use crate::paths;
use std::path::PathBuf;
use std::time::Duration;

/// Global timeout environment variable (fallback for every extension)
pub const GLOBAL_TIMEOUT_ENV: &str = "TYKCTL_PLUGIN_TIMEOUT";

/// Resolved configuration for plugin and extension execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Extension name this configuration is scoped to
    pub extension: String,

    /// Per-extension configuration directory
    pub config_dir: PathBuf,

    /// Global tykctl configuration directory
    pub global_config_dir: PathBuf,

    /// Directory holding this extension's plugin binaries
    pub plugin_dir: PathBuf,

    /// Ordered plugin discovery paths
    pub discovery_paths: Vec<PathBuf>,

    /// Plugin execution timeout; None means unbounded
    pub plugin_timeout: Option<Duration>,

    /// Active context name, if any
    pub context: Option<String>,

    /// Debug flag forwarded to plugins
    pub debug: bool,

    /// Verbose flag forwarded to plugins
    pub verbose: bool,

    /// Dashboard/API URL passthrough (TYK_<EXT>_URL), forwarded only if set
    pub api_url: Option<String>,

    /// API token passthrough (TYK_<EXT>_TOKEN), forwarded only if set
    pub api_token: Option<String>,
}

impl ExecutionConfig {
    /// Build a configuration with defaults derived from the XDG layout,
    /// without consulting the environment. Useful for tests.
    pub fn new(extension: impl Into<String>) -> Result<Self> {
        let extension = extension.into();
        let config_dir = paths::extension_config_dir(&extension)?;
        let plugin_dir = paths::extension_install_dir(&extension)?;
        Ok(Self {
            global_config_dir: paths::global_config_dir()?,
            discovery_paths: vec![plugin_dir.clone()],
            config_dir,
            plugin_dir,
            plugin_timeout: None,
            context: None,
            debug: false,
            verbose: false,
            api_url: None,
            api_token: None,
            extension,
        })
    }

    /// Build a configuration from the process environment
    ///
    /// Timeout resolution order: `TYKCTL_<EXT>_PLUGIN_TIMEOUT` →
    /// `TYKCTL_PLUGIN_TIMEOUT` → unbounded. A zero duration is normalized to
    /// unbounded.
    pub fn from_env(extension: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(extension)?;

        let timeout_raw = std::env::var(config.env_key("PLUGIN_TIMEOUT"))
            .or_else(|_| std::env::var(GLOBAL_TIMEOUT_ENV))
            .ok();
        if let Some(raw) = timeout_raw {
            let duration = parse_go_duration(&raw)?;
            config.plugin_timeout = (!duration.is_zero()).then_some(duration);
        }

        if let Ok(raw) = std::env::var(config.env_key("PLUGIN_DISCOVERY_PATHS")) {
            let paths: Vec<PathBuf> = raw
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
            if !paths.is_empty() {
                config.discovery_paths = paths;
            }
        }

        config.context = std::env::var(config.env_key("CONTEXT")).ok();
        config.debug = env_flag(&config.env_key("DEBUG"));
        config.verbose = env_flag(&config.env_key("VERBOSE"));
        config.api_url = std::env::var(config.passthrough_key("URL")).ok();
        config.api_token = std::env::var(config.passthrough_key("TOKEN")).ok();

        Ok(config)
    }

    /// Override the plugin directory (and make it the sole discovery path)
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dir = dir.into();
        self.discovery_paths = vec![self.plugin_dir.clone()];
        self
    }

    /// Override the config directory
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Override the discovery paths
    pub fn with_discovery_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.discovery_paths = paths;
        self
    }

    /// Override the plugin timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.plugin_timeout = timeout;
        self
    }

    /// Extension name as an environment-variable token (upper-case, `-` → `_`)
    pub fn extension_token(&self) -> String {
        self.extension.to_uppercase().replace('-', "_")
    }

    /// `TYKCTL_<EXT>_<suffix>` key for this extension
    pub fn env_key(&self, suffix: &str) -> String {
        format!("TYKCTL_{}_{}", self.extension_token(), suffix)
    }

    /// `TYK_<EXT>_<suffix>` passthrough key for this extension
    pub fn passthrough_key(&self, suffix: &str) -> String {
        format!("TYK_{}_{}", self.extension_token(), suffix)
    }

    /// Discovery paths joined with `:` for injection into child processes
    pub fn discovery_paths_joined(&self) -> String {
        self.discovery_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// True when the variable is set to a truthy value
fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
    )
}

/// Parse a Go-style duration string (`300ms`, `30s`, `5m`, `1h`, `1h30m`)
///
/// A bare integer is read as seconds. Zero is a valid value and means
/// unbounded to callers that normalize it.
pub fn parse_go_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::invalid_timeout(input));
    }

    // Bare integer: seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::invalid_timeout(input))?;
        if digits_end == 0 {
            return Err(Error::invalid_timeout(input));
        }
        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| Error::invalid_timeout(input))?;
        rest = &rest[digits_end..];

        let (unit, after) = if rest.starts_with("ms") {
            ("ms", &rest[2..])
        } else if let Some(after) = rest.strip_prefix(['s', 'm', 'h']) {
            (&rest[..1], after)
        } else {
            return Err(Error::invalid_timeout(input));
        };

        let component = match unit {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            _ => unreachable!(),
        }
        .ok_or_else(|| Error::invalid_timeout(input))?;
        total = total
            .checked_add(component)
            .ok_or_else(|| Error::invalid_timeout(input))?;
        rest = after;
    }

    Ok(total)
}
