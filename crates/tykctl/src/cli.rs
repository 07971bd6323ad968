//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Tykctl - Tyk extension and plugin manager
#[derive(Parser, Debug)]
#[command(name = "tykctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extension lifecycle management
    #[command(subcommand)]
    Extension(ExtensionCommands),

    /// Plugin management for an extension
    #[command(subcommand)]
    Plugin(PluginCommands),

    /// Lifecycle hook management
    #[command(subcommand)]
    Hook(HookCommands),
}

// Extension commands
#[derive(Subcommand, Debug)]
pub enum ExtensionCommands {
    /// Install an extension from a GitHub repository
    Install(ExtensionInstallArgs),

    /// Remove an installed extension
    Remove(ExtensionRemoveArgs),

    /// Run an installed extension
    Run(ExtensionRunArgs),

    /// List installed extensions
    List(ExtensionListArgs),

    /// Check installed extensions against their binaries
    Verify(ExtensionVerifyArgs),
}

#[derive(Args, Debug)]
pub struct ExtensionInstallArgs {
    /// Repository in owner/name form
    pub repo: String,

    /// Reinstall if already installed
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionRemoveArgs {
    /// Extension name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ExtensionRunArgs {
    /// Extension name
    pub name: String,

    /// Arguments forwarded to the extension binary
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ExtensionListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExtensionVerifyArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Plugin commands
#[derive(Subcommand, Debug)]
pub enum PluginCommands {
    /// List discovered plugins
    List(PluginListArgs),

    /// Run a plugin by name
    Run(PluginRunArgs),

    /// Install a plugin from a local directory
    Install(PluginInstallArgs),

    /// Remove an installed plugin
    Remove(PluginRemoveArgs),

    /// Create a skeleton plugin script
    Scaffold(PluginScaffoldArgs),
}

#[derive(Args, Debug)]
pub struct PluginListArgs {
    /// Extension the plugins belong to
    #[arg(short, long, env = "TYKCTL_EXTENSION")]
    pub extension: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PluginRunArgs {
    /// Extension the plugin belongs to
    #[arg(short, long, env = "TYKCTL_EXTENSION")]
    pub extension: String,

    /// Plugin name
    pub name: String,

    /// Arguments forwarded to the plugin
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PluginInstallArgs {
    /// Extension the plugin belongs to
    #[arg(short, long, env = "TYKCTL_EXTENSION")]
    pub extension: String,

    /// Plugin name
    pub name: String,

    /// Directory holding the plugin executables
    #[arg(short, long)]
    pub source: std::path::PathBuf,

    /// Overwrite an existing plugin
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct PluginRemoveArgs {
    /// Extension the plugin belongs to
    #[arg(short, long, env = "TYKCTL_EXTENSION")]
    pub extension: String,

    /// Plugin name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct PluginScaffoldArgs {
    /// Extension the plugin belongs to
    #[arg(short, long, env = "TYKCTL_EXTENSION")]
    pub extension: String,

    /// Plugin name
    pub name: String,
}

// Hook commands
#[derive(Subcommand, Debug)]
pub enum HookCommands {
    /// List external hooks
    List(HookListArgs),

    /// Create an empty external hook script
    Create(HookNameArgs),

    /// Enable a disabled external hook
    Enable(HookNameArgs),

    /// Disable an external hook without deleting it
    Disable(HookNameArgs),

    /// Delete an external hook
    Delete(HookNameArgs),
}

#[derive(Args, Debug)]
pub struct HookListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HookNameArgs {
    /// Hook script name, e.g. before-install or after-run-notify
    pub name: String,
}
