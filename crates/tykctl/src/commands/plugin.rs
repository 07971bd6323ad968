//! Plugin management commands
//!
//! Plugins are standalone `tykctl-<extension>-<name>` executables discovered
//! on the extension's search paths. These commands list, run, install,
//! remove, and scaffold them.

use anyhow::Result;
use tabled::{Table, Tabled};
use tykctl_core::ExecutionConfig;
use tykctl_plugins::PluginManager;

use crate::cli::{
    PluginCommands, PluginInstallArgs, PluginListArgs, PluginRemoveArgs, PluginRunArgs,
    PluginScaffoldArgs,
};
use crate::output;

/// Main entry point for plugin subcommands
pub async fn run(cmd: PluginCommands) -> Result<()> {
    match cmd {
        PluginCommands::List(args) => list(args),
        PluginCommands::Run(args) => run_plugin(args).await,
        PluginCommands::Install(args) => install(args),
        PluginCommands::Remove(args) => remove(args),
        PluginCommands::Scaffold(args) => scaffold(args),
    }
}

fn manager(extension: &str) -> Result<PluginManager> {
    Ok(PluginManager::new(ExecutionConfig::from_env(extension)?))
}

#[derive(Tabled)]
struct PluginRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PATH")]
    path: String,
}

fn list(args: PluginListArgs) -> Result<()> {
    let plugins = manager(&args.extension)?.list();

    if args.json {
        let entries: Vec<serde_json::Value> = plugins
            .iter()
            .map(|p| serde_json::json!({ "name": p.name, "path": p.path }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if plugins.is_empty() {
        output::info(&format!(
            "No plugins found for extension '{}'",
            args.extension
        ));
        return Ok(());
    }

    let rows: Vec<PluginRow> = plugins
        .into_iter()
        .map(|p| PluginRow {
            name: p.name,
            path: p.path.display().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

async fn run_plugin(args: PluginRunArgs) -> Result<()> {
    let outcome = manager(&args.extension)?.run(&args.name, &args.args).await?;
    if !outcome.is_success() {
        // Pass the child's exit code through; signal terminations map to 1
        std::process::exit(outcome.exit_code.max(1));
    }
    Ok(())
}

fn install(args: PluginInstallArgs) -> Result<()> {
    let dest = manager(&args.extension)?.install(&args.source, &args.name, args.force)?;
    output::success(&format!(
        "Installed plugin '{}' at {}",
        args.name,
        dest.display()
    ));
    Ok(())
}

fn remove(args: PluginRemoveArgs) -> Result<()> {
    manager(&args.extension)?.remove(&args.name)?;
    output::success(&format!("Removed plugin '{}'", args.name));
    Ok(())
}

fn scaffold(args: PluginScaffoldArgs) -> Result<()> {
    let dest = manager(&args.extension)?.scaffold(&args.name)?;
    output::success(&format!("Created plugin skeleton at {}", dest.display()));
    output::info("Edit the script, then verify it shows up with 'tykctl plugin list'");
    Ok(())
}
