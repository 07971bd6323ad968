//! External hook management commands
//!
//! External hooks are executable scripts in the shared hook directory,
//! named after the lifecycle event they fire on (optionally with a
//! `-suffix`). A `.disabled` sidecar marker gates a hook off. Lifecycle
//! operations dispatch from the same directory these commands manage.

use anyhow::Result;
use tabled::{Table, Tabled};
use tykctl_core::paths;
use tykctl_hooks::HookManager;

use crate::cli::{HookCommands, HookListArgs, HookNameArgs};
use crate::output;

const HOOK_TEMPLATE: &str = "#!/bin/sh\n# Runs with TYKCTL_HOOK_EVENT, TYKCTL_HOOK_EXTENSION,\n# TYKCTL_HOOK_PATH, and TYKCTL_HOOK_WORKING_DIR set.\n";

/// Main entry point for hook subcommands
pub async fn run(cmd: HookCommands) -> Result<()> {
    match cmd {
        HookCommands::List(args) => list(args),
        HookCommands::Create(args) => create(args),
        HookCommands::Enable(args) => enable(args),
        HookCommands::Disable(args) => disable(args),
        HookCommands::Delete(args) => delete(args),
    }
}

pub(crate) fn manager() -> Result<HookManager> {
    Ok(HookManager::new(paths::hooks_dir()?))
}

#[derive(Tabled)]
struct HookRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ENABLED")]
    enabled: bool,
    #[tabled(rename = "PATH")]
    path: String,
}

fn list(args: HookListArgs) -> Result<()> {
    let hooks = manager()?.list_external()?;

    if args.json {
        let entries: Vec<serde_json::Value> = hooks
            .iter()
            .map(|h| serde_json::json!({ "name": h.name, "enabled": h.enabled, "path": h.path }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if hooks.is_empty() {
        output::info("No hooks defined");
        return Ok(());
    }

    let rows: Vec<HookRow> = hooks
        .into_iter()
        .map(|h| HookRow {
            name: h.name,
            enabled: h.enabled,
            path: h.path.display().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn create(args: HookNameArgs) -> Result<()> {
    let path = manager()?.create_external(&args.name, HOOK_TEMPLATE)?;
    output::success(&format!("Created hook at {}", path.display()));
    Ok(())
}

fn enable(args: HookNameArgs) -> Result<()> {
    manager()?.enable_external(&args.name)?;
    output::success(&format!("Enabled hook '{}'", args.name));
    Ok(())
}

fn disable(args: HookNameArgs) -> Result<()> {
    manager()?.disable_external(&args.name)?;
    output::success(&format!("Disabled hook '{}'", args.name));
    Ok(())
}

fn delete(args: HookNameArgs) -> Result<()> {
    manager()?.delete_external(&args.name)?;
    output::success(&format!("Deleted hook '{}'", args.name));
    Ok(())
}
