//! Extension lifecycle commands
//!
//! - install: fetch the latest release of `owner/name` from GitHub
//! - remove: uninstall an extension and drop its registry entry
//! - run: execute an installed extension, passing its exit code through
//! - list: show the installed-extension registry
//! - verify: reconcile the registry against the data directory

use anyhow::Result;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tykctl_core::{paths, ExecutionConfig};
use tykctl_extensions::{ExtensionLifecycle, GithubSource, InstalledRegistry, Orphan};
use tykctl_hooks::HookManager;

use crate::cli::{
    ExtensionCommands, ExtensionInstallArgs, ExtensionListArgs, ExtensionRemoveArgs,
    ExtensionRunArgs, ExtensionVerifyArgs,
};
use crate::output;

/// Main entry point for extension subcommands
pub async fn run(cmd: ExtensionCommands) -> Result<()> {
    match cmd {
        ExtensionCommands::Install(args) => install(args).await,
        ExtensionCommands::Remove(args) => remove(args).await,
        ExtensionCommands::Run(args) => run_extension(args).await,
        ExtensionCommands::List(args) => list(args),
        ExtensionCommands::Verify(args) => verify(args),
    }
}

/// Assemble the lifecycle over the real XDG layout and GitHub source
///
/// The hook manager reads the same directory the `tykctl hook` commands
/// manage, so hooks created there fire on install, uninstall, and run.
fn lifecycle() -> Result<ExtensionLifecycle> {
    let config_dir = paths::global_config_dir()?;
    let registry = InstalledRegistry::open(&config_dir)?;
    let hooks = HookManager::new(paths::hooks_dir()?);
    let data_dir = paths::extensions_data_dir()?;
    Ok(ExtensionLifecycle::new(
        registry,
        hooks,
        Arc::new(GithubSource::new()?),
        data_dir,
    ))
}

async fn install(args: ExtensionInstallArgs) -> Result<()> {
    let mut lifecycle = lifecycle()?;
    let record = lifecycle.install(&args.repo, args.force).await?;
    output::success(&format!(
        "Installed {} {} from {}",
        args.repo, record.version, record.repository
    ));
    output::kv("binary", &record.path.display().to_string());
    Ok(())
}

async fn remove(args: ExtensionRemoveArgs) -> Result<()> {
    let mut lifecycle = lifecycle()?;
    lifecycle.uninstall(&args.name).await?;
    output::success(&format!("Removed extension '{}'", args.name));
    Ok(())
}

async fn run_extension(args: ExtensionRunArgs) -> Result<()> {
    let config = ExecutionConfig::from_env(&args.name)?;
    let mut lifecycle = lifecycle()?;
    let outcome = lifecycle.run(&args.name, &args.args, &config).await?;
    if !outcome.is_success() {
        // Pass the child's exit code through; signal terminations map to 1
        std::process::exit(outcome.exit_code.max(1));
    }
    Ok(())
}

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "VERSION")]
    version: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
    #[tabled(rename = "INSTALLED")]
    installed: String,
}

fn list(args: ExtensionListArgs) -> Result<()> {
    let lifecycle = lifecycle()?;
    let installed = lifecycle.registry().list();

    if args.json {
        let map: std::collections::BTreeMap<&str, _> = installed.into_iter().collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if installed.is_empty() {
        output::info("No extensions installed");
        return Ok(());
    }

    let rows: Vec<ExtensionRow> = installed
        .into_iter()
        .map(|(name, record)| ExtensionRow {
            name: name.to_string(),
            version: record.version.clone(),
            repository: record.repository.clone(),
            installed: record.installed_at.format("%Y-%m-%d").to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn verify(args: ExtensionVerifyArgs) -> Result<()> {
    let lifecycle = lifecycle()?;
    let orphans = lifecycle.verify()?;

    if args.json {
        let entries: Vec<serde_json::Value> = orphans
            .iter()
            .map(|orphan| match orphan {
                Orphan::MissingBinary { name, path } => serde_json::json!({
                    "kind": "missing-binary",
                    "name": name,
                    "path": path,
                }),
                Orphan::UntrackedBinary { name, path } => serde_json::json!({
                    "kind": "untracked-binary",
                    "name": name,
                    "path": path,
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if orphans.is_empty() {
        output::success("All installed extensions check out");
        return Ok(());
    }

    for orphan in &orphans {
        match orphan {
            Orphan::MissingBinary { name, path } => output::warning(&format!(
                "'{}' is registered but its binary is missing: {}",
                name,
                path.display()
            )),
            Orphan::UntrackedBinary { name, path } => output::warning(&format!(
                "'{}' has a binary on disk but no registry entry: {}",
                name,
                path.display()
            )),
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::hook;

    #[test]
    fn test_lifecycle_dispatches_from_the_managed_hook_directory() {
        let dispatched = lifecycle().unwrap().hooks().hook_dir().to_path_buf();
        let managed = hook::manager().unwrap().hook_dir().to_path_buf();
        assert_eq!(dispatched, managed);
        assert_eq!(dispatched, paths::hooks_dir().unwrap());
    }
}
