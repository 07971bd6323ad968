//! Lifecycle integration tests
//!
//! Install/uninstall/run against a fake release source and a temporary
//! directory layout, covering hook gating on each operation:
//! - a failing before-hook aborts before any effect
//! - a failing after-hook never reverts a completed effect
//! - registry contents after install/uninstall
//! - exit-code pass-through when running an installed extension

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tykctl_core::{Error, ExecutionConfig, Result};
use tykctl_extensions::{
    ExtensionLifecycle, ExtensionSource, InstalledRegistry, Orphan, ResolvedExtension,
};
use tykctl_hooks::{BuiltinHook, HookData, HookEvent, HookManager};

/// Serves a fixed release without touching the network
struct FakeSource {
    version: String,
    body: Vec<u8>,
}

impl FakeSource {
    fn widgets() -> Arc<Self> {
        Arc::new(Self {
            version: "1.0.0".to_string(),
            body: b"#!/bin/sh\nexit 0\n".to_vec(),
        })
    }

    fn with_body(body: &str) -> Arc<Self> {
        Arc::new(Self {
            version: "1.0.0".to_string(),
            body: body.as_bytes().to_vec(),
        })
    }
}

#[async_trait]
impl ExtensionSource for FakeSource {
    async fn resolve(&self, repo: &str) -> Result<ResolvedExtension> {
        let name = repo.rsplit('/').next().unwrap_or(repo).to_string();
        Ok(ResolvedExtension {
            version: self.version.clone(),
            repository: format!("https://github.com/{repo}"),
            download_url: format!("fake://{repo}"),
            name,
        })
    }

    async fn fetch(&self, _resolved: &ResolvedExtension) -> Result<Vec<u8>> {
        Ok(self.body.clone())
    }
}

/// Counts firings; optionally fails every time
struct CountingHook {
    count: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl BuiltinHook for CountingHook {
    fn name(&self) -> &str {
        "counting"
    }

    async fn run(&self, _data: &mut HookData) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::hook_failed("test", "counting hook failure"));
        }
        Ok(())
    }
}

fn counting(count: &Arc<AtomicUsize>, fail: bool) -> Arc<dyn BuiltinHook> {
    Arc::new(CountingHook {
        count: Arc::clone(count),
        fail,
    })
}

struct Harness {
    _dir: TempDir,
    config_dir: std::path::PathBuf,
    data_dir: std::path::PathBuf,
    lifecycle: ExtensionLifecycle,
}

fn harness(source: Arc<dyn ExtensionSource>) -> Harness {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("cfg");
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&config_dir).unwrap();

    let registry = InstalledRegistry::open(&config_dir).unwrap();
    let hooks = HookManager::new(config_dir.join("hooks"));
    let lifecycle = ExtensionLifecycle::new(registry, hooks, source, &data_dir);

    Harness {
        _dir: dir,
        config_dir,
        data_dir,
        lifecycle,
    }
}

fn registry_yaml(config_dir: &Path) -> String {
    std::fs::read_to_string(config_dir.join("extensions.yaml")).unwrap()
}

#[tokio::test]
async fn test_install_writes_binary_then_registry_entry() {
    let mut h = harness(FakeSource::widgets());

    let record = h.lifecycle.install("acme/widgets", false).await.unwrap();
    assert_eq!(record.version, "1.0.0");
    assert_eq!(record.repository, "https://github.com/acme/widgets");

    // Binary stub at the canonical path
    let binary = h.data_dir.join("tykctl-widgets").join("tykctl-widgets");
    assert!(binary.exists());

    // Registry file keyed by extension name
    let yaml = registry_yaml(&h.config_dir);
    assert!(yaml.contains("widgets:"));
    assert!(yaml.contains("version: 1.0.0"));
    assert!(yaml.contains("repository: https://github.com/acme/widgets"));
}

#[tokio::test]
async fn test_install_conflict_without_force() {
    let mut h = harness(FakeSource::widgets());
    h.lifecycle.install("acme/widgets", false).await.unwrap();

    let err = h.lifecycle.install("acme/widgets", false).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));

    // Force overwrites in place
    h.lifecycle.install("acme/widgets", true).await.unwrap();
    assert_eq!(h.lifecycle.registry().count(), 1);
}

#[tokio::test]
async fn test_failing_before_install_hook_aborts_with_no_effect() {
    let mut h = harness(FakeSource::widgets());
    let count = Arc::new(AtomicUsize::new(0));
    h.lifecycle.hooks_mut().register(
        HookEvent::new(HookEvent::BEFORE_INSTALL),
        counting(&count, true),
    );

    let err = h.lifecycle.install("acme/widgets", false).await.unwrap_err();
    assert!(matches!(err, Error::HookFailed { .. }));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Aborted before the effect phase: no binary, no registry file
    assert!(!h.data_dir.join("tykctl-widgets").exists());
    assert!(!h.config_dir.join("extensions.yaml").exists());
    assert!(!h.lifecycle.registry().is_installed("widgets"));
}

#[tokio::test]
async fn test_failing_after_install_hook_keeps_the_effect() {
    let mut h = harness(FakeSource::widgets());
    let count = Arc::new(AtomicUsize::new(0));
    h.lifecycle.hooks_mut().register(
        HookEvent::new(HookEvent::AFTER_INSTALL),
        counting(&count, true),
    );

    // The install itself succeeds; the after-hook error is only logged
    let record = h.lifecycle.install("acme/widgets", false).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(record.path.exists());
    assert!(h.lifecycle.registry().is_installed("widgets"));
}

#[tokio::test]
async fn test_uninstall_removes_binary_and_registry_entry() {
    let mut h = harness(FakeSource::widgets());
    h.lifecycle.install("acme/widgets", false).await.unwrap();

    h.lifecycle.uninstall("widgets").await.unwrap();
    assert!(!h.data_dir.join("tykctl-widgets").exists());
    assert!(!h.lifecycle.registry().is_installed("widgets"));

    let err = h.lifecycle.uninstall("widgets").await.unwrap_err();
    assert!(matches!(err, Error::NotInstalled { .. }));
}

#[tokio::test]
async fn test_failing_before_uninstall_hook_preserves_the_install() {
    let mut h = harness(FakeSource::widgets());
    h.lifecycle.install("acme/widgets", false).await.unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    h.lifecycle.hooks_mut().register(
        HookEvent::new(HookEvent::BEFORE_UNINSTALL),
        counting(&count, true),
    );

    let err = h.lifecycle.uninstall("widgets").await.unwrap_err();
    assert!(matches!(err, Error::HookFailed { .. }));
    assert!(h.lifecycle.registry().is_installed("widgets"));
    assert!(h.data_dir.join("tykctl-widgets").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_passes_through_the_exit_code() {
    let mut h = harness(FakeSource::with_body("#!/bin/sh\nexit 4\n"));
    h.lifecycle.install("acme/widgets", false).await.unwrap();

    let config = ExecutionConfig::new("widgets")
        .unwrap()
        .with_plugin_dir(h.data_dir.join("tykctl-widgets"))
        .with_config_dir(h.config_dir.clone());
    let outcome = h.lifecycle.run("widgets", &[], &config).await.unwrap();
    assert_eq!(outcome.exit_code, 4);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_before_run_hook_prevents_execution() {
    let witness_dir = TempDir::new().unwrap();
    let witness = witness_dir.path().join("ran");
    let mut h = harness(FakeSource::with_body(&format!(
        "#!/bin/sh\ntouch {}\n",
        witness.display()
    )));
    h.lifecycle.install("acme/widgets", false).await.unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    h.lifecycle.hooks_mut().register(
        HookEvent::new(HookEvent::BEFORE_RUN),
        counting(&count, true),
    );

    let config = ExecutionConfig::new("widgets")
        .unwrap()
        .with_plugin_dir(h.data_dir.join("tykctl-widgets"))
        .with_config_dir(h.config_dir.clone());
    let err = h.lifecycle.run("widgets", &[], &config).await.unwrap_err();
    assert!(matches!(err, Error::HookFailed { .. }));
    assert!(!witness.exists());
}

#[tokio::test]
async fn test_run_unknown_extension_is_not_installed() {
    let mut h = harness(FakeSource::widgets());
    let config = ExecutionConfig::new("ghost")
        .unwrap()
        .with_config_dir(h.config_dir.clone());
    let err = h.lifecycle.run("ghost", &[], &config).await.unwrap_err();
    assert!(matches!(err, Error::NotInstalled { .. }));
}

#[tokio::test]
async fn test_verify_reports_orphans_in_both_directions() {
    let mut h = harness(FakeSource::widgets());
    h.lifecycle.install("acme/widgets", false).await.unwrap();

    // A binary directory nothing in the registry claims
    std::fs::create_dir_all(h.data_dir.join("tykctl-stray")).unwrap();
    // A registry entry whose binary is gone
    std::fs::remove_file(h.data_dir.join("tykctl-widgets").join("tykctl-widgets")).unwrap();

    let orphans = h.lifecycle.verify().unwrap();
    assert!(orphans
        .iter()
        .any(|o| matches!(o, Orphan::MissingBinary { name, .. } if name == "widgets")));
    assert!(orphans
        .iter()
        .any(|o| matches!(o, Orphan::UntrackedBinary { name, .. } if name == "stray")));
}

#[tokio::test]
async fn test_external_before_hook_gates_install() {
    let mut h = harness(FakeSource::widgets());
    h.lifecycle
        .hooks_mut()
        .create_external("before-install", "#!/bin/sh\nexit 1\n")
        .unwrap();

    let err = h.lifecycle.install("acme/widgets", false).await.unwrap_err();
    assert!(matches!(err, Error::HookFailed { .. }));
    assert!(!h.lifecycle.registry().is_installed("widgets"));
}
