//! Hook registration and dispatch
//!
//! One firing walks a single ordered list of hook sources: every builtin
//! registered for the event, in registration order, followed by the enabled
//! external scripts matching the event, sorted by file name. The first error
//! stops the firing and is returned as-is; whether that aborts the caller's
//! operation (before hooks) or is merely logged (after hooks) is the
//! orchestrator's policy, not the engine's.

use crate::event::{HookData, HookEvent};
use crate::external::{self, ExternalHook};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tykctl_core::Result;

/// An in-process hook callback
#[async_trait]
pub trait BuiltinHook: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Runs with the shared payload of the current firing; mutations are
    /// visible to the hooks that come after this one.
    async fn run(&self, data: &mut HookData) -> Result<()>;
}

/// One entry in the dispatch list of a firing
enum HookSource {
    InProcess(Arc<dyn BuiltinHook>),
    External(ExternalHook),
}

/// Maintains hook registrations over one hook directory and dispatches events
///
/// Not synchronized: callers run one firing at a time per instance.
pub struct HookManager {
    hook_dir: PathBuf,
    builtins: HashMap<String, Vec<Arc<dyn BuiltinHook>>>,
}

impl HookManager {
    pub fn new(hook_dir: impl Into<PathBuf>) -> Self {
        Self {
            hook_dir: hook_dir.into(),
            builtins: HashMap::new(),
        }
    }

    /// Directory scanned for external hook scripts
    pub fn hook_dir(&self) -> &Path {
        &self.hook_dir
    }

    /// Register a builtin hook for an event; registration order is execution
    /// order within the event.
    pub fn register(&mut self, event: HookEvent, hook: Arc<dyn BuiltinHook>) {
        self.builtins
            .entry(event.tag().to_string())
            .or_default()
            .push(hook);
    }

    /// Fire an event: builtins first, then external scripts, fail-fast
    pub async fn execute(&self, event: &HookEvent, data: &mut HookData) -> Result<()> {
        for source in self.sources_for(event)? {
            match source {
                HookSource::InProcess(hook) => {
                    debug!("Running builtin hook '{}' for event {}", hook.name(), event);
                    hook.run(data).await?;
                }
                HookSource::External(hook) => {
                    hook.run(event, data).await?;
                }
            }
        }
        Ok(())
    }

    /// The ordered dispatch list for one firing
    fn sources_for(&self, event: &HookEvent) -> Result<Vec<HookSource>> {
        let mut sources: Vec<HookSource> = self
            .builtins
            .get(event.tag())
            .into_iter()
            .flatten()
            .cloned()
            .map(HookSource::InProcess)
            .collect();
        sources.extend(
            external::hooks_for_event(&self.hook_dir, event)?
                .into_iter()
                .map(HookSource::External),
        );
        Ok(sources)
    }

    /// Write an executable external hook script
    pub fn create_external(&self, name: &str, body: &str) -> Result<PathBuf> {
        external::create_hook(&self.hook_dir, name, body)
    }

    /// Re-enable an external hook
    pub fn enable_external(&self, name: &str) -> Result<()> {
        external::enable_hook(&self.hook_dir, name)
    }

    /// Gate an external hook off without deleting its file
    pub fn disable_external(&self, name: &str) -> Result<()> {
        external::disable_hook(&self.hook_dir, name)
    }

    /// Delete an external hook file
    pub fn delete_external(&self, name: &str) -> Result<()> {
        external::delete_hook(&self.hook_dir, name)
    }

    /// All external hooks, sorted by name
    pub fn list_external(&self) -> Result<Vec<ExternalHook>> {
        external::list_hooks(&self.hook_dir)
    }

    /// Number of external hook files
    pub fn count_external(&self) -> Result<usize> {
        Ok(self.list_external()?.len())
    }

    /// Number of registered builtin hooks across all events
    pub fn count_builtin(&self) -> usize {
        self.builtins.values().map(Vec::len).sum()
    }
}
