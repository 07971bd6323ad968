//! Hook events and the per-firing payload

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// A lifecycle point hooks can attach to
///
/// Identity is the string tag; extensions may define their own tags beyond
/// the six standard ones. Ordering between events is caller-driven.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookEvent(String);

impl HookEvent {
    pub const BEFORE_INSTALL: &'static str = "before-install";
    pub const AFTER_INSTALL: &'static str = "after-install";
    pub const BEFORE_UNINSTALL: &'static str = "before-uninstall";
    pub const AFTER_UNINSTALL: &'static str = "after-uninstall";
    pub const BEFORE_RUN: &'static str = "before-run";
    pub const AFTER_RUN: &'static str = "after-run";

    /// Event with an arbitrary tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// `before-<op>` event for an operation
    pub fn before(op: &str) -> Self {
        Self(format!("before-{op}"))
    }

    /// `after-<op>` event for an operation
    pub fn after(op: &str) -> Self {
        Self(format!("after-{op}"))
    }

    /// The string tag
    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Whether this event runs ahead of its operation's effect phase
    pub fn is_before(&self) -> bool {
        self.0.starts_with("before-")
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload passed to every hook of one event firing
///
/// Constructed fresh per firing and threaded mutably through the hooks, so a
/// metadata change made by one hook is visible to the hooks after it.
#[derive(Debug, Clone)]
pub struct HookData {
    /// Extension the operation targets
    pub extension_name: String,

    /// Path of the extension's binary or install directory
    pub extension_path: PathBuf,

    /// Free-form values shared between hooks of one firing
    pub metadata: HashMap<String, serde_json::Value>,
}

impl HookData {
    pub fn new(extension_name: impl Into<String>, extension_path: impl Into<PathBuf>) -> Self {
        Self {
            extension_name: extension_name.into(),
            extension_path: extension_path.into(),
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_after_constructors() {
        assert_eq!(HookEvent::before("install").tag(), HookEvent::BEFORE_INSTALL);
        assert_eq!(HookEvent::after("uninstall").tag(), HookEvent::AFTER_UNINSTALL);
    }

    #[test]
    fn test_is_before() {
        assert!(HookEvent::new(HookEvent::BEFORE_RUN).is_before());
        assert!(!HookEvent::new(HookEvent::AFTER_INSTALL).is_before());
        assert!(!HookEvent::new("custom-event").is_before());
    }

    #[test]
    fn test_custom_tags_are_allowed() {
        let event = HookEvent::new("widgets-sync");
        assert_eq!(event.tag(), "widgets-sync");
    }
}
