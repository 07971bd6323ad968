//! Lifecycle hook dispatch for tykctl
//!
//! Two kinds of hooks attach to lifecycle events: in-process builtin
//! callbacks and external executable scripts discovered in a hook directory.
//! Dispatch runs both through one ordered list per firing: builtins in
//! registration order, then enabled external scripts sorted by file name.

pub mod event;
pub mod external;
pub mod manager;

pub use event::{HookData, HookEvent};
pub use external::ExternalHook;
pub use manager::{BuiltinHook, HookManager};
