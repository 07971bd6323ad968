//! Plugin management for tykctl
//!
//! This crate handles:
//! - The `tykctl-<extension>-<name>` naming convention
//! - Plugin discovery across ordered search paths
//! - Subprocess execution under timeout control with environment injection
//! - Dispatcher/wrapper script synthesis for multi-binary plugin bundles
//! - Plugin install/remove/scaffold management

pub mod discovery;
pub mod executor;
pub mod manager;
pub mod naming;
pub mod platform;
pub mod wrapper;

pub use discovery::discover_plugins;
pub use executor::PluginExecutor;
pub use manager::PluginManager;
pub use platform::Platform;
pub use wrapper::WrapperScriptGenerator;
