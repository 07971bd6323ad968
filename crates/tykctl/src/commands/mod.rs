//! Command implementations

pub mod extension;
pub mod hook;
pub mod plugin;
