//! File-system naming convention
//!
//! Plugin binaries are named `tykctl-<extension>-<name>`; extension binaries
//! are named `tykctl-<name>`. These pure functions are the single place the
//! contract lives; discovery and installation both go through them.

/// Prefix shared by every tykctl-managed binary
pub const BINARY_PREFIX: &str = "tykctl-";

/// Executable file name for a plugin: `tykctl-<extension>-<name>`
pub fn plugin_binary_name(extension: &str, plugin: &str) -> String {
    format!("{BINARY_PREFIX}{extension}-{plugin}")
}

/// Executable file name for an extension: `tykctl-<name>`
pub fn extension_binary_name(name: &str) -> String {
    format!("{BINARY_PREFIX}{name}")
}

/// Inverse of [`plugin_binary_name`]: strip the `tykctl-<extension>-` prefix
///
/// Returns None when the file name does not belong to the extension. The
/// empty suffix is also rejected: `tykctl-widgets-` names no plugin.
pub fn plugin_name_from_file<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    let prefix = format!("{BINARY_PREFIX}{extension}-");
    match file_name.strip_prefix(prefix.as_str()) {
        Some("") => None,
        other => other,
    }
}
