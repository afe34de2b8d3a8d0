//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format a byte count in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a list of names on one line, or a placeholder when it is empty
pub fn format_list<S: AsRef<str>>(names: &[S]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
