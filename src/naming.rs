//! Centralized file name parsing.
//!
//! The manifest's `file_type` and the renderer's icon lookup both derive from
//! the same rule: the extension is whatever follows the final `.`, lowercased.
//!
//! ## Edge cases
//!
//! - `"archive.tar.gz"` → `"gz"` (final dot only)
//! - `"README"` → no extension → `"file"`
//! - `"notes."` → trailing dot, empty extension → `"file"`
//! - `".gitignore"` → `"gitignore"` (a leading dot still splits)

/// Literal `file_type` for names without an extension.
pub const NO_EXTENSION_TYPE: &str = "file";

/// Result of splitting a file name into stem and extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Everything before the final dot (the whole name if there is none).
    pub stem: String,
    /// Lowercased text after the final dot, `None` when absent or empty.
    pub extension: Option<String>,
}

impl ParsedName {
    /// The manifest `file_type`: the extension, or `"file"`.
    pub fn file_type(&self) -> &str {
        self.extension.as_deref().unwrap_or(NO_EXTENSION_TYPE)
    }
}

/// Split a file name on its final dot.
pub fn parse_file_name(name: &str) -> ParsedName {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => ParsedName {
            stem: stem.to_string(),
            extension: Some(ext.to_lowercase()),
        },
        Some((stem, _)) => ParsedName {
            stem: stem.to_string(),
            extension: None,
        },
        None => ParsedName {
            stem: name.to_string(),
            extension: None,
        },
    }
}

/// Shorthand for `parse_file_name(name).file_type()`.
pub fn file_type_of(name: &str) -> String {
    parse_file_name(name).file_type().to_string()
}
