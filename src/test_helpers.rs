//! Shared test utilities for the file-index test suite.
//!
//! Builds throwaway site directories and in-memory listings, and provides
//! lookups that panic with the available names on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_site(&[("a.txt", "hello"), ("b.pdf", "...")]);
//! let report = scan(tmp.path(), &SiteConfig::default()).unwrap();
//! let record = find_record(&report.records, "a.txt");
//!
//! let entries = entries(&[("a.txt", 500, "2024-01-01T00:00:00Z")]);
//! assert_eq!(entry_names(&entries), vec!["a.txt"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::listing::{Entry, parse_manifest};
use crate::types::FileRecord;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding the given `(name, contents)` files.
pub fn setup_site(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_files(tmp.path(), files);
    tmp
}

pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).unwrap();
    }
}

/// Build normalized entries from `(name, size, lastModified)` triples by
/// going through the real manifest parser.
pub fn entries(specs: &[(&str, u64, &str)]) -> Vec<Entry> {
    let json: Vec<serde_json::Value> = specs
        .iter()
        .map(|(name, size, modified)| {
            serde_json::json!({
                "name": name,
                "size": size,
                "lastModified": modified,
                "file_type": crate::naming::file_type_of(name),
                "download_url": format!("https://raw.example.com/u/r/main/{name}"),
            })
        })
        .collect();
    parse_manifest(&serde_json::Value::Array(json).to_string()).unwrap()
}

// =========================================================================
// Lookups (panic with the available names on a miss)
// =========================================================================

/// Find a manifest record by name. Panics if not found.
pub fn find_record<'a>(records: &'a [FileRecord], name: &str) -> &'a FileRecord {
    records.iter().find(|r| r.name == name).unwrap_or_else(|| {
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        panic!("record '{name}' not found. Available: {names:?}")
    })
}

/// Entry names in order.
pub fn entry_names<'a, I>(entries: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a Entry>,
{
    entries.into_iter().map(|e| e.name.as_str()).collect()
}
