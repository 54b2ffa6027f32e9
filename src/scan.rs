//! Directory scanning and manifest generation.
//!
//! Lists the regular files directly inside a root directory, drops the
//! configured exclusions, and turns each remaining file into a
//! [`FileRecord`]. The result is written as pretty-printed JSON.
//!
//! ## Rules
//!
//! - Only the root level is read; subdirectories are skipped, never descended.
//! - Symlinks are followed: a link to a file is listed, a link to a directory
//!   is skipped like any other directory.
//! - Exclusion is an exact, case-sensitive name match (see
//!   [`SiteConfig::is_excluded`]).
//! - Records keep filesystem enumeration order.
//!
//! ## Writes
//!
//! [`write_manifest`] serializes into a temp file in the destination
//! directory and renames it over the target, so an interrupted run leaves
//! either the previous manifest or the new one, never a truncated file.

use crate::config::SiteConfig;
use crate::format::{display_offset, format_display_date, format_file_size};
use crate::naming::file_type_of;
use crate::types::FileRecord;
use chrono::{DateTime, SubsecRound, Utc};
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// What a scan kept and what it skipped, for CLI reporting.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<FileRecord>,
    /// Regular files dropped by the exclusion list.
    pub excluded: Vec<String>,
    /// Directories (and links to directories) skipped at the root level.
    pub skipped_dirs: Vec<String>,
}

/// Scan `root` and build one record per retained file.
pub fn scan(root: &Path, config: &SiteConfig) -> Result<ScanReport, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let offset = display_offset(config.utc_offset_hours);
    let mut report = ScanReport::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            debug!("skipping directory {name}");
            report.skipped_dirs.push(name);
            continue;
        }
        if !file_type.is_file() {
            debug!("skipping non-regular entry {name}");
            continue;
        }
        if config.is_excluded(&name) {
            debug!("excluding {name}");
            report.excluded.push(name);
            continue;
        }

        let metadata = entry.metadata().map_err(|source| ScanError::Walk {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        let modified = modified.trunc_subsecs(0);

        debug!("indexing {name} ({} bytes)", metadata.len());
        report
            .records
            .push(build_record(name, metadata.len(), modified, config, offset));
    }

    Ok(report)
}

/// Assemble a record from the raw facts about one file.
pub fn build_record(
    name: String,
    size: u64,
    modified: DateTime<Utc>,
    config: &SiteConfig,
    offset: chrono::FixedOffset,
) -> FileRecord {
    let (display_size, size_in_bytes) = if config.readable_size {
        (Some(format_file_size(size)), None)
    } else {
        (None, Some(size))
    };

    FileRecord {
        path: name.clone(),
        download_url: config.hosting.download_url(&name),
        file_type: file_type_of(&name),
        size,
        display_size,
        size_in_bytes,
        last_modified: modified,
        display_modified: format_display_date(&modified, offset),
        name,
    }
}

/// Serialize records as pretty JSON and atomically replace `path`.
pub fn write_manifest(path: &Path, records: &[FileRecord]) -> Result<(), ScanError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut tmp, records)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;

    // Dropping `tmp` on any earlier `?` removes the temp file.
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Scan `root` and write the manifest to `root/<output_file>`.
pub fn generate(root: &Path, config: &SiteConfig) -> Result<ScanReport, ScanError> {
    let report = scan(root, config)?;
    write_manifest(&root.join(&config.output_file), &report.records)?;
    Ok(report)
}
