//! CLI output formatting for every subcommand.
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions are pure, so
//! tests assert on lines without capturing stdout. Diagnostics go through
//! `log` to stderr; these lines are the command's result.
//!
//! # Output Format
//!
//! ## Generate / Check
//!
//! ```text
//! Files
//! 001 channels.m3u
//!     Size: 1.5 KB
//!     Type: m3u
//!     Modified: 01/06/2024, 09:00:00
//!
//! Excluded
//!     README.md
//!
//! Skipped directories
//!     archive/
//!
//! Wrote 1 file → files.json
//! ```
//!
//! ## Render
//!
//! ```text
//! 001 index.html
//! 002 page-2.html
//!
//! Rendered 30 of 42 files on 2 pages → site/
//! ```
//!
//! ## Fetch
//!
//! ```text
//! a.m3u: attempt 1/3
//! a.m3u: saved 2.49 KB (sha256 6b86b2…)
//!
//! Fetched 1 of 2 sources, 1 failed
//!     b.m3u: HTTP status 404
//! ```

use crate::fetch::{FetchEvent, FetchSummary};
use crate::format::format_file_size;
use crate::render::RenderReport;
use crate::scan::ScanReport;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Abbreviate a hex digest for display.
fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

// ============================================================================
// Generate / Check
// ============================================================================

/// Lines describing a scan: retained files, then what was left out.
pub fn format_scan_output(report: &ScanReport) -> Vec<String> {
    let mut lines = vec!["Files".to_string()];

    if report.records.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, record) in report.records.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), record.name));
        lines.push(format!("{}Size: {}", indent(1), format_file_size(record.size)));
        lines.push(format!("{}Type: {}", indent(1), record.file_type));
        lines.push(format!("{}Modified: {}", indent(1), record.display_modified));
    }

    if !report.excluded.is_empty() {
        lines.push(String::new());
        lines.push("Excluded".to_string());
        for name in &report.excluded {
            lines.push(format!("{}{}", indent(1), name));
        }
    }

    if !report.skipped_dirs.is_empty() {
        lines.push(String::new());
        lines.push("Skipped directories".to_string());
        for name in &report.skipped_dirs {
            lines.push(format!("{}{}/", indent(1), name));
        }
    }

    lines
}

pub fn print_scan_output(report: &ScanReport) {
    for line in format_scan_output(report) {
        println!("{}", line);
    }
}

/// Scan lines followed by where the manifest went.
pub fn format_generate_output(report: &ScanReport, manifest_path: &Path) -> Vec<String> {
    let mut lines = format_scan_output(report);
    lines.push(String::new());
    lines.push(format!(
        "Wrote {} → {}",
        plural(report.records.len(), "file", "files"),
        manifest_path.display()
    ));
    lines
}

pub fn print_generate_output(report: &ScanReport, manifest_path: &Path) {
    for line in format_generate_output(report, manifest_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_render_output(report: &RenderReport, output_dir: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| format!("{} {}", format_index(i + 1), page))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Rendered {} of {} on {} → {}/",
        report.matched,
        plural(report.stats.total_files, "file", "files"),
        plural(report.pages.len(), "page", "pages"),
        output_dir.display()
    ));
    lines
}

pub fn print_render_output(report: &RenderReport, output_dir: &Path) {
    for line in format_render_output(report, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Fetch
// ============================================================================

/// One progress event as display lines.
pub fn format_fetch_event(event: &FetchEvent) -> Vec<String> {
    match event {
        FetchEvent::Attempt {
            name,
            attempt,
            retries,
        } => vec![format!("{name}: attempt {attempt}/{retries}")],
        FetchEvent::AttemptFailed {
            name,
            attempt,
            error,
        } => vec![format!("{name}: attempt {attempt} failed: {error}")],
        FetchEvent::Saved {
            name,
            bytes,
            sha256,
        } => vec![format!(
            "{name}: saved {} (sha256 {}…)",
            format_file_size(*bytes),
            short_digest(sha256)
        )],
        FetchEvent::GaveUp { name, error } => vec![format!("{name}: gave up: {error}")],
    }
}

pub fn format_fetch_summary(summary: &FetchSummary) -> Vec<String> {
    let total = summary.saved.len() + summary.failed.len();
    let mut lines = vec![String::new()];
    if summary.failed.is_empty() {
        lines.push(format!(
            "Fetched {}",
            plural(total, "source", "sources")
        ));
    } else {
        lines.push(format!(
            "Fetched {} of {}, {} failed",
            summary.saved.len(),
            plural(total, "source", "sources"),
            summary.failed.len()
        ));
        for (name, error) in &summary.failed {
            lines.push(format!("{}{}: {}", indent(1), name, error));
        }
    }
    lines
}

pub fn print_fetch_summary(summary: &FetchSummary) {
    for line in format_fetch_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::fetch::Saved;
    use crate::listing::Stats;
    use crate::scan::build_record;
    use chrono::{TimeZone, Utc};

    fn report() -> ScanReport {
        let config = SiteConfig::default();
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let offset = crate::format::display_offset(config.utc_offset_hours);
        ScanReport {
            records: vec![
                build_record("a.m3u".into(), 1536, when, &config, offset),
                build_record("notes".into(), 0, when, &config, offset),
            ],
            excluded: vec!["README.md".into()],
            skipped_dirs: vec!["archive".into()],
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file", "files"), "1 file");
        assert_eq!(plural(0, "file", "files"), "0 files");
    }

    #[test]
    fn short_digest_handles_short_input() {
        assert_eq!(short_digest("abc"), "abc");
        assert_eq!(short_digest(&"f".repeat(64)), "f".repeat(12));
    }

    // =========================================================================
    // Generate / Check
    // =========================================================================

    #[test]
    fn scan_output_lists_files_then_skips() {
        let lines = format_scan_output(&report());
        assert_eq!(lines[0], "Files");
        assert_eq!(lines[1], "001 a.m3u");
        assert_eq!(lines[2], "    Size: 1.5 KB");
        assert_eq!(lines[3], "    Type: m3u");
        assert_eq!(lines[4], "    Modified: 01/06/2024, 09:00:00");
        assert_eq!(lines[5], "002 notes");
        assert_eq!(lines[7], "    Type: file");
        assert!(lines.contains(&"Excluded".to_string()));
        assert!(lines.contains(&"    README.md".to_string()));
        assert!(lines.contains(&"    archive/".to_string()));
    }

    #[test]
    fn scan_output_empty() {
        let lines = format_scan_output(&ScanReport::default());
        assert_eq!(lines, vec!["Files", "    (none)"]);
    }

    #[test]
    fn generate_output_ends_with_destination() {
        let lines = format_generate_output(&report(), Path::new("site/files.json"));
        assert_eq!(lines.last().unwrap(), "Wrote 2 files → site/files.json");
    }

    // =========================================================================
    // Render
    // =========================================================================

    #[test]
    fn render_output_lists_pages() {
        let report = RenderReport {
            pages: vec!["index.html".into(), "page-2.html".into()],
            matched: 30,
            stats: Stats {
                total_files: 42,
                total_size: 0,
                last_update: None,
                generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        };
        let lines = format_render_output(&report, Path::new("out"));
        assert_eq!(lines[0], "001 index.html");
        assert_eq!(lines[1], "002 page-2.html");
        assert_eq!(lines[3], "Rendered 30 of 42 files on 2 pages → out/");
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    #[test]
    fn fetch_events() {
        let attempt = FetchEvent::Attempt {
            name: "a.m3u".into(),
            attempt: 1,
            retries: 3,
        };
        assert_eq!(format_fetch_event(&attempt), vec!["a.m3u: attempt 1/3"]);

        let saved = FetchEvent::Saved {
            name: "a.m3u".into(),
            bytes: 2548,
            sha256: "0123456789abcdef".into(),
        };
        assert_eq!(
            format_fetch_event(&saved),
            vec!["a.m3u: saved 2.49 KB (sha256 0123456789ab…)"]
        );
    }

    #[test]
    fn fetch_summary_all_ok() {
        let summary = FetchSummary {
            saved: vec![(
                "a.m3u".into(),
                Saved {
                    bytes: 1,
                    sha256: "x".into(),
                },
            )],
            failed: vec![],
        };
        assert_eq!(format_fetch_summary(&summary)[1], "Fetched 1 source");
    }

    #[test]
    fn fetch_summary_lists_failures() {
        let summary = FetchSummary {
            saved: vec![],
            failed: vec![("b.m3u".into(), "HTTP status 404".into())],
        };
        let lines = format_fetch_summary(&summary);
        assert_eq!(lines[1], "Fetched 0 of 1 source, 1 failed");
        assert_eq!(lines[2], "    b.m3u: HTTP status 404");
    }
}
