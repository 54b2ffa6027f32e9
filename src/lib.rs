//! # File Index
//!
//! Publishes a flat directory of files as a browsable list. Two halves share
//! one JSON file and nothing else:
//!
//! ```text
//! 1. Generate   root/      →  files.json     (directory → manifest)
//! 2. Render     manifest   →  site/*.html    (manifest → file list pages)
//! ```
//!
//! The generator runs at publish time; the renderer can read the manifest
//! from disk or from its published URL. A third, optional step refreshes the
//! indexed files themselves from remote sources before generating.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Generator: lists root files, applies exclusions, writes the manifest atomically |
//! | [`types`] | [`FileRecord`](types::FileRecord), the manifest's on-disk record shape |
//! | [`naming`] | File name → extension / `file_type` |
//! | [`format`] | Human-readable sizes and display dates, shared by both halves |
//! | [`listing`] | Renderer core: load + normalize, search, stable sort, pagination, stats, reducer |
//! | [`theme`] | Light/dark/system preference with persistence and system tracking |
//! | [`render`] | Maud HTML for list pages, their embedded list data, and the load-failure page |
//! | [`fetch`] | Parallel download of remote sources with retries |
//! | [`config`] | `config.toml` loading over stock defaults, validation, color CSS |
//! | [`logging`] | Stderr logger for the `log` facade |
//! | [`output`] | CLI result formatting, pure `format_*` plus `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## The Manifest Is the Contract
//!
//! `size` is always a number and `lastModified` is always RFC 3339. The
//! localized strings (`tamanho`, `ultimaModificacao`) are extra fields for
//! readers that want them; the renderer never parses them back. The
//! `readable_size = false` switch swaps `tamanho` for `sizeInBytes` but never
//! touches `size`.
//!
//! ## Pure View Core
//!
//! The list view is a function of the entries and a [`ViewState`](listing::ViewState).
//! User interactions are [`ViewEvent`](listing::ViewEvent)s folded by
//! [`listing::reduce`]. No global state, so every search, sort, and
//! pagination case is a plain unit test.
//!
//! ## Untrusted Input, Normalized Once
//!
//! Manifest records are normalized on load into [`Entry`](listing::Entry)
//! with every fallback applied. Downstream code never deals with missing
//! fields.

pub mod config;
pub mod fetch;
pub mod format;
pub mod listing;
pub mod logging;
pub mod naming;
pub mod output;
pub mod render;
pub mod scan;
pub mod theme;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
