//! The manifest wire format shared by the generator and the renderer.
//!
//! The manifest is a top-level JSON array of [`FileRecord`]. The generator
//! writes it with these exact field names; the renderer never deserializes
//! into this type directly (it reads untrusted JSON field by field, see
//! [`crate::listing::parse_manifest`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry per retained file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File name, no directory part.
    pub name: String,
    /// Same as `name`; the listing is flat.
    pub path: String,
    /// Raw size in bytes. Always written, regardless of `readable_size`.
    pub size: u64,
    /// Human-readable size ("1.5 KB"), only with `readable_size = true`.
    #[serde(rename = "tamanho", default, skip_serializing_if = "Option::is_none")]
    pub display_size: Option<String>,
    /// Raw size repeated under its own key, only with `readable_size = false`.
    #[serde(
        rename = "sizeInBytes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub size_in_bytes: Option<u64>,
    /// Modification time; the authoritative timestamp.
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
    /// Localized rendering of `last_modified`. Display only, never reparsed.
    #[serde(rename = "ultimaModificacao")]
    pub display_modified: String,
    pub download_url: String,
    /// Lowercase extension without the dot, or `"file"`.
    pub file_type: String,
}
