//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Every setting has a
//! stock default compiled into the binary; a `config.toml` placed in the root
//! directory overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_file = "files.json"   # Manifest written by `generate`
//! exclude = ["files.json", "index.html", "style.css", "script.js",
//!            "config.toml", "README.md", "LICENSE", ".gitignore", "playlists.log"]
//! readable_size = true         # Emit `tamanho` ("1.5 KB") instead of `sizeInBytes`
//! utc_offset_hours = -3        # Offset for the `ultimaModificacao` display field
//!
//! [hosting]
//! host = "githubusercontent.com"
//! account = "josieljefferson12"
//! repository = "playlists"
//! branch = "main"              # GITHUB_REF_NAME wins when set
//!
//! [viewer]
//! title = "Arquivos"
//! page_sizes = [10, 25, 50, 100]
//! default_page_size = 25
//! default_sort = "name"
//!
//! [colors.light]
//! background = "#f5f7fa"
//! # ...
//!
//! [fetch]
//! timeout_secs = 15
//! retries = 3
//! retry_delay_secs = 2
//! max_workers = 5
//!
//! # Replaces the stock source list; `sources = []` under [fetch] disables it.
//! [[fetch.sources]]
//! name = "playlist.m3u"
//! url = "https://example.com/playlist.m3u"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::listing::SortKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable holding the ref name CI builds from. When set and
/// non-empty it replaces `hosting.branch` in download URLs.
pub const BRANCH_ENV: &str = "GITHUB_REF_NAME";

/// Name of the optional config file in the root directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Manifest filename, relative to the root directory.
    pub output_file: String,
    /// Exact, case-sensitive file names never listed in the manifest.
    pub exclude: Vec<String>,
    /// When true each record carries `tamanho` ("1.5 KB"), otherwise
    /// `sizeInBytes`. The numeric `size` field is always present.
    pub readable_size: bool,
    /// Fixed UTC offset used to build the display-only timestamp.
    pub utc_offset_hours: i32,
    /// Where the raw file content is served from.
    pub hosting: HostingConfig,
    /// List renderer defaults.
    pub viewer: ViewerConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Remote sources refreshed by the `fetch` command.
    pub fetch: FetchConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_file: "files.json".to_string(),
            exclude: default_exclude(),
            readable_size: true,
            utc_offset_hours: -3,
            hosting: HostingConfig::default(),
            viewer: ViewerConfig::default(),
            colors: ColorConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    [
        "files.json",
        "index.html",
        "style.css",
        "script.js",
        "config.toml",
        "README.md",
        "LICENSE",
        ".gitignore",
        "playlists.log",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_file must not be empty".into(),
            ));
        }
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(ConfigError::Validation(
                "utc_offset_hours must be between -23 and 23".into(),
            ));
        }
        self.hosting.validate()?;
        self.viewer.validate()?;
        self.fetch.validate()?;
        Ok(())
    }

    /// Whether `name` is in the exclusion list (exact match, not a glob).
    ///
    /// The manifest's own filename is always excluded, even when a user
    /// config replaces the `exclude` list without repeating it.
    pub fn is_excluded(&self, name: &str) -> bool {
        name == self.output_file || self.exclude.iter().any(|e| e == name)
    }
}

/// Raw-content hosting coordinates used to build `download_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostingConfig {
    /// Raw-content domain without the `raw.` prefix.
    pub host: String,
    pub account: String,
    pub repository: String,
    pub branch: String,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            host: "githubusercontent.com".to_string(),
            account: "josieljefferson12".to_string(),
            repository: "playlists".to_string(),
            branch: "main".to_string(),
        }
    }
}

impl HostingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("hosting.host", &self.host),
            ("hosting.account", &self.account),
            ("hosting.repository", &self.repository),
            ("hosting.branch", &self.branch),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// Replace the branch with a CI-provided ref name. Empty values are ignored.
    pub fn apply_ref_override(&mut self, ref_name: Option<String>) {
        if let Some(name) = ref_name.filter(|n| !n.trim().is_empty()) {
            self.branch = name.trim().to_string();
        }
    }

    /// `https://raw.<host>/<account>/<repository>/<branch>/<name>`
    pub fn download_url(&self, name: &str) -> String {
        format!(
            "https://raw.{}/{}/{}/{}/{}",
            self.host, self.account, self.repository, self.branch, name
        )
    }
}

/// List renderer defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Page heading and document title.
    pub title: String,
    /// Choices offered by the items-per-page selector.
    pub page_sizes: Vec<usize>,
    /// Initial page size; must be one of `page_sizes`.
    pub default_page_size: usize,
    /// Initial sort order.
    pub default_sort: SortKey,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Arquivos".to_string(),
            page_sizes: vec![10, 25, 50, 100],
            default_page_size: 25,
            default_sort: SortKey::Name,
        }
    }
}

impl ViewerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_sizes.is_empty() || self.page_sizes.contains(&0) {
            return Err(ConfigError::Validation(
                "viewer.page_sizes must be non-empty and contain no zero".into(),
            ));
        }
        if !self.page_sizes.contains(&self.default_page_size) {
            return Err(ConfigError::Validation(format!(
                "viewer.default_page_size {} is not one of viewer.page_sizes",
                self.default_page_size
            )));
        }
        Ok(())
    }
}

/// Playlists and EPG guides refreshed by `fetch` when no `[[fetch.sources]]`
/// are configured, as `(file name, url)`.
pub const STOCK_SOURCES: [(&str, &str); 11] = [
    ("epgbrasil.m3u", "http://m3u4u.com/m3u/3wk1y24kx7uzdevxygz7"),
    ("epgbrasilportugal.m3u", "http://m3u4u.com/m3u/782dyqdrqkh1xegen4zp"),
    ("epgportugal.m3u", "http://m3u4u.com/m3u/jq2zy9epr3bwxmgwyxr5"),
    ("PiauiTV.m3u", "https://gitlab.com/josieljefferson12/playlists/-/raw/main/PiauiTV.m3u"),
    (
        "m3u@proton.me.m3u",
        "https://gitlab.com/josieljefferson12/playlists/-/raw/main/m3u4u_proton.me.m3u",
    ),
    ("playlist.m3u", "https://gitlab.com/josieljefferson12/playlists/-/raw/main/playlist.m3u"),
    ("playlists.m3u", "https://gitlab.com/josielluz/playlists/-/raw/main/playlists.m3u"),
    ("pornstars.m3u", "https://gitlab.com/josieljefferson12/playlists/-/raw/main/pornstars.m3u"),
    ("epgbrasil.xml.gz", "http://m3u4u.com/epg/3wk1y24kx7uzdevxygz7"),
    ("epgbrasilportugal.xml.gz", "http://m3u4u.com/epg/782dyqdrqkh1xegen4zp"),
    ("epgportugal.xml.gz", "http://m3u4u.com/epg/jq2zy9epr3bwxmgwyxr5"),
];

/// Download settings for the `fetch` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Attempts per source, including the first.
    pub retries: u32,
    /// Pause between failed attempts.
    pub retry_delay_secs: u64,
    /// Upper bound on parallel downloads.
    pub max_workers: usize,
    /// Defaults to [`STOCK_SOURCES`]. A configured list replaces it.
    pub sources: Vec<FetchSource>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retries: 3,
            retry_delay_secs: 2,
            max_workers: 5,
            sources: STOCK_SOURCES
                .iter()
                .map(|(name, url)| FetchSource {
                    name: name.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        }
    }
}

impl FetchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.retries == 0 {
            return Err(ConfigError::Validation(
                "fetch.retries must be at least 1".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_workers must be at least 1".into(),
            ));
        }
        for source in &self.sources {
            if source.name.is_empty() || source.name.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "fetch source name {:?} must be a plain file name",
                    source.name
                )));
            }
            if !crate::fetch::is_valid_url(&source.url) {
                return Err(ConfigError::Validation(format!(
                    "fetch source {} has invalid URL: {}",
                    source.name, source.url
                )));
            }
        }
        Ok(())
    }
}

/// Worker count for a fetch run: never more than configured, never more
/// than there are sources, never zero.
pub fn effective_workers(config: &FetchConfig) -> usize {
    config.max_workers.min(config.sources.len()).max(1)
}

/// One remote file saved under `name` in the root directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSource {
    pub name: String,
    pub url: String,
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background.
    pub background: String,
    /// Background of list rows, stats cards, and controls.
    pub surface: String,
    /// Primary text color.
    pub text: String,
    /// Secondary text (sizes, dates, pagination info).
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#f5f7fa".to_string(),
            surface: "#ffffff".to_string(),
            text: "#1f2933".to_string(),
            text_muted: "#616e7c".to_string(),
            border: "#d9e2ec".to_string(),
            link: "#1d4ed8".to_string(),
            link_hover: "#1e3a8a".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0f172a".to_string(),
            surface: "#1e293b".to_string(),
            text: "#e2e8f0".to_string(),
            text_muted: "#94a3b8".to_string(),
            border: "#334155".to_string(),
            link: "#93c5fd".to_string(),
            link_hover: "#bfdbfe".to_string(),
        }
    }

    fn css_variables(&self, indent: &str) -> String {
        [
            ("--color-bg", &self.background),
            ("--color-surface", &self.surface),
            ("--color-text", &self.text),
            ("--color-text-muted", &self.text_muted),
            ("--color-border", &self.border),
            ("--color-link", &self.link),
            ("--color-link-hover", &self.link_hover),
        ]
        .iter()
        .map(|(name, value)| format!("{indent}{name}: {value};"))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. The branch override from [`BRANCH_ENV`] is
/// not applied here; callers do that with
/// [`HostingConfig::apply_ref_override`].
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# file-index configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the directory
# being indexed. Unknown keys will cause an error.

# Manifest written by `file-index generate`.
output_file = "files.json"

# Exact file names (case-sensitive, no globs) left out of the manifest.
# The manifest itself is always excluded.
exclude = [
    "files.json",
    "index.html",
    "style.css",
    "script.js",
    "config.toml",
    "README.md",
    "LICENSE",
    ".gitignore",
    "playlists.log",
]

# true: each entry gets a human-readable "tamanho" ("1.5 KB").
# false: each entry gets "sizeInBytes" instead.
# The numeric "size" field is written either way.
readable_size = true

# UTC offset (hours) for the display-only "ultimaModificacao" field.
utc_offset_hours = -3

# ---------------------------------------------------------------------------
# Raw-content hosting
# ---------------------------------------------------------------------------
# download_url = https://raw.<host>/<account>/<repository>/<branch>/<name>
# GITHUB_REF_NAME, when set, replaces the branch.
[hosting]
host = "githubusercontent.com"
account = "josieljefferson12"
repository = "playlists"
branch = "main"

# ---------------------------------------------------------------------------
# List renderer
# ---------------------------------------------------------------------------
[viewer]
title = "Arquivos"
page_sizes = [10, 25, 50, 100]
default_page_size = 25
# name | nameDesc | date | dateDesc | size | sizeDesc | type | typeDesc
default_sort = "name"

# ---------------------------------------------------------------------------
# Colors - Light mode
# ---------------------------------------------------------------------------
[colors.light]
background = "#f5f7fa"
surface = "#ffffff"
text = "#1f2933"
text_muted = "#616e7c"
border = "#d9e2ec"
link = "#1d4ed8"
link_hover = "#1e3a8a"

# ---------------------------------------------------------------------------
# Colors - Dark mode
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0f172a"
surface = "#1e293b"
text = "#e2e8f0"
text_muted = "#94a3b8"
border = "#334155"
link = "#93c5fd"
link_hover = "#bfdbfe"

# ---------------------------------------------------------------------------
# Remote sources (`file-index fetch`)
# ---------------------------------------------------------------------------
[fetch]
timeout_secs = 15
# Attempts per source, including the first one.
retries = 3
retry_delay_secs = 2
max_workers = 5

# Files saved into the root directory. Listing any [[fetch.sources]] replaces
# this whole list; `sources = []` under [fetch] turns fetching off.
[[fetch.sources]]
name = "epgbrasil.m3u"
url = "http://m3u4u.com/m3u/3wk1y24kx7uzdevxygz7"

[[fetch.sources]]
name = "epgbrasilportugal.m3u"
url = "http://m3u4u.com/m3u/782dyqdrqkh1xegen4zp"

[[fetch.sources]]
name = "epgportugal.m3u"
url = "http://m3u4u.com/m3u/jq2zy9epr3bwxmgwyxr5"

[[fetch.sources]]
name = "PiauiTV.m3u"
url = "https://gitlab.com/josieljefferson12/playlists/-/raw/main/PiauiTV.m3u"

[[fetch.sources]]
name = "m3u@proton.me.m3u"
url = "https://gitlab.com/josieljefferson12/playlists/-/raw/main/m3u4u_proton.me.m3u"

[[fetch.sources]]
name = "playlist.m3u"
url = "https://gitlab.com/josieljefferson12/playlists/-/raw/main/playlist.m3u"

[[fetch.sources]]
name = "playlists.m3u"
url = "https://gitlab.com/josielluz/playlists/-/raw/main/playlists.m3u"

[[fetch.sources]]
name = "pornstars.m3u"
url = "https://gitlab.com/josieljefferson12/playlists/-/raw/main/pornstars.m3u"

[[fetch.sources]]
name = "epgbrasil.xml.gz"
url = "http://m3u4u.com/epg/3wk1y24kx7uzdevxygz7"

[[fetch.sources]]
name = "epgbrasilportugal.xml.gz"
url = "http://m3u4u.com/epg/782dyqdrqkh1xegen4zp"

[[fetch.sources]]
name = "epgportugal.xml.gz"
url = "http://m3u4u.com/epg/jq2zy9epr3bwxmgwyxr5"
"##
}

/// Generate CSS custom properties from color config.
///
/// Light values live on `:root`; the dark palette applies when the theme
/// script puts the `dark-mode` class on the root element.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        ":root {{\n{}\n}}\n\n:root.dark-mode {{\n{}\n}}",
        colors.light.css_variables("    "),
        colors.dark.css_variables("    "),
    )
}
